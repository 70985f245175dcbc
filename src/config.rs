use core::{fmt, str::FromStr, time::Duration};

use heapless::String;
use static_cell::StaticCell;

use crate::constants::*;
use crate::defaults::DEFAULTS;
use crate::settings::Settings;
use crate::validate::{self, Reason};

static CONFIG: StaticCell<DeviceConfig> = StaticCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A field is absent or violates its constraint.
    InvalidConfig {
        field: &'static str,
        reason: Reason,
    },
    /// [`install`] was called more than once.
    AlreadyInstalled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig { field, reason } => {
                write!(f, "invalid configuration: `{}`: {}", field, reason)
            }
            Error::AlreadyInstalled => f.write_str("configuration already installed"),
        }
    }
}

fn invalid(field: &'static str) -> impl Fn(Reason) -> Error {
    move |reason| Error::InvalidConfig { field, reason }
}

fn required<'a, T>(value: &'a Option<T>, field: &'static str) -> Result<&'a T, Error> {
    value.as_ref().ok_or(Error::InvalidConfig {
        field,
        reason: Reason::Missing,
    })
}

fn text<const N: usize>(
    value: &Option<alloc::string::String>,
    field: &'static str,
) -> Result<String<N>, Error> {
    let value = validate::text(required(value, field)?, N).map_err(invalid(field))?;
    String::<N>::from_str(value).map_err(|_| invalid(field)(Reason::TooLong))
}

fn unsigned(value: &Option<i64>, field: &'static str) -> Result<u32, Error> {
    validate::unsigned(*required(value, field)?).map_err(invalid(field))
}

/// Device configuration, validated once at startup and read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    ssid: String<SSID_MAX_LEN>,
    password: String<PASSWORD_MAX_LEN>,
    mqtt_server: String<MQTT_SERVER_MAX_LEN>,
    mqtt_port: u16,
    mqtt_client_id: String<MQTT_CLIENT_ID_MAX_LEN>,
    mqtt_topic: String<MQTT_TOPIC_MAX_LEN>,
    auto_restart_interval_ms: u32,
    enable_auto_restart: bool,
    watchdog_timeout_ms: u32,
    enable_watchdog: bool,
    max_wifi_retry: u32,
    max_mqtt_retry: u32,
    wifi_retry_interval_ms: u32,
    mqtt_retry_interval_ms: u32,
    sensor_timeout_ms: u32,
    max_sensor_error_count: u32,
    min_free_heap_bytes: u32,
}

impl DeviceConfig {
    /// Builds the table from a complete settings document.
    ///
    /// Every field must be present; the first violation found is returned.
    pub fn load(settings: &Settings) -> Result<Self, Error> {
        let config = Self {
            ssid: text(&settings.ssid, "ssid")?,
            password: text(&settings.password, "password")?,
            mqtt_server: text(&settings.mqtt_server, "mqtt_server")?,
            mqtt_port: validate::port(*required(&settings.mqtt_port, "mqtt_port")?)
                .map_err(invalid("mqtt_port"))?,
            mqtt_client_id: text(&settings.mqtt_client_id, "mqtt_client_id")?,
            mqtt_topic: text(&settings.mqtt_topic, "mqtt_topic")?,
            auto_restart_interval_ms: unsigned(
                &settings.auto_restart_interval_ms,
                "auto_restart_interval_ms",
            )?,
            enable_auto_restart: *required(&settings.enable_auto_restart, "enable_auto_restart")?,
            watchdog_timeout_ms: unsigned(&settings.watchdog_timeout_ms, "watchdog_timeout_ms")?,
            enable_watchdog: *required(&settings.enable_watchdog, "enable_watchdog")?,
            max_wifi_retry: unsigned(&settings.max_wifi_retry, "max_wifi_retry")?,
            max_mqtt_retry: unsigned(&settings.max_mqtt_retry, "max_mqtt_retry")?,
            wifi_retry_interval_ms: unsigned(
                &settings.wifi_retry_interval_ms,
                "wifi_retry_interval_ms",
            )?,
            mqtt_retry_interval_ms: unsigned(
                &settings.mqtt_retry_interval_ms,
                "mqtt_retry_interval_ms",
            )?,
            sensor_timeout_ms: unsigned(&settings.sensor_timeout_ms, "sensor_timeout_ms")?,
            max_sensor_error_count: unsigned(
                &settings.max_sensor_error_count,
                "max_sensor_error_count",
            )?,
            min_free_heap_bytes: unsigned(&settings.min_free_heap_bytes, "min_free_heap_bytes")?,
        };

        config.report();
        Ok(config)
    }

    /// Loads the values compiled in from `cfg.toml`.
    pub fn from_defaults() -> Result<Self, Error> {
        Self::load(&Settings::from_defaults(&DEFAULTS))
    }

    /// Loads the compiled defaults overlaid with a JSON settings document.
    pub fn with_overrides(json: &[u8]) -> Result<Self, Error> {
        let overrides = Settings::from_json(json)?;
        log::debug!("Applying settings overrides: {:?}", RedactedSettings(&overrides));
        Self::load(&Settings::from_defaults(&DEFAULTS).overlay(overrides))
    }

    fn report(&self) {
        log::info!(
            "Configuration loaded: SSID {:?}, broker {}:{}, client {:?}, topic {:?}",
            self.ssid.as_str(),
            self.mqtt_server.as_str(),
            self.mqtt_port,
            self.mqtt_client_id.as_str(),
            self.mqtt_topic.as_str()
        );

        if self.ssid.as_str() == PLACEHOLDER_SSID {
            log::warn!("ssid still holds the placeholder value, set it in cfg.toml or settings");
        }
        if self.password.as_str() == PLACEHOLDER_PASSWORD {
            log::warn!(
                "password still holds the placeholder value, set it in cfg.toml or settings"
            );
        }
        if !self.enable_watchdog {
            log::warn!("Watchdog disabled");
        }
        if !self.enable_auto_restart {
            log::warn!("Scheduled restart disabled");
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn mqtt_server(&self) -> &str {
        &self.mqtt_server
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    pub fn mqtt_client_id(&self) -> &str {
        &self.mqtt_client_id
    }

    pub fn mqtt_topic(&self) -> &str {
        &self.mqtt_topic
    }

    pub fn auto_restart_interval_ms(&self) -> u32 {
        self.auto_restart_interval_ms
    }

    pub fn auto_restart_interval(&self) -> Duration {
        Duration::from_millis(self.auto_restart_interval_ms.into())
    }

    pub fn enable_auto_restart(&self) -> bool {
        self.enable_auto_restart
    }

    pub fn watchdog_timeout_ms(&self) -> u32 {
        self.watchdog_timeout_ms
    }

    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_millis(self.watchdog_timeout_ms.into())
    }

    pub fn enable_watchdog(&self) -> bool {
        self.enable_watchdog
    }

    pub fn max_wifi_retry(&self) -> u32 {
        self.max_wifi_retry
    }

    pub fn max_mqtt_retry(&self) -> u32 {
        self.max_mqtt_retry
    }

    pub fn wifi_retry_interval_ms(&self) -> u32 {
        self.wifi_retry_interval_ms
    }

    pub fn wifi_retry_interval(&self) -> Duration {
        Duration::from_millis(self.wifi_retry_interval_ms.into())
    }

    pub fn mqtt_retry_interval_ms(&self) -> u32 {
        self.mqtt_retry_interval_ms
    }

    pub fn mqtt_retry_interval(&self) -> Duration {
        Duration::from_millis(self.mqtt_retry_interval_ms.into())
    }

    pub fn sensor_timeout_ms(&self) -> u32 {
        self.sensor_timeout_ms
    }

    pub fn sensor_timeout(&self) -> Duration {
        Duration::from_millis(self.sensor_timeout_ms.into())
    }

    pub fn max_sensor_error_count(&self) -> u32 {
        self.max_sensor_error_count
    }

    pub fn min_free_heap_bytes(&self) -> u32 {
        self.min_free_heap_bytes
    }
}

// Never print the Wi-Fi passphrase
impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("ssid", &self.ssid)
            .field("password", &"***")
            .field("mqtt_server", &self.mqtt_server)
            .field("mqtt_port", &self.mqtt_port)
            .field("mqtt_client_id", &self.mqtt_client_id)
            .field("mqtt_topic", &self.mqtt_topic)
            .field("auto_restart_interval_ms", &self.auto_restart_interval_ms)
            .field("enable_auto_restart", &self.enable_auto_restart)
            .field("watchdog_timeout_ms", &self.watchdog_timeout_ms)
            .field("enable_watchdog", &self.enable_watchdog)
            .field("max_wifi_retry", &self.max_wifi_retry)
            .field("max_mqtt_retry", &self.max_mqtt_retry)
            .field("wifi_retry_interval_ms", &self.wifi_retry_interval_ms)
            .field("mqtt_retry_interval_ms", &self.mqtt_retry_interval_ms)
            .field("sensor_timeout_ms", &self.sensor_timeout_ms)
            .field("max_sensor_error_count", &self.max_sensor_error_count)
            .field("min_free_heap_bytes", &self.min_free_heap_bytes)
            .finish()
    }
}

struct RedactedSettings<'a>(&'a Settings);

impl fmt::Debug for RedactedSettings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut settings = self.0.clone();
        if settings.password.is_some() {
            settings.password = Some("***".into());
        }
        fmt::Debug::fmt(&settings, f)
    }
}

/// Stores the configuration for the rest of the program's lifetime.
///
/// Must be called once, before any task that reads the configuration is spawned.
pub fn install(config: DeviceConfig) -> Result<&'static DeviceConfig, Error> {
    CONFIG
        .try_init(config)
        .map(|config| &*config)
        .ok_or(Error::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    fn home() -> Settings {
        Settings::from_json(
            br#"{
                "ssid": "Home",
                "password": "secret",
                "mqtt_server": "192.168.1.100",
                "mqtt_port": 1883,
                "mqtt_client_id": "M5StickC_CO2_Monitor",
                "mqtt_topic": "m5stickc_co2/co2_data",
                "auto_restart_interval_ms": 86400000,
                "enable_auto_restart": true,
                "watchdog_timeout_ms": 30000,
                "enable_watchdog": true,
                "max_wifi_retry": 3,
                "max_mqtt_retry": 5,
                "wifi_retry_interval_ms": 30000,
                "mqtt_retry_interval_ms": 10000,
                "sensor_timeout_ms": 60000,
                "max_sensor_error_count": 10,
                "min_free_heap_bytes": 10000
            }"#,
        )
        .unwrap()
    }

    fn reason(result: Result<DeviceConfig, Error>, field: &str) -> Reason {
        match result {
            Err(Error::InvalidConfig { field: f, reason }) if f == field => reason,
            other => panic!("expected invalid `{}`, got {:?}", field, other),
        }
    }

    #[test]
    fn complete_document_loads() {
        let config = DeviceConfig::load(&home()).unwrap();
        assert_eq!(config.ssid(), "Home");
        assert_eq!(config.password(), "secret");
        assert_eq!(config.mqtt_server(), "192.168.1.100");
        assert_eq!(config.mqtt_port(), 1883);
        assert_eq!(config.watchdog_timeout(), Duration::from_secs(30));
        assert_eq!(config.auto_restart_interval(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.max_sensor_error_count(), 10);
    }

    #[test]
    fn every_field_is_required() {
        let mut settings = home();
        settings.min_free_heap_bytes = None;
        assert_eq!(
            reason(DeviceConfig::load(&settings), "min_free_heap_bytes"),
            Reason::Missing
        );

        let mut settings = home();
        settings.enable_watchdog = None;
        assert_eq!(
            reason(DeviceConfig::load(&settings), "enable_watchdog"),
            Reason::Missing
        );

        assert_eq!(
            reason(DeviceConfig::load(&Settings::default()), "ssid"),
            Reason::Missing
        );
    }

    #[test]
    fn port_out_of_range() {
        for port in [0, -1, 65536, 70000] {
            let mut settings = home();
            settings.mqtt_port = Some(port);
            assert_eq!(
                reason(DeviceConfig::load(&settings), "mqtt_port"),
                Reason::OutOfRange
            );
        }
    }

    #[test]
    fn empty_strings_rejected() {
        let cases: [(&str, fn(&mut Settings)); 5] = [
            ("ssid", |s: &mut Settings| s.ssid = Some(String::new())),
            ("password", |s: &mut Settings| s.password = Some(String::new())),
            ("mqtt_server", |s: &mut Settings| {
                s.mqtt_server = Some(String::new())
            }),
            ("mqtt_client_id", |s: &mut Settings| {
                s.mqtt_client_id = Some(String::new())
            }),
            ("mqtt_topic", |s: &mut Settings| {
                s.mqtt_topic = Some(String::new())
            }),
        ];

        for (field, clear) in cases {
            let mut settings = home();
            clear(&mut settings);
            assert_eq!(reason(DeviceConfig::load(&settings), field), Reason::Empty);
        }
    }

    #[test]
    fn oversized_ssid_rejected() {
        let mut settings = home();
        settings.ssid = Some("x".repeat(SSID_MAX_LEN + 1));
        assert_eq!(reason(DeviceConfig::load(&settings), "ssid"), Reason::TooLong);

        settings.ssid = Some("x".repeat(SSID_MAX_LEN));
        assert!(DeviceConfig::load(&settings).is_ok());
    }

    #[test]
    fn oversized_broker_fields_rejected() {
        let cases: [(&str, usize, fn(&mut Settings, String)); 4] = [
            ("password", PASSWORD_MAX_LEN, |s: &mut Settings, v: String| {
                s.password = Some(v)
            }),
            ("mqtt_server", MQTT_SERVER_MAX_LEN, |s: &mut Settings, v: String| {
                s.mqtt_server = Some(v)
            }),
            ("mqtt_client_id", MQTT_CLIENT_ID_MAX_LEN, |s: &mut Settings, v: String| {
                s.mqtt_client_id = Some(v)
            }),
            ("mqtt_topic", MQTT_TOPIC_MAX_LEN, |s: &mut Settings, v: String| {
                s.mqtt_topic = Some(v)
            }),
        ];

        for (field, max_len, set) in cases {
            let mut settings = home();
            set(&mut settings, "x".repeat(max_len + 1));
            assert_eq!(reason(DeviceConfig::load(&settings), field), Reason::TooLong);

            let mut settings = home();
            set(&mut settings, "x".repeat(max_len));
            assert!(DeviceConfig::load(&settings).is_ok(), "{} at limit", field);
        }
    }

    #[test]
    fn negative_values_rejected() {
        let mut settings = home();
        settings.watchdog_timeout_ms = Some(-1);
        assert_eq!(
            reason(DeviceConfig::load(&settings), "watchdog_timeout_ms"),
            Reason::Negative
        );

        let mut settings = home();
        settings.max_mqtt_retry = Some(-3);
        assert_eq!(
            reason(DeviceConfig::load(&settings), "max_mqtt_retry"),
            Reason::Negative
        );
    }

    #[test]
    fn zero_thresholds_are_valid() {
        let mut settings = home();
        settings.max_wifi_retry = Some(0);
        settings.sensor_timeout_ms = Some(0);
        settings.min_free_heap_bytes = Some(0);
        let config = DeviceConfig::load(&settings).unwrap();
        assert_eq!(config.max_wifi_retry(), 0);
        assert_eq!(config.sensor_timeout(), Duration::ZERO);
    }

    #[test]
    fn millis_beyond_32_bits_rejected() {
        let mut settings = home();
        settings.auto_restart_interval_ms = Some(i64::from(u32::MAX) + 1);
        assert_eq!(
            reason(DeviceConfig::load(&settings), "auto_restart_interval_ms"),
            Reason::OutOfRange
        );
    }

    #[test]
    fn debug_hides_password() {
        let config = DeviceConfig::load(&home()).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("Home"));
    }

    #[test]
    fn error_message_names_field() {
        let err = Error::InvalidConfig {
            field: "mqtt_port",
            reason: Reason::OutOfRange,
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: `mqtt_port`: value is out of range"
        );
    }

    #[test]
    fn install_only_once() {
        let config = install(DeviceConfig::load(&home()).unwrap()).unwrap();
        assert_eq!(config.ssid(), "Home");
        assert_eq!(
            install(DeviceConfig::load(&home()).unwrap()),
            Err(Error::AlreadyInstalled)
        );
    }
}
