use alloc::string::{String, ToString};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Error;
use crate::defaults::Defaults;
use crate::validate::Reason;

/// A partial settings document.
///
/// Any field may be absent; [`crate::DeviceConfig::load`] decides whether that is
/// acceptable. An explicit `null` in a JSON document is not absence: it is
/// rejected as a missing value. Numbers are kept wide so that negative or
/// oversized values are reported as invalid configuration rather than decode errors.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub mqtt_server: Option<String>,
    pub mqtt_port: Option<i64>,
    pub mqtt_client_id: Option<String>,
    pub mqtt_topic: Option<String>,
    pub auto_restart_interval_ms: Option<i64>,
    pub enable_auto_restart: Option<bool>,
    pub watchdog_timeout_ms: Option<i64>,
    pub enable_watchdog: Option<bool>,
    pub max_wifi_retry: Option<i64>,
    pub max_mqtt_retry: Option<i64>,
    pub wifi_retry_interval_ms: Option<i64>,
    pub mqtt_retry_interval_ms: Option<i64>,
    pub sensor_timeout_ms: Option<i64>,
    pub max_sensor_error_count: Option<i64>,
    pub min_free_heap_bytes: Option<i64>,
}

/// Keys accepted in a settings document
pub const FIELDS: [&str; 17] = [
    "ssid",
    "password",
    "mqtt_server",
    "mqtt_port",
    "mqtt_client_id",
    "mqtt_topic",
    "auto_restart_interval_ms",
    "enable_auto_restart",
    "watchdog_timeout_ms",
    "enable_watchdog",
    "max_wifi_retry",
    "max_mqtt_retry",
    "wifi_retry_interval_ms",
    "mqtt_retry_interval_ms",
    "sensor_timeout_ms",
    "max_sensor_error_count",
    "min_free_heap_bytes",
];

const MALFORMED: Error = Error::InvalidConfig {
    field: "document",
    reason: Reason::Malformed,
};

// The error text may quote the offending value, which can be a secret
fn malformed(e: serde_json::Error) -> Error {
    log::error!(
        "Failed to decode settings document: {:?} at line {} column {}",
        e.classify(),
        e.line(),
        e.column()
    );
    MALFORMED
}

impl Settings {
    /// Decodes a JSON settings document keyed by field name.
    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        let document: Value = serde_json::from_slice(bytes).map_err(malformed)?;

        let null_key = document
            .as_object()
            .and_then(|object| object.iter().find(|(_, value)| value.is_null()))
            .map(|(key, _)| key.as_str());
        if let Some(key) = null_key {
            return match FIELDS.iter().copied().find(|field| *field == key) {
                Some(field) => {
                    log::error!("Settings document sets `{}` to null", field);
                    Err(Error::InvalidConfig {
                        field,
                        reason: Reason::Missing,
                    })
                }
                None => {
                    log::error!("Settings document has unknown key {:?}", key);
                    Err(MALFORMED)
                }
            };
        }

        serde_json::from_value(document).map_err(malformed)
    }

    pub fn from_defaults(defaults: &Defaults) -> Self {
        Self {
            ssid: Some(defaults.ssid.to_string()),
            password: Some(defaults.password.to_string()),
            mqtt_server: Some(defaults.mqtt_server.to_string()),
            mqtt_port: Some(defaults.mqtt_port.into()),
            mqtt_client_id: Some(defaults.mqtt_client_id.to_string()),
            mqtt_topic: Some(defaults.mqtt_topic.to_string()),
            auto_restart_interval_ms: Some(defaults.auto_restart_interval_ms.into()),
            enable_auto_restart: Some(defaults.enable_auto_restart),
            watchdog_timeout_ms: Some(defaults.watchdog_timeout_ms.into()),
            enable_watchdog: Some(defaults.enable_watchdog),
            max_wifi_retry: Some(defaults.max_wifi_retry.into()),
            max_mqtt_retry: Some(defaults.max_mqtt_retry.into()),
            wifi_retry_interval_ms: Some(defaults.wifi_retry_interval_ms.into()),
            mqtt_retry_interval_ms: Some(defaults.mqtt_retry_interval_ms.into()),
            sensor_timeout_ms: Some(defaults.sensor_timeout_ms.into()),
            max_sensor_error_count: Some(defaults.max_sensor_error_count.into()),
            min_free_heap_bytes: Some(defaults.min_free_heap_bytes.into()),
        }
    }

    /// Layers `top` over `self`; fields present in `top` win.
    pub fn overlay(self, top: Settings) -> Self {
        Self {
            ssid: top.ssid.or(self.ssid),
            password: top.password.or(self.password),
            mqtt_server: top.mqtt_server.or(self.mqtt_server),
            mqtt_port: top.mqtt_port.or(self.mqtt_port),
            mqtt_client_id: top.mqtt_client_id.or(self.mqtt_client_id),
            mqtt_topic: top.mqtt_topic.or(self.mqtt_topic),
            auto_restart_interval_ms: top
                .auto_restart_interval_ms
                .or(self.auto_restart_interval_ms),
            enable_auto_restart: top.enable_auto_restart.or(self.enable_auto_restart),
            watchdog_timeout_ms: top.watchdog_timeout_ms.or(self.watchdog_timeout_ms),
            enable_watchdog: top.enable_watchdog.or(self.enable_watchdog),
            max_wifi_retry: top.max_wifi_retry.or(self.max_wifi_retry),
            max_mqtt_retry: top.max_mqtt_retry.or(self.max_mqtt_retry),
            wifi_retry_interval_ms: top.wifi_retry_interval_ms.or(self.wifi_retry_interval_ms),
            mqtt_retry_interval_ms: top.mqtt_retry_interval_ms.or(self.mqtt_retry_interval_ms),
            sensor_timeout_ms: top.sensor_timeout_ms.or(self.sensor_timeout_ms),
            max_sensor_error_count: top.max_sensor_error_count.or(self.max_sensor_error_count),
            min_free_heap_bytes: top.min_free_heap_bytes.or(self.min_free_heap_bytes),
        }
    }
}
