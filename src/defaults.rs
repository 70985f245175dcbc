/// Settings baked into the image from `cfg.toml`, already validated by the build script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    // Wi-Fi SSID to connect to
    pub ssid: &'static str,

    // Wi-Fi pre-shared key (password)
    pub password: &'static str,

    // MQTT broker hostname or IP address
    pub mqtt_server: &'static str,

    // MQTT port (usually 1883 or 8883 for TLS)
    pub mqtt_port: u16,

    // MQTT client identifier presented to the broker
    pub mqtt_client_id: &'static str,

    // MQTT topic to publish CO2 readings to
    pub mqtt_topic: &'static str,

    // Period between scheduled restarts
    pub auto_restart_interval_ms: u32,
    pub enable_auto_restart: bool,

    // Watchdog expiry
    pub watchdog_timeout_ms: u32,
    pub enable_watchdog: bool,

    // Reconnect attempt caps and delays
    pub max_wifi_retry: u32,
    pub max_mqtt_retry: u32,
    pub wifi_retry_interval_ms: u32,
    pub mqtt_retry_interval_ms: u32,

    // Max wait for a sensor reading
    pub sensor_timeout_ms: u32,

    // Consecutive sensor failures tolerated before fault handling
    pub max_sensor_error_count: u32,

    // Low-memory alarm threshold
    pub min_free_heap_bytes: u32,
}

// default values are generated at compile time
include!(concat!(env!("OUT_DIR"), "/defaults.rs"));
