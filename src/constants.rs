/// Maximum SSID length in bytes (802.11)
pub const SSID_MAX_LEN: usize = 32;
/// Maximum WiFi passphrase length in bytes
pub const PASSWORD_MAX_LEN: usize = 64;
/// Maximum MQTT broker hostname length in bytes
pub const MQTT_SERVER_MAX_LEN: usize = 64;
/// Maximum MQTT client identifier length in bytes
pub const MQTT_CLIENT_ID_MAX_LEN: usize = 64;
/// Maximum MQTT topic length in bytes
pub const MQTT_TOPIC_MAX_LEN: usize = 128;

/// Shipped SSID placeholder, must be replaced before deployment
pub const PLACEHOLDER_SSID: &str = "YOUR_WIFI_SSID";
/// Shipped passphrase placeholder, must be replaced before deployment
pub const PLACEHOLDER_PASSWORD: &str = "YOUR_WIFI_PASSWORD";
