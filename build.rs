use std::{env, error::Error, fs, path::Path};

use serde::Deserialize;

#[allow(dead_code)]
#[path = "src/constants.rs"]
mod constants;
#[allow(dead_code)]
#[path = "src/validate.rs"]
mod validate;

use constants::*;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    ssid: String,
    password: String,
    mqtt_server: String,
    mqtt_port: i64,
    mqtt_client_id: String,
    mqtt_topic: String,
    auto_restart_interval_ms: i64,
    enable_auto_restart: bool,
    watchdog_timeout_ms: i64,
    enable_watchdog: bool,
    max_wifi_retry: i64,
    max_mqtt_retry: i64,
    wifi_retry_interval_ms: i64,
    mqtt_retry_interval_ms: i64,
    sensor_timeout_ms: i64,
    max_sensor_error_count: i64,
    min_free_heap_bytes: i64,
}

fn checked<T>(field: &str, result: Result<T, validate::Reason>) -> Result<T, Box<dyn Error>> {
    result.map_err(|reason| format!("invalid `{field}` in config: {reason}").into())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Alternative config file, e.g. per deployment
    println!("cargo:rerun-if-env-changed=CO2_MONITOR_CFG");
    let cfg_path = env::var("CO2_MONITOR_CFG").unwrap_or_else(|_| "cfg.toml".to_string());
    println!("cargo:rerun-if-changed={}", cfg_path);

    // Read and parse
    let toml_str = fs::read_to_string(&cfg_path)
        .map_err(|e| format!("failed to read {cfg_path}: {e}"))?;
    let raw: RawConfig = toml::from_str(&toml_str)?;

    // Validate before anything reaches the firmware image
    let ssid = checked("ssid", validate::text(&raw.ssid, SSID_MAX_LEN))?;
    let password = checked("password", validate::text(&raw.password, PASSWORD_MAX_LEN))?;
    let mqtt_server = checked(
        "mqtt_server",
        validate::text(&raw.mqtt_server, MQTT_SERVER_MAX_LEN),
    )?;
    let mqtt_port = checked("mqtt_port", validate::port(raw.mqtt_port))?;
    let mqtt_client_id = checked(
        "mqtt_client_id",
        validate::text(&raw.mqtt_client_id, MQTT_CLIENT_ID_MAX_LEN),
    )?;
    let mqtt_topic = checked(
        "mqtt_topic",
        validate::text(&raw.mqtt_topic, MQTT_TOPIC_MAX_LEN),
    )?;
    let auto_restart_interval_ms = checked(
        "auto_restart_interval_ms",
        validate::unsigned(raw.auto_restart_interval_ms),
    )?;
    let watchdog_timeout_ms = checked(
        "watchdog_timeout_ms",
        validate::unsigned(raw.watchdog_timeout_ms),
    )?;
    let max_wifi_retry = checked("max_wifi_retry", validate::unsigned(raw.max_wifi_retry))?;
    let max_mqtt_retry = checked("max_mqtt_retry", validate::unsigned(raw.max_mqtt_retry))?;
    let wifi_retry_interval_ms = checked(
        "wifi_retry_interval_ms",
        validate::unsigned(raw.wifi_retry_interval_ms),
    )?;
    let mqtt_retry_interval_ms = checked(
        "mqtt_retry_interval_ms",
        validate::unsigned(raw.mqtt_retry_interval_ms),
    )?;
    let sensor_timeout_ms = checked(
        "sensor_timeout_ms",
        validate::unsigned(raw.sensor_timeout_ms),
    )?;
    let max_sensor_error_count = checked(
        "max_sensor_error_count",
        validate::unsigned(raw.max_sensor_error_count),
    )?;
    let min_free_heap_bytes = checked(
        "min_free_heap_bytes",
        validate::unsigned(raw.min_free_heap_bytes),
    )?;

    // Generate Rust code
    let code = format!(
        r#"
        pub const DEFAULTS: Defaults = Defaults {{
            ssid: {ssid:?},
            password: {password:?},
            mqtt_server: {mqtt_server:?},
            mqtt_port: {mqtt_port},
            mqtt_client_id: {mqtt_client_id:?},
            mqtt_topic: {mqtt_topic:?},
            auto_restart_interval_ms: {auto_restart_interval_ms},
            enable_auto_restart: {enable_auto_restart},
            watchdog_timeout_ms: {watchdog_timeout_ms},
            enable_watchdog: {enable_watchdog},
            max_wifi_retry: {max_wifi_retry},
            max_mqtt_retry: {max_mqtt_retry},
            wifi_retry_interval_ms: {wifi_retry_interval_ms},
            mqtt_retry_interval_ms: {mqtt_retry_interval_ms},
            sensor_timeout_ms: {sensor_timeout_ms},
            max_sensor_error_count: {max_sensor_error_count},
            min_free_heap_bytes: {min_free_heap_bytes},
        }};
    "#,
        enable_auto_restart = raw.enable_auto_restart,
        enable_watchdog = raw.enable_watchdog,
    );

    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("defaults.rs");
    fs::write(dest_path, code)?;
    Ok(())
}
