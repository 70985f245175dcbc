//! Configuration table for the M5StickC CO2 monitor.
//!
//! Defaults are compiled in from `cfg.toml` by the build script. At startup the
//! firmware may overlay a JSON settings document (e.g. read from flash), then
//! validates the result once with [`DeviceConfig::load`] and hands out a
//! `&'static` reference via [`install`]. A load error is fatal: report it and
//! halt before bringing up Wi-Fi or MQTT.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod constants;
pub mod defaults;
pub mod settings;
pub mod validate;

pub use config::{install, DeviceConfig, Error};
pub use defaults::{Defaults, DEFAULTS};
pub use settings::Settings;
pub use validate::Reason;
