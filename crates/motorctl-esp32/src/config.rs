//! Compile-time configuration for the device.
//!
//! WiFi credentials come from the build environment (`WIFI_SSID`,
//! `WIFI_PASS`); everything else has fixed defaults.

use std::time::Duration;

use anyhow::{bail, Result};
use esp_idf_hal::ledc::Resolution;

/// WiFi station credentials.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WifiConfig {
    /// WiFi network SSID.
    pub ssid: String,

    /// WiFi network password (empty for open networks).
    pub password: String,
}

impl WifiConfig {
    /// Credentials baked in at build time.
    pub fn from_env() -> Self {
        Self {
            ssid: option_env!("WIFI_SSID").unwrap_or("").to_string(),
            password: option_env!("WIFI_PASS").unwrap_or("").to_string(),
        }
    }
}

/// Network and HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// HTTP server port.
    pub http_port: u16,

    /// Delay before retrying a failed association.
    pub reconnect_delay: Duration,

    /// How often the link is checked while connected.
    pub poll_interval: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_port: 80,
            reconnect_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Map a duty resolution in bits to the LEDC timer setting.
pub fn timer_resolution(bits: u8) -> Result<Resolution> {
    let resolution = match bits {
        1 => Resolution::Bits1,
        2 => Resolution::Bits2,
        3 => Resolution::Bits3,
        4 => Resolution::Bits4,
        5 => Resolution::Bits5,
        6 => Resolution::Bits6,
        7 => Resolution::Bits7,
        8 => Resolution::Bits8,
        9 => Resolution::Bits9,
        10 => Resolution::Bits10,
        11 => Resolution::Bits11,
        12 => Resolution::Bits12,
        13 => Resolution::Bits13,
        14 => Resolution::Bits14,
        _ => bail!("unsupported LEDC resolution: {bits} bits"),
    };
    Ok(resolution)
}
