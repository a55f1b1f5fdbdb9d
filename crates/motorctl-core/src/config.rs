//! Static configuration for the motor controller.
//!
//! These types describe the board wiring and PWM carrier. They are plain
//! serde structs so each platform can source them differently:
//! - Linux: optional JSON file (see `motorctl-server-linux`)
//! - ESP32: compile-time defaults
//!
//! Nothing here is persisted at runtime.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default PWM carrier frequency.
pub const DEFAULT_PWM_FREQUENCY_HZ: u32 = 5_000;

/// Default duty resolution. Gives `MAX_DUTY` = 1023.
pub const DEFAULT_DUTY_RESOLUTION_BITS: u8 = 10;

/// Highest resolution the LEDC peripheral of the target chips supports.
pub const MAX_DUTY_RESOLUTION_BITS: u8 = 14;

/// Maximum duty for the default 10-bit resolution.
pub const MAX_DUTY: u32 = (1 << DEFAULT_DUTY_RESOLUTION_BITS) - 1;

/// Length of the activity LED pulse.
pub const DEFAULT_PULSE_MS: u64 = 200;

/// Errors raised when a configuration is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Duty resolution outside `1..=MAX_DUTY_RESOLUTION_BITS`.
    #[error("duty resolution must be 1..={max} bits, got {0}", max = MAX_DUTY_RESOLUTION_BITS)]
    InvalidResolution(u8),

    /// PWM frequency of zero.
    #[error("PWM frequency must be non-zero")]
    ZeroFrequency,

    /// Two functions were wired to the same GPIO.
    #[error("GPIO {0} is assigned more than once")]
    PinConflict(u8),

    /// Configuration could not be parsed.
    #[error("invalid configuration data: {0}")]
    InvalidData(String),
}

/// GPIO assignment of the H-bridge and status LED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PinConfig {
    /// Enable pin for the right half-bridge (asserted for forward).
    pub right_enable: u8,
    /// Enable pin for the left half-bridge (asserted for backward).
    pub left_enable: u8,
    /// PWM output for the right half-bridge.
    pub right_pwm: u8,
    /// PWM output for the left half-bridge.
    pub left_pwm: u8,
    /// Activity LED.
    pub status_led: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            right_enable: 0,
            left_enable: 1,
            right_pwm: 2,
            left_pwm: 3,
            status_led: 8,
        }
    }
}

impl PinConfig {
    fn all(&self) -> [u8; 5] {
        [
            self.right_enable,
            self.left_enable,
            self.right_pwm,
            self.left_pwm,
            self.status_led,
        ]
    }
}

/// Motor and indicator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MotorConfig {
    /// PWM carrier frequency shared by both channels.
    pub pwm_frequency_hz: u32,

    /// Duty resolution in bits.
    pub duty_resolution_bits: u8,

    /// Pin assignment.
    pub pins: PinConfig,

    /// Activity LED pulse length in milliseconds.
    pub pulse_ms: u64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: DEFAULT_PWM_FREQUENCY_HZ,
            duty_resolution_bits: DEFAULT_DUTY_RESOLUTION_BITS,
            pins: PinConfig::default(),
            pulse_ms: DEFAULT_PULSE_MS,
        }
    }
}

impl MotorConfig {
    /// Largest duty value representable at the configured resolution.
    pub fn max_duty(&self) -> u32 {
        (1u32 << self.duty_resolution_bits.min(MAX_DUTY_RESOLUTION_BITS)) - 1
    }

    /// Activity LED pulse length.
    pub fn pulse(&self) -> Duration {
        Duration::from_millis(self.pulse_ms)
    }

    /// Check the configuration before any peripheral is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duty_resolution_bits == 0 || self.duty_resolution_bits > MAX_DUTY_RESOLUTION_BITS {
            return Err(ConfigError::InvalidResolution(self.duty_resolution_bits));
        }
        if self.pwm_frequency_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }

        let pins = self.pins.all();
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(ConfigError::PinConflict(*pin));
            }
        }
        Ok(())
    }

    /// Parse a JSON document, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidData(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
