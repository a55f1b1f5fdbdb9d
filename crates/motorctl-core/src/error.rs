//! Hardware error type.

use thiserror::Error;

/// Errors reported by a motor hardware backend.
///
/// Every variant is fatal for the firmware: the hardware contract cannot be
/// honoured partially, so callers abort instead of retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MotorError {
    /// Timer, channel or GPIO configuration failed at boot.
    #[error("peripheral initialization failed: {0}")]
    Init(String),

    /// A PWM duty write was rejected.
    #[error("PWM duty write failed: {0}")]
    Pwm(String),

    /// An enable pin write was rejected.
    #[error("enable pin write failed: {0}")]
    EnablePin(String),

    /// A status output write was rejected.
    #[error("status output write failed: {0}")]
    StatusOutput(String),
}
