//! Command dispatch onto the motor driver.
//!
//! [`ControlPlane`] is shared by every HTTP backend. The motor sits behind a
//! mutex held for the full duty or enable write, so an observer never sees
//! one PWM channel updated without the other. Concurrent clients are not
//! queued: the last command applied wins.

use std::sync::{Mutex, MutexGuard};

use log::info;
use motorctl_core::{ActivityIndicator, MotorDriver, MotorError, MotorHardware, MotorState};

use crate::command::{Command, Reply};
use crate::page::CONTROL_PANEL_HTML;

/// Stateless request dispatcher owning the motor and activity indicator.
#[derive(Debug)]
pub struct ControlPlane<H, I> {
    motor: Mutex<MotorDriver<H>>,
    indicator: I,
}

impl<H: MotorHardware, I: ActivityIndicator> ControlPlane<H, I> {
    pub fn new(motor: MotorDriver<H>, indicator: I) -> Self {
        Self {
            motor: Mutex::new(motor),
            indicator,
        }
    }

    /// Apply a command and produce the reply.
    ///
    /// Motor commands pulse the indicator first, whether or not they carry
    /// a parameter, and always reply `200 OK`. An error means the hardware
    /// rejected a write and the caller must treat it as fatal.
    pub fn execute(&self, command: &Command) -> Result<Reply, MotorError> {
        match command {
            Command::ShowPanel => Ok(Reply::html(CONTROL_PANEL_HTML)),
            Command::SetSpeed(value) => {
                info!("speed request: {value:?}");
                self.indicator.indicate();
                if let Some(value) = value {
                    self.motor().set_speed(*value)?;
                }
                Ok(Reply::ok())
            }
            Command::SetDirection(word) => {
                info!("direction request: {word:?}");
                self.indicator.indicate();
                if let Some(word) = word {
                    self.motor().set_direction(word)?;
                }
                Ok(Reply::ok())
            }
        }
    }

    /// Decode and execute a request target. `None` for unknown paths.
    pub fn handle_uri(&self, uri: &str) -> Option<Result<Reply, MotorError>> {
        Command::decode_uri(uri).map(|command| self.execute(&command))
    }

    /// Last state applied to the hardware.
    pub fn state(&self) -> MotorState {
        self.motor().state()
    }

    fn motor(&self) -> MutexGuard<'_, MotorDriver<H>> {
        // Driver state is only written after a successful hardware write,
        // so it stays consistent even if a holder panicked.
        self.motor.lock().unwrap_or_else(|e| e.into_inner())
    }
}
