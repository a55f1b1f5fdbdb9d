//! Hardware collaborator traits.
//!
//! The motor driver talks to the board through these traits so the same
//! logic runs against:
//! - ESP32: LEDC channels and GPIO pin drivers (`motorctl-esp32`)
//! - Linux/tests: [`SimulatedHardware`] and [`SimulatedOutput`]
//!
//! All methods are synchronous to support embedded platforms.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::MotorError;
use crate::model::EnablePin;

/// Two PWM channels sharing one timer, plus two enable outputs.
pub trait MotorHardware: Send {
    /// Write `duty` to both PWM channels, right channel first.
    ///
    /// Implementations issue the two writes back to back without anything
    /// in between.
    fn write_duty(&mut self, duty: u32) -> Result<(), MotorError>;

    /// Drive one enable pin high or low.
    fn write_enable(&mut self, pin: EnablePin, high: bool) -> Result<(), MotorError>;
}

/// A single digital output, used for the activity LED.
pub trait StatusOutput: Send {
    fn set_level(&mut self, high: bool) -> Result<(), MotorError>;
}

impl<T: MotorHardware + ?Sized> MotorHardware for Box<T> {
    fn write_duty(&mut self, duty: u32) -> Result<(), MotorError> {
        (**self).write_duty(duty)
    }

    fn write_enable(&mut self, pin: EnablePin, high: bool) -> Result<(), MotorError> {
        (**self).write_enable(pin, high)
    }
}

/// One recorded hardware write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareWrite {
    Duty { right: u32, left: u32 },
    Enable { pin: EnablePin, high: bool },
}

/// Number of writes kept by [`SimulatedHardware::journal`].
pub const JOURNAL_CAPACITY: usize = 1024;

/// Register image of the simulated board.
#[derive(Debug, Default)]
struct SimulatedRegisters {
    right_duty: u32,
    left_duty: u32,
    right_enable: bool,
    left_enable: bool,
    journal: VecDeque<HardwareWrite>,
    shorted: bool,
    fail_writes: bool,
}

impl SimulatedRegisters {
    fn record(&mut self, write: HardwareWrite) {
        if self.journal.len() == JOURNAL_CAPACITY {
            self.journal.pop_front();
        }
        self.journal.push_back(write);
    }
}

/// In-memory motor hardware.
///
/// Clones share the same registers, so a test can keep one handle while the
/// driver owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHardware {
    inner: Arc<Mutex<SimulatedRegisters>>,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self::default()
    }

    fn registers(&self) -> MutexGuard<'_, SimulatedRegisters> {
        // A poisoned lock only means another test thread panicked mid-write;
        // the register image is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current duty of the right and left channels.
    pub fn duties(&self) -> (u32, u32) {
        let regs = self.registers();
        (regs.right_duty, regs.left_duty)
    }

    /// Current level of the right and left enable pins.
    pub fn enables(&self) -> (bool, bool) {
        let regs = self.registers();
        (regs.right_enable, regs.left_enable)
    }

    /// The most recent writes, oldest first, at most [`JOURNAL_CAPACITY`].
    pub fn journal(&self) -> Vec<HardwareWrite> {
        self.registers().journal.iter().copied().collect()
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.registers().fail_writes = fail;
    }

    /// True if both enable pins were ever high at the same time.
    pub fn ever_shorted(&self) -> bool {
        self.registers().shorted
    }
}

impl MotorHardware for SimulatedHardware {
    fn write_duty(&mut self, duty: u32) -> Result<(), MotorError> {
        let mut regs = self.registers();
        if regs.fail_writes {
            return Err(MotorError::Pwm("simulated failure".to_string()));
        }
        regs.right_duty = duty;
        regs.left_duty = duty;
        regs.record(HardwareWrite::Duty {
            right: duty,
            left: duty,
        });
        log::trace!("sim: duty {duty} on both channels");
        Ok(())
    }

    fn write_enable(&mut self, pin: EnablePin, high: bool) -> Result<(), MotorError> {
        let mut regs = self.registers();
        if regs.fail_writes {
            return Err(MotorError::EnablePin("simulated failure".to_string()));
        }
        match pin {
            EnablePin::Right => regs.right_enable = high,
            EnablePin::Left => regs.left_enable = high,
        }
        regs.shorted |= regs.right_enable && regs.left_enable;
        regs.record(HardwareWrite::Enable { pin, high });
        log::trace!("sim: {pin:?} enable -> {high}");
        Ok(())
    }
}

/// In-memory status output counting rising edges.
#[derive(Debug, Clone, Default)]
pub struct SimulatedOutput {
    inner: Arc<Mutex<(bool, usize)>>,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).0
    }

    /// Number of low-to-high transitions seen so far.
    pub fn pulses(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).1
    }
}

impl StatusOutput for SimulatedOutput {
    fn set_level(&mut self, high: bool) -> Result<(), MotorError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if high && !state.0 {
            state.1 += 1;
        }
        state.0 = high;
        Ok(())
    }
}
