//! Motor driver.
//!
//! Owns the hardware backend and a shadow copy of the last applied state.
//! Speed and direction are independent axes: a stopped motor holds any
//! latched duty inert, so callers may set them in either order.

use log::{debug, info};

use crate::config::MotorConfig;
use crate::error::MotorError;
use crate::hardware::MotorHardware;
use crate::model::{Direction, MotorState};

/// Speed/direction controller for one DC motor on an H-bridge.
#[derive(Debug)]
pub struct MotorDriver<H> {
    hardware: H,
    max_duty: u32,
    state: MotorState,
}

impl<H: MotorHardware> MotorDriver<H> {
    /// Take ownership of configured hardware and put it in the reset state
    /// (duty 0, both enables low).
    ///
    /// Fails if the hardware rejects the initial writes; the caller must
    /// abort boot in that case.
    pub fn new(hardware: H, config: &MotorConfig) -> Result<Self, MotorError> {
        let mut driver = Self {
            hardware,
            max_duty: config.max_duty(),
            state: MotorState::default(),
        };
        driver
            .hardware
            .write_duty(0)
            .map_err(|e| MotorError::Init(e.to_string()))?;
        driver
            .write_direction(Direction::Stopped)
            .map_err(|e| MotorError::Init(e.to_string()))?;

        info!(
            "motor ready: {} Hz carrier, max duty {}",
            config.pwm_frequency_hz, driver.max_duty
        );
        Ok(driver)
    }

    /// Clamp `value` to `0..=max_duty` and apply it to both channels.
    ///
    /// Returns the duty actually applied.
    pub fn set_speed(&mut self, value: i64) -> Result<u32, MotorError> {
        let duty = value.clamp(0, i64::from(self.max_duty)) as u32;
        self.hardware.write_duty(duty)?;
        self.state.duty = duty;
        debug!("speed {value} -> duty {duty}");
        Ok(duty)
    }

    /// Apply a direction command word (see [`Direction::from_command`]).
    pub fn set_direction(&mut self, mode: &str) -> Result<Direction, MotorError> {
        let direction = Direction::from_command(mode);
        self.apply_direction(direction)?;
        Ok(direction)
    }

    /// Drive the enable pins for `direction`.
    pub fn apply_direction(&mut self, direction: Direction) -> Result<(), MotorError> {
        self.write_direction(direction)?;
        debug!("direction -> {direction}");
        Ok(())
    }

    fn write_direction(&mut self, direction: Direction) -> Result<(), MotorError> {
        for (pin, high) in direction.enable_levels().write_order() {
            self.hardware.write_enable(pin, high)?;
        }
        self.state.direction = direction;
        Ok(())
    }

    pub fn duty(&self) -> u32 {
        self.state.duty
    }

    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn max_duty(&self) -> u32 {
        self.max_duty
    }
}
