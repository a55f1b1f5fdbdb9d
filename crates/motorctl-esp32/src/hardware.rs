//! LEDC and GPIO backends for the motor driver.

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::ledc::LedcDriver;
use esp_idf_svc::sys::EspError;
use log::info;

use motorctl_core::{EnablePin, MotorError, MotorHardware, StatusOutput};

/// H-bridge outputs: one LEDC channel per half-bridge and two enable pins.
///
/// Both channels must be bound to the same timer so they share frequency
/// and resolution.
pub struct LedcMotorHardware {
    right_pwm: LedcDriver<'static>,
    left_pwm: LedcDriver<'static>,
    right_enable: PinDriver<'static, AnyOutputPin, Output>,
    left_enable: PinDriver<'static, AnyOutputPin, Output>,
}

impl LedcMotorHardware {
    pub fn new(
        right_pwm: LedcDriver<'static>,
        left_pwm: LedcDriver<'static>,
        right_enable: PinDriver<'static, AnyOutputPin, Output>,
        left_enable: PinDriver<'static, AnyOutputPin, Output>,
    ) -> Self {
        info!(
            "LEDC motor outputs ready (max duty {})",
            right_pwm.get_max_duty()
        );
        Self {
            right_pwm,
            left_pwm,
            right_enable,
            left_enable,
        }
    }
}

impl MotorHardware for LedcMotorHardware {
    fn write_duty(&mut self, duty: u32) -> Result<(), MotorError> {
        let pwm_err = |e: EspError| MotorError::Pwm(e.to_string());
        self.right_pwm.set_duty(duty).map_err(pwm_err)?;
        self.left_pwm.set_duty(duty).map_err(pwm_err)?;
        Ok(())
    }

    fn write_enable(&mut self, pin: EnablePin, high: bool) -> Result<(), MotorError> {
        let driver = match pin {
            EnablePin::Right => &mut self.right_enable,
            EnablePin::Left => &mut self.left_enable,
        };
        let result = if high {
            driver.set_high()
        } else {
            driver.set_low()
        };
        result.map_err(|e| MotorError::EnablePin(format!("{pin:?}: {e}")))
    }
}

/// Status LED on a plain GPIO output.
pub struct LedStatus {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl LedStatus {
    pub fn new(pin: PinDriver<'static, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }
}

impl StatusOutput for LedStatus {
    fn set_level(&mut self, high: bool) -> Result<(), MotorError> {
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|e| MotorError::StatusOutput(e.to_string()))
    }
}
