//! Motor control firmware for ESP32
//!
//! This binary requires the ESP32 Rust toolchain.
//! It will not compile with the standard Rust toolchain.
//!
//! Pin assignment (ESP32-C3 SuperMini):
//! - GPIO0 / GPIO1: right / left H-bridge enable
//! - GPIO2 / GPIO3: right / left PWM (LEDC channel 0 / 1, timer 0)
//! - GPIO8: status LED

use std::sync::Arc;

use anyhow::Context;
use esp_idf_hal::gpio::{OutputPin, PinDriver};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::info;

use motorctl_core::{BlockingPulse, LinkSupervisor, MotorConfig, MotorDriver};
use motorctl_esp32::{
    timer_resolution, EspControlServer, LedStatus, LedcMotorHardware, NetworkConfig, Station,
    WifiConfig,
};
use motorctl_protocol::ControlPlane;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    info!("Motor controller starting...");

    let config = MotorConfig::default();
    config.validate()?;
    let network = NetworkConfig::default();

    let peripherals = Peripherals::take().context("failed to take Peripherals")?;
    let pins = peripherals.pins;

    // The timer drives both channels for the rest of the program.
    let timer_config = TimerConfig::new()
        .frequency(config.pwm_frequency_hz.Hz().into())
        .resolution(timer_resolution(config.duty_resolution_bits)?);
    let timer: &'static LedcTimerDriver<'static, _> = Box::leak(Box::new(
        LedcTimerDriver::new(peripherals.ledc.timer0, &timer_config)
            .context("creating timer driver")?,
    ));

    let right_pwm = LedcDriver::new(peripherals.ledc.channel0, timer, pins.gpio2)
        .context("creating right PWM channel")?;
    let left_pwm = LedcDriver::new(peripherals.ledc.channel1, timer, pins.gpio3)
        .context("creating left PWM channel")?;
    let right_enable = PinDriver::output(pins.gpio0.downgrade_output())?;
    let left_enable = PinDriver::output(pins.gpio1.downgrade_output())?;

    let hardware = LedcMotorHardware::new(right_pwm, left_pwm, right_enable, left_enable);
    let motor = MotorDriver::new(hardware, &config).context("initializing motor outputs")?;
    info!("[OK] Motor initialized (duty 0, stopped)");

    let led = LedStatus::new(PinDriver::output(pins.gpio8.downgrade_output())?);
    let indicator = BlockingPulse::new(led, config.pulse());
    info!("[OK] Status LED initialized");

    let plane = Arc::new(ControlPlane::new(motor, indicator));
    let server = EspControlServer::new(plane, network.http_port);

    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let station = Station::new(
        peripherals.modem,
        sysloop,
        Some(nvs),
        &WifiConfig::from_env(),
    )?;

    // Runs until reset; the control server follows the link.
    station.run(LinkSupervisor::new(server), &network)
}
