//! ESP32-specific components for the motor controller.
//!
//! This crate provides the device side of the control plane:
//! - LEDC PWM and GPIO enable outputs behind [`motorctl_core::MotorHardware`]
//! - The status LED behind [`motorctl_core::StatusOutput`]
//! - The `EspHttpServer` control server
//! - Station-mode WiFi feeding the link supervisor
//!
//! # Architecture
//!
//! Everything that decides what the motor does lives in `motorctl-core` and
//! `motorctl-protocol` and is tested on the host. This crate only adapts
//! ESP-IDF drivers to those traits. The binary (`motorctl-server-esp32`)
//! takes the peripherals and wires the pieces together.
//!
//! # Example
//!
//! ```ignore
//! let hardware = LedcMotorHardware::new(right_pwm, left_pwm, right_en, left_en);
//! let motor = MotorDriver::new(hardware, &MotorConfig::default())?;
//! let plane = Arc::new(ControlPlane::new(motor, BlockingPulse::new(led, pulse)));
//!
//! let server = EspControlServer::new(plane, NetworkConfig::default().http_port);
//! Station::new(modem, sysloop, nvs, &WifiConfig::from_env())?
//!     .run(LinkSupervisor::new(server), &NetworkConfig::default());
//! ```

pub mod config;
pub mod hardware;
pub mod http;
pub mod wifi;

pub use config::{timer_resolution, NetworkConfig, WifiConfig};
pub use hardware::{LedStatus, LedcMotorHardware};
pub use http::EspControlServer;
pub use wifi::Station;
