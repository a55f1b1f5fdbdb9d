//! # motorctl-core
//!
//! Motor actuation model for the Wi-Fi motor controller.
//!
//! This crate provides:
//! - Configuration types (pins, PWM carrier, pulse length)
//! - Direction/speed model and the [`MotorDriver`]
//! - Hardware traits plus simulated backends
//! - The activity indicator
//! - The network link state machine
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! making it usable on both Linux (tokio) and ESP32 (esp-idf) targets.

pub mod config;
pub mod error;
pub mod hardware;
pub mod indicator;
pub mod link;
pub mod model;
pub mod motor;

pub use config::{ConfigError, MotorConfig, PinConfig, MAX_DUTY};
pub use error::MotorError;
pub use hardware::{MotorHardware, SimulatedHardware, SimulatedOutput, StatusOutput};
pub use indicator::{ActivityIndicator, BlockingPulse, NoIndicator};
pub use link::{ControlSurface, LinkAction, LinkEvent, LinkState, LinkSupervisor};
pub use model::*;
pub use motor::MotorDriver;
