//! # motorctl-server
//!
//! Motor control HTTP server for hosted targets (tokio + axum).
//!
//! Serves the same control surface as the device firmware so the control
//! panel and client scripts can be exercised without hardware.

pub mod indicator;
pub mod server;

pub use indicator::BackgroundPulse;
pub use motorctl_core::{ControlSurface, MotorDriver};
pub use motorctl_protocol::ControlPlane;
pub use server::{router, ControlServer, ServerConfig, ServerError, SharedPlane};
