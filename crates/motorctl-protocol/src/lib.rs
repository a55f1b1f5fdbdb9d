//! # motorctl-protocol
//!
//! HTTP control-plane contract for the motor controller.
//!
//! This crate defines what the control server does, independent of which
//! HTTP stack serves it: request decoding, the reply shape, the control
//! panel document, and [`ControlPlane`], which applies decoded commands to
//! a [`motorctl_core::MotorDriver`].

pub mod command;
pub mod dispatch;
pub mod page;
pub mod query;

pub use command::{Command, Reply};
pub use dispatch::ControlPlane;
pub use page::CONTROL_PANEL_HTML;
pub use query::{parse_leading_int, query_param};
