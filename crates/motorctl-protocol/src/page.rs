//! Control panel document.
//!
//! A single static page: a duty slider and forward/backward/stop buttons,
//! each issuing a fire-and-forget GET against the motor endpoints.

/// The control panel, served at `/`.
pub const CONTROL_PANEL_HTML: &str = include_str!("../assets/control_panel.html");
