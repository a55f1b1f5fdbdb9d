//! Control-plane request and reply types.
//!
//! The HTTP surface is three GET endpoints:
//! - `/` - control panel document
//! - `/motor/speed?value=N` - set duty on both channels
//! - `/motor/direction?dir=W` - set direction
//!
//! Every accepted request is answered `200`. Missing or malformed
//! parameters are ignored rather than rejected; the control page never
//! looks at response bodies.

use crate::query::{parse_leading_int, query_param};

/// Path of the control panel document.
pub const PANEL_PATH: &str = "/";
/// Path of the speed endpoint.
pub const SPEED_PATH: &str = "/motor/speed";
/// Path of the direction endpoint.
pub const DIRECTION_PATH: &str = "/motor/direction";

/// Query key read by the speed endpoint.
pub const SPEED_KEY: &str = "value";
/// Query key read by the direction endpoint.
pub const DIRECTION_KEY: &str = "dir";

/// Body of every motor command reply.
pub const OK_BODY: &str = "OK";

pub const TEXT_HTML: &str = "text/html";
pub const TEXT_PLAIN: &str = "text/plain";

/// A decoded control request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the control panel.
    ShowPanel,
    /// Set the speed. `None` when the `value` parameter was absent.
    SetSpeed(Option<i64>),
    /// Set the direction. `None` when the `dir` parameter was absent.
    SetDirection(Option<String>),
}

impl Command {
    /// Decode a request path and optional raw query string.
    ///
    /// Returns `None` for paths outside the control surface.
    pub fn decode(path: &str, query: Option<&str>) -> Option<Command> {
        match path {
            PANEL_PATH => Some(Command::ShowPanel),
            SPEED_PATH => Some(Command::speed(query)),
            DIRECTION_PATH => Some(Command::direction(query)),
            _ => None,
        }
    }

    /// Speed command from the query of a `/motor/speed` request.
    pub fn speed(query: Option<&str>) -> Command {
        Command::SetSpeed(
            query
                .and_then(|q| query_param(q, SPEED_KEY))
                .map(parse_leading_int),
        )
    }

    /// Direction command from the query of a `/motor/direction` request.
    pub fn direction(query: Option<&str>) -> Command {
        Command::SetDirection(
            query
                .and_then(|q| query_param(q, DIRECTION_KEY))
                .map(str::to_string),
        )
    }

    /// Decode a request target such as `/motor/speed?value=3`.
    pub fn decode_uri(uri: &str) -> Option<Command> {
        match uri.split_once('?') {
            Some((path, query)) => Self::decode(path, Some(query)),
            None => Self::decode(uri, None),
        }
    }
}

/// Response to a control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: &'static str,
}

impl Reply {
    /// `200 OK` with the fixed `OK` body.
    pub const fn ok() -> Self {
        Self {
            status: 200,
            content_type: TEXT_PLAIN,
            body: OK_BODY,
        }
    }

    /// `200 OK` with an HTML document.
    pub const fn html(body: &'static str) -> Self {
        Self {
            status: 200,
            content_type: TEXT_HTML,
            body,
        }
    }
}
