//! Motor state types.
//!
//! Speed is a plain duty value; direction is a tri-state that maps onto the
//! two enable pins of the H-bridge.

use serde::{Deserialize, Serialize};

/// Direction of rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    /// Both enable pins low. Reset state.
    #[default]
    Stopped,
}

impl Direction {
    /// Map a command word onto a direction.
    ///
    /// Only the exact lowercase words `forward` and `backward` select a
    /// rotation. Everything else, including `stop`, an empty string or a
    /// case mismatch, stops the motor.
    pub fn from_command(word: &str) -> Self {
        match word {
            "forward" => Direction::Forward,
            "backward" => Direction::Backward,
            _ => Direction::Stopped,
        }
    }

    /// Enable pin levels for this direction.
    pub fn enable_levels(self) -> EnableLevels {
        match self {
            Direction::Forward => EnableLevels {
                right: true,
                left: false,
            },
            Direction::Backward => EnableLevels {
                right: false,
                left: true,
            },
            Direction::Stopped => EnableLevels {
                right: false,
                left: false,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two H-bridge enable outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnablePin {
    Right,
    Left,
}

/// Logic levels of both enable pins.
///
/// Only obtainable through [`Direction::enable_levels`], so a value with
/// both pins high cannot be built outside this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableLevels {
    right: bool,
    left: bool,
}

impl EnableLevels {
    pub fn right(self) -> bool {
        self.right
    }

    pub fn left(self) -> bool {
        self.left
    }

    pub fn level(self, pin: EnablePin) -> bool {
        match pin {
            EnablePin::Right => self.right,
            EnablePin::Left => self.left,
        }
    }

    /// Pin writes in a safe order: the pin going low is written before the
    /// pin going high, so the bridge never sees both enables asserted.
    pub fn write_order(self) -> [(EnablePin, bool); 2] {
        if self.right {
            [(EnablePin::Left, self.left), (EnablePin::Right, self.right)]
        } else {
            [(EnablePin::Right, self.right), (EnablePin::Left, self.left)]
        }
    }
}

/// Snapshot of what the driver last applied to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotorState {
    /// Duty applied to both PWM channels.
    pub duty: u32,
    pub direction: Direction,
}
