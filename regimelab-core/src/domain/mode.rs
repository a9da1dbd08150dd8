//! Market regimes and position sides.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Market regime. Exactly one is selected per decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Bull,
    Volatile,
    Bear,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Bull, Mode::Volatile, Mode::Bear];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Bull => "bull",
            Mode::Volatile => "volatile",
            Mode::Bear => "bear",
        }
    }

    /// Whether a position on `side` may be held while this mode is selected.
    ///
    /// Bull trades long only, Bear short only, Volatile either way.
    pub fn allows(&self, side: Side) -> bool {
        match (self, side) {
            (Mode::Volatile, _) => true,
            (Mode::Bull, Side::Long) => true,
            (Mode::Bear, Side::Short) => true,
            (Mode::Bull, Side::Short) | (Mode::Bear, Side::Long) => false,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
