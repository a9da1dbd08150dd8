//! Open position state, owned by whoever drives decision cycles.

use super::mode::{Mode, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single open position held for a symbol.
///
/// `mode_at_entry` records the regime that opened the position and is never
/// changed while the position lives; comparing it with the currently
/// selected mode drives the mode-transition bailout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub qty: f64,
    pub entry_price: f64,
    pub entry_timestamp: DateTime<Utc>,
    pub mode_at_entry: Mode,
}

impl Position {
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        qty: f64,
        entry_price: f64,
        entry_timestamp: DateTime<Utc>,
        mode_at_entry: Mode,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            qty,
            entry_price,
            entry_timestamp,
            mode_at_entry,
        }
    }

    /// Capital committed at entry.
    pub fn entry_value(&self) -> f64 {
        self.qty * self.entry_price
    }

    /// Signed P&L at `price`: positive is a gain for either side.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) * self.qty
    }

    /// Signed return at `price` as a fraction of the entry price.
    pub fn unrealized_return(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) / self.entry_price
    }
}
