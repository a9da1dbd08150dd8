//! Completed round trips and equity observations.

use super::action::ExitReason;
use super::mode::{Mode, Side};
use super::position::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A closed round trip. Appended once when a position closes, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub side: Side,
    pub entry_timestamp: DateTime<Utc>,
    pub exit_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub qty: f64,
    pub pl: f64,
    /// Return as a fraction of entry price, signed by side.
    pub pl_percent: f64,
    /// Canonical reason string, e.g. `stop_loss_triggered_2.10%`.
    pub exit_reason: String,
    /// Regime the position was entered under.
    pub mode: Mode,
}

impl TradeRecord {
    pub fn from_close(
        position: &Position,
        exit_price: f64,
        exit_timestamp: DateTime<Utc>,
        reason: &ExitReason,
    ) -> Self {
        Self {
            symbol: position.symbol.clone(),
            side: position.side,
            entry_timestamp: position.entry_timestamp,
            exit_timestamp,
            entry_price: position.entry_price,
            exit_price,
            qty: position.qty,
            pl: position.unrealized_pnl(exit_price),
            pl_percent: position.unrealized_return(exit_price),
            exit_reason: reason.to_string(),
            mode: position.mode_at_entry,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pl < 0.0
    }
}

/// Equity at the close of one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}
