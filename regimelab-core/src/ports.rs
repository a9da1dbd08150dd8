//! Collaborator traits for market data and order execution.
//!
//! The core never performs I/O. Live trading plugs a broker in behind these
//! traits; tests and the paper command use in-memory implementations.

use crate::domain::{Bar, Side};
use crate::error::{DataUnavailableError, OrderRejectedError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of recent bars for a symbol.
pub trait DataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// The most recent `window` bars for `symbol`, oldest first. May return
    /// fewer bars than asked for when history is short.
    fn get_bars(&self, symbol: &str, window: usize) -> Result<Vec<Bar>, DataUnavailableError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Order that opens a position on `side`.
    pub fn opening(side: Side) -> Self {
        match side {
            Side::Long => OrderSide::Buy,
            Side::Short => OrderSide::Sell,
        }
    }

    /// Order that closes a position on `side`.
    pub fn closing(side: Side) -> Self {
        match side {
            Side::Long => OrderSide::Sell,
            Side::Short => OrderSide::Buy,
        }
    }
}

/// Execution report for a filled market order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: String,
    pub side: OrderSide,
    pub qty: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// A position as the broker reports it. Brokers know nothing of regimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerPosition {
    pub symbol: String,
    pub side: Side,
    pub qty: f64,
    pub avg_entry_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub equity: f64,
    pub cash: f64,
    pub buying_power: f64,
}

/// Places market orders and reports positions and account state.
pub trait OrderExecutor: Send {
    fn place_order(
        &mut self,
        symbol: &str,
        side: OrderSide,
        qty: f64,
    ) -> Result<Fill, OrderRejectedError>;

    fn get_position(&self, symbol: &str) -> Result<Option<BrokerPosition>, DataUnavailableError>;

    fn get_account(&self) -> Result<Account, DataUnavailableError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_and_closing_sides_mirror() {
        for side in [Side::Long, Side::Short] {
            assert_ne!(OrderSide::opening(side), OrderSide::closing(side));
        }
        assert_eq!(OrderSide::opening(Side::Short), OrderSide::Sell);
    }
}
