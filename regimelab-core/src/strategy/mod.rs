//! Regime-specific trading strategies.
//!
//! The set of regimes is closed, so strategies are variants of one enum and
//! dispatch is an exhaustive `match`. Adding a regime means adding a variant
//! here, and the compiler lists every place that has to handle it.

pub mod bear;
pub mod bull;
pub mod volatile;

pub use bear::BearStrategy;
pub use bull::BullStrategy;
pub use volatile::VolatileStrategy;

use crate::analysis::MarketConditions;
use crate::config::TradingConfig;
use crate::domain::{Mode, Position, StrategyExit};

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyMode {
    Bull(BullStrategy),
    Volatile(VolatileStrategy),
    Bear(BearStrategy),
}

impl StrategyMode {
    pub fn for_mode(mode: Mode, config: &TradingConfig) -> Self {
        match mode {
            Mode::Bull => StrategyMode::Bull(BullStrategy),
            Mode::Volatile => StrategyMode::Volatile(VolatileStrategy::new(
                config.volatility_threshold_high,
            )),
            Mode::Bear => StrategyMode::Bear(BearStrategy),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            StrategyMode::Bull(_) => Mode::Bull,
            StrategyMode::Volatile(_) => Mode::Volatile,
            StrategyMode::Bear(_) => Mode::Bear,
        }
    }

    pub fn should_enter_long(&self, c: &MarketConditions) -> bool {
        match self {
            StrategyMode::Bull(s) => s.should_enter_long(c),
            StrategyMode::Volatile(s) => s.should_enter_long(c),
            StrategyMode::Bear(_) => false,
        }
    }

    pub fn should_enter_short(&self, c: &MarketConditions) -> bool {
        match self {
            StrategyMode::Bull(_) => false,
            StrategyMode::Volatile(s) => s.should_enter_short(c),
            StrategyMode::Bear(s) => s.should_enter_short(c),
        }
    }

    /// Strategy-driven exit for an open position. Never fires merely because
    /// the position was opened under a different regime.
    pub fn should_exit(&self, c: &MarketConditions, position: &Position) -> Option<StrategyExit> {
        match self {
            StrategyMode::Bull(s) => s.should_exit(c, position),
            StrategyMode::Volatile(s) => s.should_exit(c, position),
            StrategyMode::Bear(s) => s.should_exit(c, position),
        }
    }

    /// Scales the base position size.
    pub fn position_size_multiplier(&self) -> f64 {
        match self {
            StrategyMode::Bull(_) => bull::SIZE_MULTIPLIER,
            StrategyMode::Volatile(_) => volatile::SIZE_MULTIPLIER,
            StrategyMode::Bear(_) => bear::SIZE_MULTIPLIER,
        }
    }

    /// Trend magnitude this strategy treats as decisive. The risk manager
    /// bails out when the trend runs this strongly against a position.
    pub fn entry_trend_threshold(&self) -> f64 {
        match self {
            StrategyMode::Bull(_) => bull::ENTRY_TREND,
            StrategyMode::Volatile(_) => volatile::REVERSAL_TREND,
            StrategyMode::Bear(_) => bear::ENTRY_TREND,
        }
    }
}

#[cfg(test)]
pub(crate) fn conditions(trend: f64, sentiment: f64, rsi: f64, volatility: f64) -> MarketConditions {
    use chrono::{TimeZone, Utc};
    MarketConditions {
        as_of: Utc.with_ymd_and_hms(2024, 6, 3, 21, 0, 0).unwrap(),
        volatility,
        trend_strength: trend,
        sentiment,
        rsi,
        adx: 30.0,
        current_price: 100.0,
    }
}

#[cfg(test)]
pub(crate) fn open_position(side: crate::domain::Side, mode: Mode) -> Position {
    use chrono::{TimeZone, Utc};
    Position::new(
        "TEST",
        side,
        10.0,
        100.0,
        Utc.with_ymd_and_hms(2024, 6, 1, 21, 0, 0).unwrap(),
        mode,
    )
}
