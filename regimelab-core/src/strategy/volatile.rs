//! Volatile regime: mean reversion on both sides at reduced size.

use crate::analysis::MarketConditions;
use crate::domain::{Position, Side, StrategyExit};

pub const SIZE_MULTIPLIER: f64 = 0.7;
pub const REVERSAL_TREND: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatileStrategy {
    volatility_threshold_high: f64,
}

impl VolatileStrategy {
    pub fn new(volatility_threshold_high: f64) -> Self {
        Self {
            volatility_threshold_high,
        }
    }

    pub fn should_enter_long(&self, c: &MarketConditions) -> bool {
        let capitulation = c.rsi < 30.0 && c.volatility > self.volatility_threshold_high;
        capitulation || c.sentiment < -0.5
    }

    pub fn should_enter_short(&self, c: &MarketConditions) -> bool {
        let blow_off = c.rsi > 70.0 && c.volatility > self.volatility_threshold_high;
        blow_off || c.sentiment > 0.5
    }

    pub fn should_exit(&self, c: &MarketConditions, position: &Position) -> Option<StrategyExit> {
        let reverted = match position.side {
            Side::Long => c.rsi > 55.0 || c.sentiment > 0.1,
            Side::Short => c.rsi < 45.0 || c.sentiment < -0.1,
        };
        reverted.then_some(StrategyExit::MeanReversion)
    }
}
