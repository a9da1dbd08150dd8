//! Bear regime: trend-following shorts at half size, no longs.

use crate::analysis::MarketConditions;
use crate::domain::{Position, Side, StrategyExit};

pub const SIZE_MULTIPLIER: f64 = 0.5;
pub const ENTRY_TREND: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BearStrategy;

impl BearStrategy {
    pub fn should_enter_short(&self, c: &MarketConditions) -> bool {
        let trend_entry = c.trend_strength < -ENTRY_TREND && c.sentiment < -0.2 && c.rsi > 30.0;
        let overbought_rally = c.trend_strength < -0.1 && c.rsi > 65.0;
        trend_entry || overbought_rally
    }

    pub fn should_exit(&self, c: &MarketConditions, position: &Position) -> Option<StrategyExit> {
        if position.side != Side::Short {
            return None;
        }
        if c.trend_strength > 0.2 || c.sentiment > 0.4 {
            Some(StrategyExit::TrendReversal)
        } else if c.rsi < 25.0 {
            Some(StrategyExit::Oversold)
        } else {
            None
        }
    }
}
