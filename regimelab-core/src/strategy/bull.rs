//! Bull regime: trend-following longs, no shorts.

use crate::analysis::MarketConditions;
use crate::domain::{Position, Side, StrategyExit};

pub const SIZE_MULTIPLIER: f64 = 1.0;
pub const ENTRY_TREND: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BullStrategy;

impl BullStrategy {
    pub fn should_enter_long(&self, c: &MarketConditions) -> bool {
        let trend_entry = c.trend_strength > ENTRY_TREND && c.sentiment > 0.2 && c.rsi < 70.0;
        let oversold_bounce = c.trend_strength > 0.1 && c.rsi < 35.0;
        trend_entry || oversold_bounce
    }

    pub fn should_exit(&self, c: &MarketConditions, position: &Position) -> Option<StrategyExit> {
        if position.side != Side::Long {
            return None;
        }
        if c.trend_strength < -0.2 || c.sentiment < -0.4 {
            Some(StrategyExit::TrendReversal)
        } else if c.rsi > 75.0 {
            Some(StrategyExit::Overbought)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Mode;
    use crate::strategy::{conditions, open_position};

    #[test]
    fn enters_with_trend_and_sentiment() {
        assert!(BullStrategy.should_enter_long(&conditions(0.7, 0.5, 55.0, 0.1)));
        assert!(!BullStrategy.should_enter_long(&conditions(0.7, 0.5, 72.0, 0.1)));
        assert!(!BullStrategy.should_enter_long(&conditions(0.7, 0.1, 55.0, 0.1)));
    }

    #[test]
    fn buys_oversold_dip_in_mild_uptrend() {
        assert!(BullStrategy.should_enter_long(&conditions(0.15, -0.3, 30.0, 0.1)));
        assert!(!BullStrategy.should_enter_long(&conditions(0.05, -0.3, 30.0, 0.1)));
    }

    #[test]
    fn exit_reasons() {
        let long = open_position(Side::Long, Mode::Bull);
        assert_eq!(
            BullStrategy.should_exit(&conditions(-0.3, 0.0, 50.0, 0.1), &long),
            Some(StrategyExit::TrendReversal)
        );
        assert_eq!(
            BullStrategy.should_exit(&conditions(0.5, -0.5, 50.0, 0.1), &long),
            Some(StrategyExit::TrendReversal)
        );
        assert_eq!(
            BullStrategy.should_exit(&conditions(0.5, 0.3, 80.0, 0.1), &long),
            Some(StrategyExit::Overbought)
        );
        assert_eq!(
            BullStrategy.should_exit(&conditions(0.5, 0.3, 60.0, 0.1), &long),
            None
        );
    }

    #[test]
    fn ignores_short_positions() {
        let short = open_position(Side::Short, Mode::Volatile);
        assert_eq!(
            BullStrategy.should_exit(&conditions(-0.9, -0.9, 90.0, 0.1), &short),
            None
        );
    }
}
