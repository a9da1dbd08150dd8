//! Risk rules: protective exits and position sizing.
//!
//! Exit checks run as a strict priority chain, first hit wins:
//!
//! 1. stop-loss
//! 2. take-profit
//! 3. bailout: extreme volatility, then a strong trend against the position,
//!    then a regime that no longer allows the position's side
//!
//! A position that survives the chain is handed to the strategy.

use crate::analysis::MarketConditions;
use crate::config::TradingConfig;
use crate::domain::{BailoutCause, ExitReason, Mode, Position, Side};
use crate::error::RiskViolationError;
use crate::strategy::StrategyMode;

#[derive(Debug, Clone, Default)]
pub struct RiskManager {
    config: TradingConfig,
}

impl RiskManager {
    pub fn new(config: TradingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TradingConfig {
        &self.config
    }

    /// Protective exit for `position` under the currently selected `mode`.
    pub fn check_exit(
        &self,
        position: &Position,
        conditions: &MarketConditions,
        mode: Mode,
    ) -> Option<ExitReason> {
        let ret = position.unrealized_return(conditions.current_price);

        if -ret >= self.config.stop_loss_pct {
            return Some(ExitReason::StopLoss { loss_pct: -ret });
        }
        if ret >= self.config.take_profit_pct {
            return Some(ExitReason::TakeProfit { gain_pct: ret });
        }
        self.check_bailout(position, conditions, mode)
            .map(ExitReason::Bailout)
    }

    fn check_bailout(
        &self,
        position: &Position,
        conditions: &MarketConditions,
        mode: Mode,
    ) -> Option<BailoutCause> {
        if conditions.volatility > self.config.bailout_volatility {
            return Some(BailoutCause::ExtremeVolatility);
        }

        let threshold = StrategyMode::for_mode(mode, &self.config).entry_trend_threshold();
        let against = match position.side {
            Side::Long => conditions.trend_strength < -threshold,
            Side::Short => conditions.trend_strength > threshold,
        };
        if against {
            return Some(BailoutCause::StrongReversal);
        }

        if !mode.allows(position.side) {
            return Some(BailoutCause::ModeTransition);
        }
        None
    }

    /// Whole units to trade at `price`.
    ///
    /// The request is `equity * position_size_pct * multiplier / price`,
    /// scaled down so the notional never exceeds `max_position_pct` of
    /// equity. Fails when the result is below one unit.
    pub fn position_size(
        &self,
        equity: f64,
        price: f64,
        multiplier: f64,
    ) -> Result<f64, RiskViolationError> {
        // Negated comparisons so NaN inputs are refused too.
        if !(equity > 0.0) {
            return Err(RiskViolationError::NonPositiveEquity { equity });
        }
        if !(price > 0.0) {
            return Err(RiskViolationError::InvalidPrice { price });
        }

        let requested = equity * self.config.position_size_pct * multiplier / price;
        let cap = self.config.max_position_pct * equity / price;
        let qty = requested.min(cap).floor();
        if qty < 1.0 {
            return Err(RiskViolationError::SubUnitQuantity { qty, price, equity });
        }
        Ok(qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{conditions, open_position};

    fn at_price(price: f64, volatility: f64, trend: f64) -> MarketConditions {
        MarketConditions {
            current_price: price,
            ..conditions(trend, 0.0, 50.0, volatility)
        }
    }

    #[test]
    fn stop_loss_reports_loss_percentage() {
        let rm = RiskManager::default();
        let long = open_position(Side::Long, Mode::Bull);
        let reason = rm.check_exit(&long, &at_price(97.9, 0.1, 0.5), Mode::Bull).unwrap();
        assert_eq!(reason.to_string(), "stop_loss_triggered_2.10%");
    }

    #[test]
    fn short_stop_loss_on_rally() {
        let rm = RiskManager::default();
        let short = open_position(Side::Short, Mode::Bear);
        let reason = rm.check_exit(&short, &at_price(103.0, 0.1, -0.5), Mode::Bear).unwrap();
        assert_eq!(reason.to_string(), "stop_loss_triggered_3.00%");
    }

    #[test]
    fn take_profit() {
        let rm = RiskManager::default();
        let long = open_position(Side::Long, Mode::Bull);
        let reason = rm.check_exit(&long, &at_price(106.0, 0.1, 0.5), Mode::Bull).unwrap();
        assert_eq!(reason.to_string(), "take_profit_triggered_6.00%");
    }

    #[test]
    fn stop_loss_outranks_take_profit() {
        let rm = RiskManager::new(TradingConfig {
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
            ..TradingConfig::default()
        });
        let long = open_position(Side::Long, Mode::Bull);
        let reason = rm.check_exit(&long, &at_price(100.0, 0.1, 0.5), Mode::Bull).unwrap();
        assert!(reason.to_string().starts_with("stop_loss_triggered"));
    }

    #[test]
    fn bailout_order() {
        let rm = RiskManager::default();
        let long = open_position(Side::Long, Mode::Bull);

        // Extreme volatility wins even when the trend also turned.
        let reason = rm.check_exit(&long, &at_price(100.5, 0.6, -0.9), Mode::Bear);
        assert_eq!(reason, Some(ExitReason::Bailout(BailoutCause::ExtremeVolatility)));

        let reason = rm.check_exit(&long, &at_price(100.5, 0.2, -0.4), Mode::Bull);
        assert_eq!(reason, Some(ExitReason::Bailout(BailoutCause::StrongReversal)));

        let reason = rm.check_exit(&long, &at_price(100.5, 0.2, -0.1), Mode::Bear);
        assert_eq!(reason, Some(ExitReason::Bailout(BailoutCause::ModeTransition)));

        assert_eq!(rm.check_exit(&long, &at_price(100.5, 0.2, 0.1), Mode::Volatile), None);
    }

    #[test]
    fn volatile_regime_tolerates_moderate_counter_trend() {
        let rm = RiskManager::default();
        let long = open_position(Side::Long, Mode::Volatile);
        assert_eq!(rm.check_exit(&long, &at_price(100.5, 0.3, -0.4), Mode::Volatile), None);
        assert_eq!(
            rm.check_exit(&long, &at_price(100.5, 0.3, -0.6), Mode::Volatile),
            Some(ExitReason::Bailout(BailoutCause::StrongReversal))
        );
    }

    #[test]
    fn sizing_uses_multiplier() {
        let rm = RiskManager::default();
        // 100k * 10% * 0.5 / 50 = 100 units
        assert_eq!(rm.position_size(100_000.0, 50.0, 0.5).unwrap(), 100.0);
    }

    #[test]
    fn sizing_caps_notional() {
        let rm = RiskManager::new(TradingConfig {
            position_size_pct: 0.5,
            ..TradingConfig::default()
        });
        // request 500 units, cap 20% of 100k / 100 = 200 units
        assert_eq!(rm.position_size(100_000.0, 100.0, 1.0).unwrap(), 200.0);
    }

    #[test]
    fn sizing_refusals() {
        let rm = RiskManager::default();
        assert!(matches!(
            rm.position_size(1_000.0, 500.0, 1.0),
            Err(RiskViolationError::SubUnitQuantity { .. })
        ));
        assert!(matches!(
            rm.position_size(0.0, 10.0, 1.0),
            Err(RiskViolationError::NonPositiveEquity { .. })
        ));
        assert!(matches!(
            rm.position_size(1_000.0, f64::NAN, 1.0),
            Err(RiskViolationError::InvalidPrice { .. })
        ));
    }
}
