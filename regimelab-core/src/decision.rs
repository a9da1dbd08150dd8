//! The decision engine: one regime-aware decision per symbol per cycle.
//!
//! Per symbol the engine drives a three-state process, Flat / Long / Short.
//! A held position is first checked by the risk manager, then by the
//! regime's strategy; a flat book asks the strategy for an entry. A close is
//! never followed by an open in the same cycle.
//!
//! The engine holds no per-symbol state. The open position (if any) and the
//! account equity belong to the caller and are passed in on every call.

use crate::analysis::MarketConditions;
use crate::config::TradingConfig;
use crate::domain::{Action, Decision, Position};
use crate::error::RiskViolationError;
use crate::regime::ModeSelector;
use crate::risk::RiskManager;
use crate::strategy::StrategyMode;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    risk: RiskManager,
}

impl DecisionEngine {
    pub fn new(config: TradingConfig) -> Self {
        Self {
            risk: RiskManager::new(config),
        }
    }

    pub fn config(&self) -> &TradingConfig {
        self.risk.config()
    }

    pub fn risk_manager(&self) -> &RiskManager {
        &self.risk
    }

    /// Decide what to do with `symbol` given fresh conditions.
    ///
    /// An `Err` means a sized entry was refused; the caller should treat the
    /// cycle as a Hold and carry on.
    pub fn decide(
        &self,
        symbol: &str,
        conditions: &MarketConditions,
        position: Option<&Position>,
        equity: f64,
    ) -> Result<Decision, RiskViolationError> {
        let mode = ModeSelector::select(conditions, self.config());
        let strategy = StrategyMode::for_mode(mode, self.config());
        let price = conditions.current_price;

        let action = match position {
            Some(pos) => {
                if let Some(reason) = self.risk.check_exit(pos, conditions, mode) {
                    Action::Close {
                        reason,
                        qty: pos.qty,
                        price,
                    }
                } else if let Some(exit) = strategy.should_exit(conditions, pos) {
                    Action::Close {
                        reason: exit.into(),
                        qty: pos.qty,
                        price,
                    }
                } else if pos.mode_at_entry != mode {
                    Action::SwitchMode {
                        from: pos.mode_at_entry,
                        to: mode,
                    }
                } else {
                    Action::Hold
                }
            }
            None => {
                if strategy.should_enter_long(conditions) {
                    let qty = self.size(&strategy, equity, price)?;
                    Action::OpenLong { qty, price }
                } else if strategy.should_enter_short(conditions) {
                    let qty = self.size(&strategy, equity, price)?;
                    Action::OpenShort { qty, price }
                } else {
                    Action::Hold
                }
            }
        };

        debug!(
            symbol,
            %mode,
            action = action.label(),
            volatility = conditions.volatility,
            trend = conditions.trend_strength,
            sentiment = conditions.sentiment,
            rsi = conditions.rsi,
            "decision"
        );
        Ok(Decision { mode, action })
    }

    fn size(
        &self,
        strategy: &StrategyMode,
        equity: f64,
        price: f64,
    ) -> Result<f64, RiskViolationError> {
        self.risk
            .position_size(equity, price, strategy.position_size_multiplier())
    }
}
