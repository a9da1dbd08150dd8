//! Actions emitted by a decision cycle and the reasons positions close.

use super::mode::Mode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a cycle asks the caller to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    OpenLong { qty: f64, price: f64 },
    OpenShort { qty: f64, price: f64 },
    Close { reason: ExitReason, qty: f64, price: f64 },
    Hold,
    /// The selected regime differs from the one the open position was
    /// entered under. Informational: nothing is filled.
    SwitchMode { from: Mode, to: Mode },
}

impl Action {
    pub fn is_open(&self) -> bool {
        matches!(self, Action::OpenLong { .. } | Action::OpenShort { .. })
    }

    pub fn is_close(&self) -> bool {
        matches!(self, Action::Close { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::OpenLong { .. } => "open_long",
            Action::OpenShort { .. } => "open_short",
            Action::Close { .. } => "close",
            Action::Hold => "hold",
            Action::SwitchMode { .. } => "switch_mode",
        }
    }
}

/// Output of one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub mode: Mode,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BailoutCause {
    ExtremeVolatility,
    StrongReversal,
    ModeTransition,
}

/// Exit signals raised by a regime strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyExit {
    TrendReversal,
    Overbought,
    Oversold,
    MeanReversion,
}

/// Why a position was closed. `Display` renders the canonical reason string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Loss as a positive fraction of entry price.
    StopLoss { loss_pct: f64 },
    /// Gain as a fraction of entry price.
    TakeProfit { gain_pct: f64 },
    Bailout(BailoutCause),
    Strategy(StrategyExit),
    /// Force-closed when a backtest runs out of bars.
    EndOfData,
}

impl From<StrategyExit> for ExitReason {
    fn from(exit: StrategyExit) -> Self {
        ExitReason::Strategy(exit)
    }
}

impl From<BailoutCause> for ExitReason {
    fn from(cause: BailoutCause) -> Self {
        ExitReason::Bailout(cause)
    }
}

impl fmt::Display for BailoutCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BailoutCause::ExtremeVolatility => "bailout_extreme_volatility",
            BailoutCause::StrongReversal => "bailout_strong_reversal",
            BailoutCause::ModeTransition => "bailout_mode_transition",
        })
    }
}

impl fmt::Display for StrategyExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrategyExit::TrendReversal => "trend_reversal",
            StrategyExit::Overbought => "overbought",
            StrategyExit::Oversold => "oversold",
            StrategyExit::MeanReversion => "mean_reversion",
        })
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss { loss_pct } => {
                write!(f, "stop_loss_triggered_{:.2}%", loss_pct * 100.0)
            }
            ExitReason::TakeProfit { gain_pct } => {
                write!(f, "take_profit_triggered_{:.2}%", gain_pct * 100.0)
            }
            ExitReason::Bailout(cause) => cause.fmt(f),
            ExitReason::Strategy(exit) => exit.fmt(f),
            ExitReason::EndOfData => f.write_str("backtest_end"),
        }
    }
}
