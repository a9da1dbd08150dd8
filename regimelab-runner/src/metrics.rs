//! Performance metrics: pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar
//! out. None of them can produce NaN, so two identical runs compare equal.

use regimelab_core::domain::{Mode, TradeRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate statistics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    /// Mean P&L of winning trades (0 when there are none).
    pub avg_win: f64,
    /// Mean P&L of losing trades, negative (0 when there are none).
    pub avg_loss: f64,
    /// Gross win / gross loss. `Some(0.0)` when nothing was lost, `None`
    /// when there was neither a win nor a loss.
    pub profit_factor: Option<f64>,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough equity decline in currency units.
    pub max_drawdown: f64,
    /// The same decline as a fraction of the peak it fell from.
    pub max_drawdown_pct: f64,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    /// Closed trades per regime of entry.
    pub mode_distribution: BTreeMap<Mode, usize>,
}

impl PerformanceMetrics {
    pub fn compute(
        equity_curve: &[f64],
        trades: &[TradeRecord],
        initial_capital: f64,
        annualization_factor: f64,
        risk_free_rate: f64,
    ) -> Self {
        let final_equity = equity_curve.last().copied().unwrap_or(initial_capital);
        let (max_drawdown, max_drawdown_pct) = max_drawdown(equity_curve);
        let total_return = final_equity - initial_capital;

        Self {
            total_trades: trades.len(),
            winning_trades: trades.iter().filter(|t| t.is_winner()).count(),
            losing_trades: trades.iter().filter(|t| t.is_loser()).count(),
            win_rate: win_rate(trades),
            avg_win: mean_f64(&pls(trades, TradeRecord::is_winner)),
            avg_loss: mean_f64(&pls(trades, TradeRecord::is_loser)),
            profit_factor: profit_factor(trades),
            sharpe_ratio: sharpe_ratio(equity_curve, risk_free_rate, annualization_factor),
            max_drawdown,
            max_drawdown_pct,
            initial_capital,
            final_equity,
            total_return,
            total_return_pct: if initial_capital > 0.0 {
                total_return / initial_capital
            } else {
                0.0
            },
            mode_distribution: mode_distribution(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of trades that made money.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profit over gross loss.
///
/// With no losses the ratio is reported as `Some(0.0)` if anything was won
/// and `None` if nothing was won either.
pub fn profit_factor(trades: &[TradeRecord]) -> Option<f64> {
    let gross_win: f64 = pls(trades, TradeRecord::is_winner).iter().sum();
    let gross_loss: f64 = pls(trades, TradeRecord::is_loser).iter().map(|pl| pl.abs()).sum();

    if gross_loss > 0.0 {
        Some(gross_win / gross_loss)
    } else if gross_win > 0.0 {
        Some(0.0)
    } else {
        None
    }
}

/// Annualized Sharpe ratio of period-over-period equity returns.
///
/// Sharpe = mean(r - rf / periods) / std(r) * sqrt(periods).
/// Returns 0.0 with fewer than two returns or zero variance.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let returns = period_returns(equity_curve);
    if returns.len() < 2 || periods_per_year <= 0.0 {
        return 0.0;
    }
    let period_rf = risk_free_rate / periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - period_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&excess) / std * periods_per_year.sqrt()
}

/// Largest peak-to-trough decline: (absolute, fraction of peak). Both are
/// positive numbers, 0 for a curve that never falls.
///
/// The two maxima are tracked independently and may come from different
/// declines.
pub fn max_drawdown(equity_curve: &[f64]) -> (f64, f64) {
    let Some(&first) = equity_curve.first() else {
        return (0.0, 0.0);
    };
    let mut peak = first;
    let mut max_abs = 0.0_f64;
    let mut max_pct = 0.0_f64;

    for &eq in equity_curve {
        peak = peak.max(eq);
        let dd = peak - eq;
        max_abs = max_abs.max(dd);
        if peak > 0.0 {
            max_pct = max_pct.max(dd / peak);
        }
    }
    (max_abs, max_pct)
}

/// Number of closed trades per regime of entry.
pub fn mode_distribution(trades: &[TradeRecord]) -> BTreeMap<Mode, usize> {
    let mut counts = BTreeMap::new();
    for trade in trades {
        *counts.entry(trade.mode).or_insert(0) += 1;
    }
    counts
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple returns between consecutive equity observations.
pub fn period_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn pls(trades: &[TradeRecord], keep: fn(&TradeRecord) -> bool) -> Vec<f64> {
    trades.iter().filter(|t| keep(t)).map(|t| t.pl).collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
