//! Backtest result and its human-readable summary.

use chrono::{DateTime, Utc};
use regimelab_core::domain::{Action, EquityPoint, Mode, TradeRecord};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::config::RunId;
use crate::metrics::PerformanceMetrics;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a backtest run.
///
/// Computed once at the end of a run. Contains no NaN, so two runs over the
/// same bars and config compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub bar_count: usize,
    /// One point per simulated day, skipped days carried forward.
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    /// Every decision the engine produced, in order.
    pub decisions: Vec<DecisionRecord>,
    pub skipped_days: Vec<SkippedDay>,
    /// Entries the risk manager refused to size.
    pub refused_entries: usize,
    pub metrics: PerformanceMetrics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A day on which no decision could be made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDay {
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
    pub action: Action,
}

impl BacktestResult {
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }

    /// Multi-line report of the headline statistics.
    pub fn summary(&self) -> String {
        let m = &self.metrics;
        let mut out = String::new();
        let rule = "=".repeat(60);

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "BACKTEST RESULTS: {}", self.symbol);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Run ID:          {}", short_id(&self.run_id));
        if let (Some(first), Some(last)) = (self.equity_curve.first(), self.equity_curve.last()) {
            let _ = writeln!(
                out,
                "Period:          {} .. {} ({} days)",
                first.timestamp.date_naive(),
                last.timestamp.date_naive(),
                self.equity_curve.len()
            );
        }
        let _ = writeln!(out, "Initial Capital: ${:.2}", m.initial_capital);
        let _ = writeln!(out, "Final Equity:    ${:.2}", m.final_equity);
        let _ = writeln!(
            out,
            "Total Return:    ${:.2} ({:.2}%)",
            m.total_return,
            m.total_return_pct * 100.0
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Total Trades:    {}", m.total_trades);
        let _ = writeln!(out, "Winning Trades:  {}", m.winning_trades);
        let _ = writeln!(out, "Losing Trades:   {}", m.losing_trades);
        let _ = writeln!(out, "Win Rate:        {:.2}%", m.win_rate * 100.0);
        let _ = writeln!(out, "Average Win:     ${:.2}", m.avg_win);
        let _ = writeln!(out, "Average Loss:    ${:.2}", m.avg_loss);
        match m.profit_factor {
            Some(pf) => {
                let _ = writeln!(out, "Profit Factor:   {pf:.2}");
            }
            None => {
                let _ = writeln!(out, "Profit Factor:   n/a");
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Sharpe Ratio:    {:.2}", m.sharpe_ratio);
        let _ = writeln!(
            out,
            "Max Drawdown:    ${:.2} ({:.2}%)",
            m.max_drawdown,
            m.max_drawdown_pct * 100.0
        );

        if !m.mode_distribution.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Trades by mode:");
            for (mode, count) in &m.mode_distribution {
                let _ = writeln!(out, "  {mode:<9} {count}");
            }
        }
        if !self.skipped_days.is_empty() || self.refused_entries > 0 {
            let _ = writeln!(out);
            let _ = writeln!(out, "Skipped days:    {}", self.skipped_days.len());
            let _ = writeln!(out, "Refused entries: {}", self.refused_entries);
        }
        let _ = writeln!(out, "{rule}");
        out
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
