//! Backtest simulator: replays the live decision logic over historical bars.
//!
//! Each simulated day `t` hands the analyzer the trailing `lookback` bars
//! ending at `t` and never anything after it. The resulting decision is
//! applied as a fill on bar `t` at the configured price, then the book is
//! marked at the close of `t`.
//!
//! Days on which no decision can be made (a void bar at `t`, or a window the
//! analyzer rejects) are skipped: equity is carried forward and the day is
//! recorded in `BacktestResult::skipped_days`. Void bars earlier in the window
//! are dropped by the analyzer, so the day after a gap trades normally.

use regimelab_core::domain::{
    first_unordered, Action, Bar, EquityPoint, ExitReason, Mode, Position, Side, TradeRecord,
};
use regimelab_core::{ConditionAnalyzer, ConfigError, DecisionEngine, InsufficientDataError};
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use crate::config::{BacktestSettings, RunConfig};
use crate::metrics::PerformanceMetrics;
use crate::result::{BacktestResult, DecisionRecord, SkippedDay, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("no bars to simulate")]
    EmptySeries,

    #[error("bar {index} does not come strictly after the bar before it")]
    UnorderedBars { index: usize },

    #[error("initial capital must be positive, got {capital}")]
    InvalidCapital { capital: f64 },

    #[error("series too short for one full window: {0}")]
    InsufficientData(#[from] InsufficientDataError),

    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}

/// Runs backtests for one configuration. Holds no state between runs.
#[derive(Debug, Clone)]
pub struct BacktestSimulator {
    config: RunConfig,
    analyzer: ConditionAnalyzer,
    engine: DecisionEngine,
}

impl BacktestSimulator {
    pub fn new(config: RunConfig) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self {
            analyzer: ConditionAnalyzer::new(config.indicators.clone()),
            engine: DecisionEngine::new(config.trading.clone()),
            config,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn run(
        &self,
        symbol: &str,
        bars: &[Bar],
        initial_capital: f64,
    ) -> Result<BacktestResult, BacktestError> {
        if bars.is_empty() {
            return Err(BacktestError::EmptySeries);
        }
        if let Some(index) = first_unordered(bars) {
            return Err(BacktestError::UnorderedBars { index });
        }
        if !(initial_capital > 0.0) || !initial_capital.is_finite() {
            return Err(BacktestError::InvalidCapital {
                capital: initial_capital,
            });
        }
        let settings: &BacktestSettings = &self.config.backtest;
        let lookback = settings.lookback;
        if bars.len() < lookback {
            return Err(InsufficientDataError::TooFewBars {
                required: lookback,
                available: bars.len(),
            }
            .into());
        }

        let run_id = self.config.run_id();
        let _span = info_span!("backtest", symbol, run_id = %run_id, bars = bars.len())
            .entered();

        let mut book = Book::new(initial_capital);
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(bars.len() + 1 - lookback);
        let mut trades: Vec<TradeRecord> = Vec::new();
        let mut decisions = Vec::with_capacity(equity_curve.capacity());
        let mut skipped_days = Vec::new();
        let mut refused_entries = 0usize;
        let mut last_valid: Option<&Bar> = None;

        for t in (lookback - 1)..bars.len() {
            let bar = &bars[t];
            let window = &bars[t + 1 - lookback..=t];

            let conditions = if bar.is_void() {
                Err("void bar".to_string())
            } else {
                self.analyzer.analyze(window).map_err(|e| e.to_string())
            };
            let conditions = match conditions {
                Ok(c) => c,
                Err(reason) => {
                    warn!(timestamp = %bar.timestamp, %reason, "skipping day");
                    skipped_days.push(SkippedDay {
                        timestamp: bar.timestamp,
                        reason,
                    });
                    let carried = equity_curve
                        .last()
                        .map(|p| p.equity)
                        .unwrap_or(initial_capital);
                    equity_curve.push(EquityPoint {
                        timestamp: bar.timestamp,
                        equity: carried,
                    });
                    continue;
                }
            };
            last_valid = Some(bar);

            let equity = book.equity(bar.close);
            match self
                .engine
                .decide(symbol, &conditions, book.position.as_ref(), equity)
            {
                Ok(decision) => {
                    let fill = settings.fill_price.price(bar);
                    match &decision.action {
                        Action::OpenLong { qty, .. } => {
                            book.open(symbol, Side::Long, *qty, fill, bar, decision.mode);
                        }
                        Action::OpenShort { qty, .. } => {
                            book.open(symbol, Side::Short, *qty, fill, bar, decision.mode);
                        }
                        Action::Close { reason, .. } => {
                            if let Some(trade) = book.close(fill, bar, reason) {
                                trades.push(trade);
                            }
                        }
                        Action::SwitchMode { from, to } => {
                            debug!(timestamp = %bar.timestamp, %from, %to, "regime changed under open position");
                        }
                        Action::Hold => {}
                    }
                    decisions.push(DecisionRecord {
                        timestamp: bar.timestamp,
                        mode: decision.mode,
                        action: decision.action,
                    });
                }
                Err(e) => {
                    refused_entries += 1;
                    warn!(timestamp = %bar.timestamp, error = %e, "entry refused");
                }
            }

            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity: book.equity(bar.close),
            });
        }

        if settings.close_at_end {
            if let Some(bar) = last_valid {
                let fill = settings.fill_price.price(bar);
                if let Some(trade) = book.close(fill, bar, &ExitReason::EndOfData) {
                    trades.push(trade);
                    if let Some(last) = equity_curve.last_mut() {
                        last.equity = book.cash;
                    }
                }
            }
        }

        let values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let metrics = PerformanceMetrics::compute(
            &values,
            &trades,
            initial_capital,
            settings.annualization_factor,
            settings.risk_free_rate,
        );
        info!(
            trades = metrics.total_trades,
            final_equity = metrics.final_equity,
            sharpe = metrics.sharpe_ratio,
            skipped = skipped_days.len(),
            refused = refused_entries,
            "backtest complete"
        );

        Ok(BacktestResult {
            schema_version: SCHEMA_VERSION,
            run_id,
            symbol: symbol.to_string(),
            bar_count: bars.len(),
            equity_curve,
            trades,
            decisions,
            skipped_days,
            refused_entries,
            metrics,
        })
    }
}

/// Run a single backtest with `config`.
pub fn run_backtest(
    symbol: &str,
    bars: &[Bar],
    initial_capital: f64,
    config: &RunConfig,
) -> Result<BacktestResult, BacktestError> {
    BacktestSimulator::new(config.clone())?.run(symbol, bars, initial_capital)
}

/// Cash plus at most one open position.
struct Book {
    cash: f64,
    position: Option<Position>,
}

impl Book {
    fn new(cash: f64) -> Self {
        Self {
            cash,
            position: None,
        }
    }

    /// Cash + entry value + unrealized P&L at `price`.
    fn equity(&self, price: f64) -> f64 {
        match &self.position {
            Some(pos) => self.cash + pos.entry_value() + pos.unrealized_pnl(price),
            None => self.cash,
        }
    }

    fn open(
        &mut self,
        symbol: &str,
        side: Side,
        qty: f64,
        price: f64,
        bar: &Bar,
        mode: Mode,
    ) {
        let pos = Position::new(symbol, side, qty, price, bar.timestamp, mode);
        self.cash -= pos.entry_value();
        info!(timestamp = %bar.timestamp, %side, qty, price, %mode, "opened position");
        self.position = Some(pos);
    }

    fn close(&mut self, price: f64, bar: &Bar, reason: &ExitReason) -> Option<TradeRecord> {
        let pos = self.position.take()?;
        let trade = TradeRecord::from_close(&pos, price, bar.timestamp, reason);
        self.cash += pos.entry_value() + trade.pl;
        info!(
            timestamp = %bar.timestamp,
            side = %pos.side,
            price,
            pl = trade.pl,
            reason = %trade.exit_reason,
            "closed position"
        );
        Some(trade)
    }
}
