//! Parameter sweeps over the risk settings.
//!
//! Each grid point is an independent backtest over the same bars with its
//! own config and its own state, so points run in parallel on rayon's pool.

use anyhow::{Context, Result};
use rayon::prelude::*;
use regimelab_core::domain::Bar;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::RunConfig;
use crate::result::BacktestResult;
use crate::simulator::BacktestSimulator;

/// Values to try for each swept setting.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub stop_loss_pcts: Vec<f64>,
    pub take_profit_pcts: Vec<f64>,
    pub position_size_pcts: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            stop_loss_pcts: vec![0.01, 0.02, 0.03],
            take_profit_pcts: vec![0.03, 0.05, 0.08],
            position_size_pcts: vec![0.05, 0.10, 0.20],
        }
    }
}

impl ParamGrid {
    /// Total number of grid points before validation.
    pub fn size(&self) -> usize {
        self.stop_loss_pcts.len() * self.take_profit_pcts.len() * self.position_size_pcts.len()
    }

    /// Every combination applied to `base`, dropping those that fail validation.
    pub fn generate_configs(&self, base: &RunConfig) -> Vec<RunConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &stop_loss in &self.stop_loss_pcts {
            for &take_profit in &self.take_profit_pcts {
                for &size in &self.position_size_pcts {
                    let mut config = base.clone();
                    config.trading.stop_loss_pct = stop_loss;
                    config.trading.take_profit_pct = take_profit;
                    config.trading.position_size_pct = size;
                    if config.validate().is_ok() {
                        configs.push(config);
                    }
                }
            }
        }
        configs
    }
}

/// Runs a grid of backtests over one bar series.
pub struct ParamSweep<'a> {
    symbol: &'a str,
    bars: &'a [Bar],
    initial_capital: f64,
    parallel: bool,
}

impl<'a> ParamSweep<'a> {
    pub fn new(symbol: &'a str, bars: &'a [Bar], initial_capital: f64) -> Self {
        Self {
            symbol,
            bars,
            initial_capital,
            parallel: true,
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn sweep(&self, grid: &ParamGrid, base: &RunConfig) -> Result<SweepResults> {
        let configs = grid.generate_configs(base);
        let run = |config: &RunConfig| -> Result<(RunConfig, BacktestResult)> {
            let result = BacktestSimulator::new(config.clone())?
                .run(self.symbol, self.bars, self.initial_capital)
                .with_context(|| format!("backtest failed for run {}", config.run_id()))?;
            Ok((config.clone(), result))
        };

        let outcomes = if self.parallel {
            configs.par_iter().map(run).collect::<Result<Vec<_>>>()?
        } else {
            configs.iter().map(run).collect::<Result<Vec<_>>>()?
        };
        Ok(SweepResults::new(outcomes))
    }
}

/// Finished sweep: each config with its result.
#[derive(Debug)]
pub struct SweepResults {
    entries: Vec<(RunConfig, BacktestResult)>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(entries: Vec<(RunConfig, BacktestResult)>) -> Self {
        let by_run_id = entries
            .iter()
            .enumerate()
            .map(|(i, (_, r))| (r.run_id.clone(), i))
            .collect();
        Self { entries, by_run_id }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&(RunConfig, BacktestResult)> {
        self.by_run_id.get(run_id).map(|&i| &self.entries[i])
    }

    /// Best Sharpe first. Ties go to the higher total return, then run id.
    pub fn ranked(&self) -> Vec<&(RunConfig, BacktestResult)> {
        let mut ranked: Vec<_> = self.entries.iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.metrics
                .sharpe_ratio
                .partial_cmp(&a.metrics.sharpe_ratio)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.metrics
                        .total_return
                        .partial_cmp(&a.metrics.total_return)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        ranked
    }

    pub fn top_n(&self, n: usize) -> Vec<&(RunConfig, BacktestResult)> {
        self.ranked().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&(RunConfig, BacktestResult)> {
        self.ranked().into_iter().next()
    }
}
