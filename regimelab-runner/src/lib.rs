//! RegimeLab Runner: backtests, live cycles, sweeps, metrics and reporting.
//!
//! This crate builds on `regimelab-core` to provide:
//! - Bar loading from CSV and a seeded synthetic generator
//! - The backtest simulator and its performance metrics
//! - A live trading session over the data and execution ports
//! - An in-memory paper executor
//! - Parallel parameter sweeps
//! - JSON / CSV artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod live;
pub mod metrics;
pub mod paper;
pub mod result;
pub mod simulator;
pub mod sweep;

pub use config::{BacktestSettings, FillPrice, RunConfig, RunConfigError, RunId};
pub use data_loader::{
    dataset_hash, generate_synthetic_bars, load_csv, read_csv, LoadError, StaticDataSource,
};
pub use live::{CycleReport, LedgerEntry, TradingSession};
pub use metrics::PerformanceMetrics;
pub use paper::PaperExecutor;
pub use result::{BacktestResult, DecisionRecord, SkippedDay, SCHEMA_VERSION};
pub use simulator::{run_backtest, BacktestError, BacktestSimulator};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};
