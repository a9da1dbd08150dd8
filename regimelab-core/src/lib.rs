//! RegimeLab Core: regime classification, strategy selection and risk rules.
//!
//! This crate contains the decision logic shared by backtests and live cycles:
//! - Domain types (bars, positions, actions, trade records)
//! - Technical indicators and the condition analyzer
//! - Regime selection and the three regime strategies
//! - Risk manager (protective exits, position sizing)
//! - Decision engine tying the above together
//! - Collaborator traits for data and order execution
//!
//! Nothing here performs I/O or holds state between calls.

pub mod analysis;
pub mod config;
pub mod decision;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod ports;
pub mod regime;
pub mod risk;
pub mod strategy;

pub use analysis::{ConditionAnalyzer, MarketConditions};
pub use config::{ConfigError, IndicatorConfig, TradingConfig};
pub use decision::DecisionEngine;
pub use error::{
    CycleError, DataUnavailableError, InsufficientDataError, OrderRejectedError,
    RiskViolationError,
};
pub use regime::ModeSelector;
pub use risk::RiskManager;
pub use strategy::StrategyMode;
