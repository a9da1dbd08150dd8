//! Serializable run configuration.
//!
//! A run file is TOML with three optional tables:
//!
//! ```toml
//! [trading]
//! stop_loss_pct = 0.03
//!
//! [indicators]
//! rsi_period = 14
//!
//! [backtest]
//! lookback = 60
//! fill_price = "close"
//! ```
//!
//! Missing tables and fields take their defaults; unknown keys are rejected.

use regimelab_core::domain::Bar;
use regimelab_core::{ConfigError, IndicatorConfig, TradingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a run (content-addressable hash of its config).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Which price of the decision bar a simulated fill executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPrice {
    #[default]
    Close,
    Open,
    /// (high + low + close) / 3
    Typical,
}

impl FillPrice {
    pub fn price(self, bar: &Bar) -> f64 {
        match self {
            FillPrice::Close => bar.close,
            FillPrice::Open => bar.open,
            FillPrice::Typical => bar.typical_price(),
        }
    }
}

/// Simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestSettings {
    /// Length of the trailing window handed to the analyzer each day.
    pub lookback: usize,
    pub fill_price: FillPrice,
    /// Return periods per year used to annualize the Sharpe ratio.
    pub annualization_factor: f64,
    /// Annual risk-free rate subtracted in the Sharpe ratio.
    pub risk_free_rate: f64,
    /// Close a still-open position on the last valid bar.
    pub close_at_end: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            lookback: 60,
            fill_price: FillPrice::Close,
            annualization_factor: 252.0,
            risk_free_rate: 0.0,
            close_at_end: true,
        }
    }
}

/// Everything needed to reproduce a run, apart from the bars themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub trading: TradingConfig,
    pub indicators: IndicatorConfig,
    pub backtest: BacktestSettings,
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, RunConfigError> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, RunConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trading.validate()?;
        self.indicators.validate()?;

        let settings = &self.backtest;
        let required = self.indicators.required_bars();
        if settings.lookback < required {
            return Err(ConfigError::Inconsistent(format!(
                "backtest.lookback ({}) is shorter than the {} bars the indicators need",
                settings.lookback, required
            )));
        }
        if !(settings.annualization_factor > 0.0) || !settings.annualization_factor.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "annualization_factor",
                range: "(0, inf)",
                value: settings.annualization_factor,
            });
        }
        if !settings.risk_free_rate.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "risk_free_rate",
                range: "finite",
                value: settings.risk_free_rate,
            });
        }
        Ok(())
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
