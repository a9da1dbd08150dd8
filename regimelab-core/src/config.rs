//! Trading and indicator configuration.
//!
//! Both are plain immutable values passed by reference into every analysis
//! and decision call. Every field has a default so partial TOML tables work.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be within {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error("{0}")]
    Inconsistent(String),
}

fn check(
    field: &'static str,
    value: f64,
    ok: bool,
    range: &'static str,
) -> Result<(), ConfigError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, range, value })
    }
}

/// Risk limits and regime thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TradingConfig {
    /// Close when the unrealized loss reaches this fraction of entry.
    pub stop_loss_pct: f64,
    /// Close when the unrealized gain reaches this fraction of entry.
    pub take_profit_pct: f64,
    pub volatility_threshold_high: f64,
    pub volatility_threshold_low: f64,
    pub trend_strength_bull: f64,
    pub trend_strength_bear: f64,
    /// Base fraction of equity committed per entry, before the strategy multiplier.
    pub position_size_pct: f64,
    /// Hard cap on notional as a fraction of equity.
    pub max_position_pct: f64,
    /// Volatility above which any open position is abandoned.
    pub bailout_volatility: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.02,
            take_profit_pct: 0.05,
            volatility_threshold_high: 0.25,
            volatility_threshold_low: 0.15,
            trend_strength_bull: 0.6,
            trend_strength_bear: -0.6,
            position_size_pct: 0.10,
            max_position_pct: 0.20,
            bailout_volatility: 0.5,
        }
    }
}

impl TradingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(
            "stop_loss_pct",
            self.stop_loss_pct,
            (0.0..1.0).contains(&self.stop_loss_pct),
            "[0, 1)",
        )?;
        check(
            "take_profit_pct",
            self.take_profit_pct,
            self.take_profit_pct >= 0.0,
            "[0, inf)",
        )?;
        check(
            "volatility_threshold_low",
            self.volatility_threshold_low,
            (0.0..=1.0).contains(&self.volatility_threshold_low),
            "[0, 1]",
        )?;
        check(
            "volatility_threshold_high",
            self.volatility_threshold_high,
            (0.0..=1.0).contains(&self.volatility_threshold_high),
            "[0, 1]",
        )?;
        check(
            "trend_strength_bull",
            self.trend_strength_bull,
            (0.0..=1.0).contains(&self.trend_strength_bull),
            "[0, 1]",
        )?;
        check(
            "trend_strength_bear",
            self.trend_strength_bear,
            (-1.0..=0.0).contains(&self.trend_strength_bear),
            "[-1, 0]",
        )?;
        check(
            "position_size_pct",
            self.position_size_pct,
            self.position_size_pct > 0.0 && self.position_size_pct <= 1.0,
            "(0, 1]",
        )?;
        check(
            "max_position_pct",
            self.max_position_pct,
            self.max_position_pct > 0.0 && self.max_position_pct <= 1.0,
            "(0, 1]",
        )?;
        check(
            "bailout_volatility",
            self.bailout_volatility,
            self.bailout_volatility > 0.0,
            "(0, inf)",
        )?;

        if self.volatility_threshold_low > self.volatility_threshold_high {
            return Err(ConfigError::Inconsistent(format!(
                "volatility_threshold_low ({}) exceeds volatility_threshold_high ({})",
                self.volatility_threshold_low, self.volatility_threshold_high
            )));
        }
        Ok(())
    }
}

/// Indicator periods used by the condition analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub adx_period: usize,
    pub atr_period: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Trailing bars averaged into the volatility score.
    pub volatility_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            adx_period: 14,
            atr_period: 14,
            bollinger_period: 20,
            bollinger_std: 2.0,
            sma_fast: 20,
            sma_slow: 50,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            volatility_window: 20,
        }
    }
}

impl IndicatorConfig {
    /// Minimum window length for which every input of the analyzer is
    /// defined at the last bar (and ATR / band width over the whole
    /// volatility window).
    pub fn required_bars(&self) -> usize {
        [
            self.sma_slow,
            self.sma_fast,
            self.rsi_period + 1,
            2 * self.adx_period,
            self.macd_slow + self.macd_signal - 1,
            self.atr_period + self.volatility_window,
            self.bollinger_period + self.volatility_window - 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("adx_period", self.adx_period),
            ("atr_period", self.atr_period),
            ("bollinger_period", self.bollinger_period),
            ("sma_fast", self.sma_fast),
            ("sma_slow", self.sma_slow),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("volatility_window", self.volatility_window),
        ];
        for (field, period) in periods {
            if period == 0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    range: "[1, inf)",
                    value: 0.0,
                });
            }
        }
        check(
            "bollinger_std",
            self.bollinger_std,
            self.bollinger_std > 0.0,
            "(0, inf)",
        )?;
        if self.sma_fast >= self.sma_slow {
            return Err(ConfigError::Inconsistent(format!(
                "sma_fast ({}) must be shorter than sma_slow ({})",
                self.sma_fast, self.sma_slow
            )));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::Inconsistent(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        Ok(())
    }
}
