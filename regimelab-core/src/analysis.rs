//! Market condition analysis: a bar window in, one scalar snapshot out.
//!
//! The snapshot reduces a window of bars to three bounded scores:
//!
//! - **volatility** in [0, 1]: the mean of ATR relative to price and the
//!   normalized Bollinger band width, both averaged over the trailing
//!   volatility window
//! - **trend strength** in [-1, 1]: ADX / 50 (capped at 1), signed by a
//!   majority vote of +DI vs -DI, fast vs slow SMA and the MACD histogram
//! - **sentiment** in [-1, 1]: the mean of recentred RSI, the close's position
//!   inside the Bollinger bands and a squashed MACD histogram
//!
//! Analysis is deterministic and only ever reads the bars it is handed, so a
//! window ending at `t` cannot see anything after `t`.

use crate::config::IndicatorConfig;
use crate::domain::Bar;
use crate::error::InsufficientDataError;
use crate::indicators::{last_defined, Adx, Atr, Bollinger, Indicator, Macd, Rsi, Sma};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of market conditions at the last bar of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    pub as_of: DateTime<Utc>,
    pub volatility: f64,
    pub trend_strength: f64,
    pub sentiment: f64,
    pub rsi: f64,
    pub adx: f64,
    pub current_price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionAnalyzer {
    config: IndicatorConfig,
}

impl ConditionAnalyzer {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Bars the window must hold for `analyze` to succeed.
    pub fn required_bars(&self) -> usize {
        self.config.required_bars()
    }

    /// Void bars inside the window are dropped before any indicator runs, so
    /// a single data gap costs one day rather than a whole window. A void
    /// last bar leaves nothing to price and is an error.
    pub fn analyze(&self, bars: &[Bar]) -> Result<MarketConditions, InsufficientDataError> {
        if bars.last().is_some_and(|b| b.is_void()) {
            return Err(InsufficientDataError::UndefinedIndicator {
                indicator: "close".to_string(),
            });
        }
        let gapless: Vec<Bar>;
        let bars = if bars.iter().any(|b| b.is_void()) {
            gapless = bars.iter().filter(|b| !b.is_void()).cloned().collect();
            gapless.as_slice()
        } else {
            bars
        };

        let required = self.required_bars();
        let Some(last_bar) = bars.last().filter(|_| bars.len() >= required) else {
            return Err(InsufficientDataError::TooFewBars {
                required,
                available: bars.len(),
            });
        };
        let cfg = &self.config;
        let current_price = defined(&[last_bar.close], "close")?;

        let rsi_ind = Rsi::new(cfg.rsi_period);
        let rsi = defined(&rsi_ind.compute(bars), rsi_ind.name())?;

        let adx_ind = Adx::new(cfg.adx_period);
        let directional = adx_ind.series(bars);
        let adx = defined(&directional.adx, adx_ind.name())?;
        let plus_di = defined(&directional.plus_di, "plus_di")?;
        let minus_di = defined(&directional.minus_di, "minus_di")?;

        let sma_fast_ind = Sma::new(cfg.sma_fast);
        let sma_slow_ind = Sma::new(cfg.sma_slow);
        let sma_fast = defined(&sma_fast_ind.compute(bars), sma_fast_ind.name())?;
        let sma_slow = defined(&sma_slow_ind.compute(bars), sma_slow_ind.name())?;

        let macd_ind = Macd::new(cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
        let histogram = defined(&macd_ind.compute(bars), macd_ind.name())?;

        let bb_ind = Bollinger::new(cfg.bollinger_period, cfg.bollinger_std);
        let bands = bb_ind.series(bars);
        let last = bars.len() - 1;

        // Volatility over the trailing window.
        let tail = bars.len() - cfg.volatility_window;
        let atr_ind = Atr::new(cfg.atr_period);
        let atr = atr_ind.compute(bars);
        let avg_atr = window_mean(&atr[tail..], atr_ind.name())?;
        let closes: Vec<f64> = bars[tail..].iter().map(|b| b.close).collect();
        let avg_close = window_mean(&closes, "close")?;
        let widths: Vec<f64> = (tail..bars.len()).map(|i| bands.width(i)).collect();
        let avg_width = window_mean(&widths, bb_ind.name())?;
        if avg_close <= 0.0 {
            return Err(InsufficientDataError::UndefinedIndicator {
                indicator: "close".to_string(),
            });
        }
        let volatility = ((avg_atr / avg_close + avg_width) / 2.0).clamp(0.0, 1.0);

        // Trend: strength from ADX, direction from a three-way vote.
        let vote = |bullish: bool| -> i32 { if bullish { 1 } else { -1 } };
        let votes = vote(plus_di > minus_di) + vote(sma_fast > sma_slow) + vote(histogram > 0.0);
        let direction = f64::from(votes.signum());
        let trend_strength = ((adx / 50.0).min(1.0) * direction).clamp(-1.0, 1.0);

        // Sentiment.
        let rsi_sentiment = (rsi - 50.0) / 50.0;
        let band_position = bands.position(last, current_price);
        let macd_sentiment = (histogram / 10.0).tanh();
        let sentiment = ((rsi_sentiment + band_position + macd_sentiment) / 3.0).clamp(-1.0, 1.0);

        Ok(MarketConditions {
            as_of: last_bar.timestamp,
            volatility,
            trend_strength,
            sentiment,
            rsi,
            adx,
            current_price,
        })
    }
}

fn defined(series: &[f64], name: &str) -> Result<f64, InsufficientDataError> {
    last_defined(series).ok_or_else(|| InsufficientDataError::UndefinedIndicator {
        indicator: name.to_string(),
    })
}

fn window_mean(values: &[f64], name: &str) -> Result<f64, InsufficientDataError> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return Err(InsufficientDataError::UndefinedIndicator {
            indicator: name.to_string(),
        });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}
