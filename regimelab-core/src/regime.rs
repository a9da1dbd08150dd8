//! Regime classification.

use crate::analysis::MarketConditions;
use crate::config::TradingConfig;
use crate::domain::Mode;

/// Classifies conditions into exactly one regime. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeSelector;

impl ModeSelector {
    /// First matching rule wins:
    ///
    /// 1. volatility above the high threshold is always Volatile
    /// 2. a strong up or down trend is Bull or Bear
    /// 3. otherwise moderate volatility is Volatile
    /// 4. otherwise the sign of the trend decides, ties going to Bear
    ///
    /// Rule 3 sits after the trend checks, so a strong trend with moderate
    /// volatility is classified by its trend.
    pub fn select(conditions: &MarketConditions, config: &TradingConfig) -> Mode {
        let vol = conditions.volatility;
        let trend = conditions.trend_strength;

        if vol > config.volatility_threshold_high {
            Mode::Volatile
        } else if trend > config.trend_strength_bull {
            Mode::Bull
        } else if trend < config.trend_strength_bear {
            Mode::Bear
        } else if vol > config.volatility_threshold_low {
            Mode::Volatile
        } else if trend > 0.0 {
            Mode::Bull
        } else {
            Mode::Bear
        }
    }
}
