//! Bollinger Bands: SMA(close) +/- multiplier * population stddev.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerSeries {
    /// Normalized band width `(upper - lower) / middle` at `i`.
    pub fn width(&self, i: usize) -> f64 {
        (self.upper[i] - self.lower[i]) / self.middle[i]
    }

    /// Where `price` sits relative to the bands at `i`, centred on the
    /// middle band: +0.5 at the upper band, -0.5 at the lower. Collapsed
    /// bands read as 0.
    pub fn position(&self, i: usize, price: f64) -> f64 {
        let span = self.upper[i] - self.lower[i];
        if span == 0.0 {
            0.0
        } else {
            (price - self.middle[i]) / span
        }
    }
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            name: format!("bollinger_{period}_{multiplier}"),
        }
    }

    pub fn series(&self, bars: &[Bar]) -> BollingerSeries {
        let n = bars.len();
        let mut out = BollingerSeries {
            upper: vec![f64::NAN; n],
            middle: vec![f64::NAN; n],
            lower: vec![f64::NAN; n],
        };
        if n < self.period {
            return out;
        }

        for i in (self.period - 1)..n {
            let window = &bars[i + 1 - self.period..=i];
            if window.iter().any(|b| b.close.is_nan()) {
                continue;
            }
            let mean = window.iter().map(|b| b.close).sum::<f64>() / self.period as f64;
            let variance = window
                .iter()
                .map(|b| (b.close - mean).powi(2))
                .sum::<f64>()
                / self.period as f64;
            let offset = self.multiplier * variance.sqrt();

            out.upper[i] = mean + offset;
            out.middle[i] = mean;
            out.lower[i] = mean - offset;
        }
        out
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    /// The middle band.
    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        self.series(bars).middle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn middle_is_sma_and_bands_symmetric() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let s = Bollinger::new(3, 2.0).series(&bars);

        assert!(s.middle[1].is_nan());
        assert_approx(s.middle[2], 11.0, DEFAULT_EPSILON);
        assert_approx(s.middle[3], 12.0, DEFAULT_EPSILON);
        for i in 2..5 {
            assert_approx(s.upper[i] - s.middle[i], s.middle[i] - s.lower[i], DEFAULT_EPSILON);
        }
        // Population stddev of (10, 11, 12) is sqrt(2/3).
        assert_approx(s.upper[2], 11.0 + 2.0 * (2.0f64 / 3.0).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn constant_price_collapses_bands() {
        let bars = make_bars(&[100.0; 4]);
        let s = Bollinger::new(3, 2.0).series(&bars);
        assert_approx(s.upper[3], 100.0, DEFAULT_EPSILON);
        assert_approx(s.lower[3], 100.0, DEFAULT_EPSILON);
        assert_eq!(s.width(3), 0.0);
        assert_eq!(s.position(3, 100.0), 0.0);
    }

    #[test]
    fn position_at_upper_band_is_half() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let s = Bollinger::new(3, 2.0).series(&bars);
        assert_approx(s.position(2, s.upper[2]), 0.5, DEFAULT_EPSILON);
        assert_approx(s.position(2, s.lower[2]), -0.5, DEFAULT_EPSILON);
    }

    #[test]
    fn nan_close_taints_window() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        bars[2].close = f64::NAN;
        let s = Bollinger::new(3, 2.0).series(&bars);
        assert!(s.upper[2].is_nan());
        assert!(s.upper[3].is_nan());
    }
}
