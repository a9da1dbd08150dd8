//! MACD: EMA(fast) - EMA(slow), its EMA signal line and the histogram.
//!
//! The histogram is first defined at index `slow + signal - 2`.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_{fast}_{slow}_{signal}"),
        }
    }

    pub fn series(&self, bars: &[Bar]) -> MacdSeries {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);

        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&line, self.signal);
        let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

        MacdSeries {
            line,
            signal,
            histogram,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    /// The histogram.
    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        self.series(bars).histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn histogram_first_defined_at_lookback() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let macd = Macd::new(3, 5, 2);
        let hist = macd.compute(&make_bars(&closes));
        assert_eq!(macd.lookback(), 5);
        assert!(hist[..5].iter().all(|v| v.is_nan()));
        assert!(!hist[5].is_nan());
    }

    #[test]
    fn linear_ramp_has_constant_line() {
        // On a linear ramp both EMAs lag by a constant, so the line settles
        // and the histogram decays towards zero.
        let closes: Vec<f64> = (0..200).map(|i| 50.0 + 0.5 * i as f64).collect();
        let s = Macd::new(12, 26, 9).series(&make_bars(&closes));
        let last = closes.len() - 1;
        // lag of EMA(p) on slope k is k * (p - 1) / 2
        assert_approx(s.line[last], 0.5 * (25.0 - 11.0) / 2.0, 1e-6);
        assert!(s.histogram[last].abs() < 1e-6);
    }

    #[test]
    fn line_is_fast_minus_slow() {
        let closes = [10.0, 12.0, 11.0, 13.0, 15.0, 14.0];
        let bars = make_bars(&closes);
        let s = Macd::new(2, 3, 2).series(&bars);
        let fast = ema_of_series(&closes, 2);
        let slow = ema_of_series(&closes, 3);
        assert!(s.line[1].is_nan());
        for i in 2..closes.len() {
            assert_approx(s.line[i], fast[i] - slow[i], DEFAULT_EPSILON);
        }
    }
}
