//! ADX (Wilder's Average Directional Index) with its directional lines.
//!
//! 1. +DM / -DM from consecutive highs and lows
//! 2. Wilder-smooth +DM, -DM and TR
//! 3. +DI = 100 * sm(+DM) / sm(TR), -DI likewise
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = Wilder-smoothed DX
//!
//! First ADX value lands at index 2 * period - 1.

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

/// ADX together with the +DI / -DI lines it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalSeries {
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub adx: Vec<f64>,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }

    pub fn series(&self, bars: &[Bar]) -> DirectionalSeries {
        let n = bars.len();
        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];

        for (i, pair) in bars.windows(2).enumerate() {
            let (prev, cur) = (&pair[0], &pair[1]);
            let up = cur.high - prev.high;
            let down = prev.low - cur.low;
            if up.is_nan() || down.is_nan() {
                continue;
            }
            plus_dm[i + 1] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i + 1] = if down > up && down > 0.0 { down } else { 0.0 };
        }

        let smooth_tr = wilder_smooth(&true_range(bars), self.period);
        let smooth_plus = wilder_smooth(&plus_dm, self.period);
        let smooth_minus = wilder_smooth(&minus_dm, self.period);

        let mut plus_di = vec![f64::NAN; n];
        let mut minus_di = vec![f64::NAN; n];
        let mut dx = vec![f64::NAN; n];
        for i in 0..n {
            let (tr, p, m) = (smooth_tr[i], smooth_plus[i], smooth_minus[i]);
            if tr.is_nan() || p.is_nan() || m.is_nan() {
                continue;
            }
            // A bar series with no range at all has no direction.
            let (pdi, mdi) = if tr == 0.0 {
                (0.0, 0.0)
            } else {
                (100.0 * p / tr, 100.0 * m / tr)
            };
            plus_di[i] = pdi;
            minus_di[i] = mdi;
            let sum = pdi + mdi;
            dx[i] = if sum == 0.0 {
                0.0
            } else {
                100.0 * (pdi - mdi).abs() / sum
            };
        }

        DirectionalSeries {
            plus_di,
            minus_di,
            adx: wilder_smooth(&dx, self.period),
        }
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        self.series(bars).adx
    }
}
