//! Look-ahead contamination tests for indicators and the analyzer.
//!
//! Invariant: no value at bar t may depend on price data from bar t+1 or later.
//!
//! Method: compute on a truncated series and on the full series (optionally
//! with a sentinel spike right after the cut) and assert every value up to the
//! cut is identical.

use chrono::{Duration, TimeZone, Utc};
use regimelab_core::domain::Bar;
use regimelab_core::indicators::*;
use regimelab_core::ConditionAnalyzer;

/// Deterministic pseudo-random walk.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
    let mut price: f64 = 100.0;
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((seed % 200) as f64 - 100.0) * 0.05;
            price = (price + change).max(10.0);
            let open = price - 0.5;
            let close = price + 0.3;
            Bar::new(
                base + Duration::days(i as i64),
                open,
                open.max(close) + 2.0,
                open.min(close) - 2.0,
                close,
                1_000.0 + i as f64 * 100.0,
            )
        })
        .collect()
}

/// Turn bar `i` into an absurd spike.
fn spike(bars: &mut [Bar], i: usize) {
    let b = &mut bars[i];
    b.open *= 10.0;
    b.close *= 10.0;
    b.high = b.open.max(b.close) * 1.5;
    b.low *= 0.1;
}

fn assert_prefix_equal(name: &str, full: &[f64], truncated: &[f64]) {
    for (i, (a, b)) in full.iter().zip(truncated).enumerate() {
        if b.is_nan() {
            assert!(a.is_nan(), "{name}: defined on full series but not truncated at {i}");
        } else {
            assert!(
                (a - b).abs() < 1e-10,
                "{name}: look-ahead at bar {i}: full={a}, truncated={b}"
            );
        }
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full: &[Bar], cut: usize) {
    let truncated = indicator.compute(&full[..cut]);
    assert_eq!(truncated.len(), cut);
    assert_prefix_equal(indicator.name(), &indicator.compute(full), &truncated);
}

#[test]
fn single_series_indicators() {
    let mut bars = make_test_bars(200);
    spike(&mut bars, 100);
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(20)),
        Box::new(Sma::new(50)),
        Box::new(Ema::new(12)),
        Box::new(Rsi::new(14)),
        Box::new(Atr::new(14)),
        Box::new(Adx::new(14)),
        Box::new(Bollinger::new(20, 2.0)),
        Box::new(Macd::new(12, 26, 9)),
    ];
    for ind in &indicators {
        assert_no_lookahead(ind.as_ref(), &bars, 100);
    }
}

#[test]
fn multi_series_indicators() {
    let mut bars = make_test_bars(200);
    spike(&mut bars, 120);
    let cut = 120;

    let adx = Adx::new(14);
    let (full, trunc) = (adx.series(&bars), adx.series(&bars[..cut]));
    assert_prefix_equal("plus_di", &full.plus_di, &trunc.plus_di);
    assert_prefix_equal("minus_di", &full.minus_di, &trunc.minus_di);

    let bb = Bollinger::new(20, 2.0);
    let (full, trunc) = (bb.series(&bars), bb.series(&bars[..cut]));
    assert_prefix_equal("bb_upper", &full.upper, &trunc.upper);
    assert_prefix_equal("bb_lower", &full.lower, &trunc.lower);

    let macd = Macd::new(12, 26, 9);
    let (full, trunc) = (macd.series(&bars), macd.series(&bars[..cut]));
    assert_prefix_equal("macd_line", &full.line, &trunc.line);
    assert_prefix_equal("macd_signal", &full.signal, &trunc.signal);
}

#[test]
fn analyzer_ignores_bars_after_window() {
    let clean = make_test_bars(150);
    let mut spiked = clean.clone();
    spike(&mut spiked, 100);

    let analyzer = ConditionAnalyzer::default();
    for t in 60..100 {
        let a = analyzer.analyze(&clean[t - 59..=t]).unwrap();
        let b = analyzer.analyze(&spiked[t - 59..=t]).unwrap();
        assert_eq!(a, b, "conditions at bar {t} changed");
    }
}
