//! Criterion benchmarks for RegimeLab hot paths.
//!
//! Benchmarks:
//! 1. Condition analysis over a trailing window
//! 2. Full decision cycle (analysis + regime + risk + strategy)
//! 3. Indicator batch over a long series

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::{Duration, TimeZone, Utc};
use regimelab_core::domain::{Bar, Mode, Position, Side};
use regimelab_core::indicators::{Adx, Atr, Bollinger, Indicator, Macd, Rsi, Sma};
use regimelab_core::{ConditionAnalyzer, DecisionEngine};

fn make_bars(n: usize) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2020, 1, 2, 21, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar::new(
                base + Duration::days(i as i64),
                open,
                close + 1.5,
                close - 1.5,
                close,
                1_000_000.0,
            )
        })
        .collect()
}

fn bench_analysis(c: &mut Criterion) {
    let analyzer = ConditionAnalyzer::default();
    let mut group = c.benchmark_group("analysis");
    for window in [50usize, 60, 250] {
        let bars = make_bars(window);
        group.bench_with_input(BenchmarkId::from_parameter(window), &bars, |b, bars| {
            b.iter(|| analyzer.analyze(black_box(bars)))
        });
    }
    group.finish();
}

fn bench_decision_cycle(c: &mut Criterion) {
    let analyzer = ConditionAnalyzer::default();
    let engine = DecisionEngine::default();
    let bars = make_bars(60);
    let position = Position::new(
        "BENCH",
        Side::Long,
        100.0,
        100.0,
        bars[0].timestamp,
        Mode::Bull,
    );

    c.bench_function("decision_cycle_flat", |b| {
        b.iter(|| {
            let conditions = analyzer.analyze(black_box(&bars)).ok()?;
            engine.decide("BENCH", &conditions, None, 100_000.0).ok()
        })
    });
    c.bench_function("decision_cycle_held", |b| {
        b.iter(|| {
            let conditions = analyzer.analyze(black_box(&bars)).ok()?;
            engine
                .decide("BENCH", &conditions, Some(&position), 100_000.0)
                .ok()
        })
    });
}

fn bench_indicators(c: &mut Criterion) {
    let bars = make_bars(5_000);
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(50)),
        Box::new(Rsi::new(14)),
        Box::new(Atr::new(14)),
        Box::new(Adx::new(14)),
        Box::new(Bollinger::new(20, 2.0)),
        Box::new(Macd::new(12, 26, 9)),
    ];
    let mut group = c.benchmark_group("indicators_5000");
    for ind in &indicators {
        group.bench_function(ind.name(), |b| b.iter(|| ind.compute(black_box(&bars))));
    }
    group.finish();
}

criterion_group!(benches, bench_analysis, bench_decision_cycle, bench_indicators);
criterion_main!(benches);
