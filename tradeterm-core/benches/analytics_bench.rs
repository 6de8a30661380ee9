//! Criterion benchmarks for TradeTerm hot paths.
//!
//! Benchmarks:
//! 1. Indicator Engine (daily set plus weekly/monthly resample and align)
//! 2. Signal classifier (labels, scaling, SMOTE, boosting, evaluation)
//! 3. Horizon forecaster (one SARIMA fit per horizon)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tradeterm_core::classifier::{ClassifierConfig, LabelConfig, SignalClassifier};
use tradeterm_core::domain::{closes, Bar};
use tradeterm_core::features::{build_enriched, IndicatorConfig};
use tradeterm_core::forecast::HorizonForecaster;

// ── Helpers ──────────────────────────────────────────────────────────

/// Weekday bars with a slow drift and a cycle, so every label class occurs.
fn make_bars(n: usize) -> Vec<Bar> {
    let mut date = chrono::NaiveDate::from_ymd_opt(2019, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        while matches!(chrono::Datelike::weekday(&date), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            date += chrono::Duration::days(1);
        }
        let close = 100.0 + i as f64 * 0.05 + (i as f64 * 0.3).sin() * 4.0;
        bars.push(Bar {
            date,
            open: close - 0.3,
            high: close + 1.5,
            low: close - 1.5,
            close,
            volume: 1_000_000 + (i as u64 % 500_000),
        });
        date += chrono::Duration::days(1);
    }
    bars
}

// ── 1. Indicator Engine ──────────────────────────────────────────────

fn bench_indicator_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_engine");
    let config = IndicatorConfig::default();

    for &bar_count in &[252, 730, 1260] {
        let bars = make_bars(bar_count);
        group.bench_with_input(BenchmarkId::new("build_enriched", bar_count), &bar_count, |b, _| {
            b.iter(|| build_enriched(black_box(&bars), black_box(&config)));
        });
    }

    group.finish();
}

// ── 2. Signal classifier ─────────────────────────────────────────────

fn bench_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_classifier");
    group.sample_size(10);

    let classifier = SignalClassifier::new(LabelConfig::default(), ClassifierConfig::default());
    for &bar_count in &[252, 730] {
        let series = match build_enriched(&make_bars(bar_count), &IndicatorConfig::default()) {
            Ok(series) => series,
            Err(e) => panic!("bench input rejected: {e}"),
        };
        group.bench_with_input(BenchmarkId::new("classify", bar_count), &bar_count, |b, _| {
            b.iter(|| classifier.classify(black_box(&series), "BENCH"));
        });
    }

    group.finish();
}

// ── 3. Horizon forecaster ────────────────────────────────────────────

fn bench_forecaster(c: &mut Criterion) {
    let mut group = c.benchmark_group("horizon_forecaster");
    group.sample_size(10);

    let forecaster = HorizonForecaster::default();
    for &bar_count in &[252, 730] {
        let series = closes(&make_bars(bar_count));
        group.bench_with_input(BenchmarkId::new("forecast_all", bar_count), &bar_count, |b, _| {
            b.iter(|| forecaster.forecast_all(black_box(&series)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_indicator_engine, bench_classifier, bench_forecaster);
criterion_main!(benches);
