//! Look-ahead contamination tests for the daily indicator set.
//!
//! Invariant: no indicator value at bar t may depend on price data from bar
//! t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..150) and the full series
//! (bars 0..300). Bars 0..150 must be identical between both runs.

use chrono::NaiveDate;
use tradeterm_core::domain::Bar;
use tradeterm_core::features::{build_enriched, IndicatorColumn, IndicatorConfig};
use tradeterm_core::indicators::*;

/// N calendar-day bars following a deterministic pseudo-random walk.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price += change;
        price = price.max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        let high = open.max(close) + 2.0;
        let low = open.min(close) - 2.0;

        bars.push(Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000 + (i as u64 * 100),
        });
    }

    bars
}

fn assert_same_prefix(name: &str, truncated: &[f64], full: &[f64], from: usize) {
    for i in from..truncated.len() {
        let (t, f) = (truncated[i], full[i]);
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{name}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{name}: look-ahead contamination at bar {i}: truncated={t}, full={f}, diff={}",
            (t - f).abs()
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let full_result = indicator.compute(full_bars);
    let truncated_result = indicator.compute(&full_bars[..truncated_len]);

    assert_eq!(truncated_result.len(), truncated_len, "{}: truncated length", indicator.name());
    assert_eq!(full_result.len(), full_bars.len(), "{}: full length", indicator.name());
    assert_same_prefix(indicator.name(), &truncated_result, &full_result, 0);
}

#[test]
fn lookahead_rsi() {
    let bars = make_test_bars(300);
    assert_no_lookahead(&Rsi::new(14), &bars, 150);
    assert_no_lookahead(&Rsi::new(7), &bars, 150);
}

#[test]
fn lookahead_macd() {
    let bars = make_test_bars(300);
    assert_no_lookahead(&Macd::new(12, 26, 9, MacdOutput::Line), &bars, 150);
    assert_no_lookahead(&Macd::new(12, 26, 9, MacdOutput::Signal), &bars, 150);
}

#[test]
fn lookahead_adx() {
    let bars = make_test_bars(300);
    assert_no_lookahead(&Adx::new(14), &bars, 150);
    assert_no_lookahead(&Adx::new(7), &bars, 150);
}

#[test]
fn lookahead_stochastic() {
    let bars = make_test_bars(300);
    assert_no_lookahead(&Stochastic::new(14, 3, 3, StochasticOutput::K), &bars, 150);
    assert_no_lookahead(&Stochastic::new(14, 3, 3, StochasticOutput::D), &bars, 150);
}

#[test]
fn lookahead_atr() {
    let bars = make_test_bars(300);
    assert_no_lookahead(&Atr::new(14), &bars, 150);
    assert_no_lookahead(&Atr::new(5), &bars, 150);
}

#[test]
fn lookahead_mfi() {
    let bars = make_test_bars(300);
    assert_no_lookahead(&Mfi::new(14), &bars, 150);
}

#[test]
fn lookahead_returns() {
    let bars = make_test_bars(300);
    assert_no_lookahead(&PctChange, &bars, 150);
    assert_no_lookahead(&LaggedReturn::new(1), &bars, 150);
    assert_no_lookahead(&LaggedReturn::new(5), &bars, 150);
    assert_no_lookahead(&ReturnVolatility::new(5), &bars, 150);
    assert_no_lookahead(&ReturnVolatility::new(10), &bars, 150);
}

#[test]
fn lookahead_ewm() {
    let bars = make_test_bars(300);
    assert_no_lookahead(&EwmMean::new(5), &bars, 150);
    assert_no_lookahead(&EwmMean::new(10), &bars, 150);
}

/// Past the warm-up, where back-filling no longer applies, the engine's daily
/// columns are as causal as the indicators underneath them.
#[test]
fn lookahead_enriched_daily_columns() {
    let bars = make_test_bars(500);
    let config = IndicatorConfig::default();
    let full = build_enriched(&bars, &config).unwrap();
    let truncated = build_enriched(&bars[..250], &config).unwrap();

    let daily = [
        IndicatorColumn::RsiDaily,
        IndicatorColumn::MacdDaily,
        IndicatorColumn::MacdSignalDaily,
        IndicatorColumn::Adx,
        IndicatorColumn::StochK,
        IndicatorColumn::StochD,
        IndicatorColumn::Atr,
        IndicatorColumn::Mfi,
        IndicatorColumn::Return,
        IndicatorColumn::Lag1,
        IndicatorColumn::Lag3,
        IndicatorColumn::Lag5,
        IndicatorColumn::Volatility05,
        IndicatorColumn::Volatility10,
        IndicatorColumn::Ema5,
        IndicatorColumn::Ema10,
    ];
    for column in daily {
        let t = truncated.values().get_series(column).unwrap();
        let f = full.values().get_series(column).unwrap();
        assert_same_prefix(column.as_str(), t, f, 60);
    }
}
