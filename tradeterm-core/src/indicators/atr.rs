//! Average True Range with Wilder smoothing.
//!
//! A day's true range is the widest of its own high-low span and the gaps
//! from the previous close to today's high and low. ATR smooths it with
//! alpha = 1/period, starting from the mean of the first full window.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range per bar. The first bar has no previous close, so its range is
/// the plain high-low span. A missing high, low or previous close gives NaN.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;
    bars.iter()
        .map(|bar| {
            let span = bar.high - bar.low;
            let range = match prev_close {
                _ if span.is_nan() => f64::NAN,
                Some(pc) if pc.is_nan() => f64::NAN,
                Some(pc) => span.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
                None => span,
            };
            prev_close = Some(bar.close);
            range
        })
        .collect()
}

/// Wilder smoothing with alpha = 1/period.
///
/// The seed is the mean of the first `period` consecutive defined values and
/// lands on the last of them. Once seeded, a NaN ends the series.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut run = 0;
    let Some(seed_at) = values.iter().position(|v| {
        run = if v.is_nan() { 0 } else { run + 1 };
        run == period
    }) else {
        return out;
    };

    let window = &values[seed_at + 1 - period..=seed_at];
    let mut level = window.iter().sum::<f64>() / period as f64;
    out[seed_at] = level;

    let alpha = 1.0 / period as f64;
    for (slot, &v) in out[seed_at + 1..].iter_mut().zip(&values[seed_at + 1..]) {
        if v.is_nan() {
            break;
        }
        level += alpha * (v - level);
        *slot = level;
    }
    out
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut ranges = true_range(bars);
        // The first range has no gap component; the window starts at bar 1.
        if let Some(first) = ranges.first_mut() {
            *first = f64::NAN;
        }
        wilder_smooth(&ranges, self.period)
    }
}
