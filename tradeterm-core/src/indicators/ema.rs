//! Exponential moving averages.
//!
//! - [`ema_of_series`]: recursive, SMA-seeded. EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1],
//!   seeded with the mean of the first `period` defined values. Feeds MACD.
//! - [`EwmMean`]: span-adjusted weighted mean, defined from the first bar.
//!   y[t] = sum((1-alpha)^i * x[t-i]) / sum((1-alpha)^i). Feeds EMA5/EMA10.
//!
//! alpha = 2 / (period + 1) in both cases.

use super::Indicator;
use crate::domain::{closes, Bar};

/// SMA-seeded EMA of an arbitrary series.
///
/// Leading NaNs are skipped: the seed is the mean of the first `period`
/// values after the first finite one, so a derived series (the MACD line)
/// can be smoothed from its first defined value. A NaN after the seed
/// taints every later value.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }
    let start = match values.iter().position(|v| !v.is_nan()) {
        Some(s) => s,
        None => return result,
    };
    let seed_end = start + period;
    if seed_end > n {
        return result;
    }

    let window = &values[start..seed_end];
    if window.iter().any(|v| v.is_nan()) {
        return result;
    }
    let seed = window.iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in seed_end..n {
        if values[i].is_nan() {
            break;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}

/// Span-adjusted exponentially weighted mean of close.
#[derive(Debug, Clone)]
pub struct EwmMean {
    span: usize,
    name: String,
}

impl EwmMean {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EWM span must be >= 1");
        Self {
            span,
            name: format!("ewm_{span}"),
        }
    }
}

impl Indicator for EwmMean {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        ewm_adjusted(&closes(bars), self.span)
    }
}

/// Adjusted EWM: weights decay by (1 - alpha) per step back, normalized by
/// their sum. NaN inputs are skipped without resetting the weights.
pub fn ewm_adjusted(values: &[f64], span: usize) -> Vec<f64> {
    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut seen = false;

    values
        .iter()
        .map(|&x| {
            if seen {
                numerator *= decay;
                denominator *= decay;
            }
            if !x.is_nan() {
                numerator += x;
                denominator += 1.0;
                seen = true;
            }
            if seen {
                numerator / denominator
            } else {
                f64::NAN
            }
        })
        .collect()
}
