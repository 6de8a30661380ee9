//! Close-to-close return features: the return itself, its lags and its
//! rolling volatility.

use super::Indicator;
use crate::domain::{closes, Bar};

/// Fractional change against the previous value. Index 0 is NaN.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(values.windows(2).map(|w| w[1] / w[0] - 1.0))
        .collect()
}

/// Shift a series forward by `lag` positions, padding the front with NaN.
pub fn shift(values: &[f64], lag: usize) -> Vec<f64> {
    let n = values.len();
    let pad = lag.min(n);
    let mut out = vec![f64::NAN; pad];
    out.extend_from_slice(&values[..n - pad]);
    out
}

/// Rolling sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window < 2 || n < window {
        return out;
    }
    for (i, w) in values.windows(window).enumerate() {
        if w.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = w.iter().sum::<f64>() / window as f64;
        let ss: f64 = w.iter().map(|v| (v - mean).powi(2)).sum();
        out[i + window - 1] = (ss / (window - 1) as f64).sqrt();
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct PctChange;

impl Indicator for PctChange {
    fn name(&self) -> &str {
        "return"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        pct_change(&closes(bars))
    }
}

#[derive(Debug, Clone)]
pub struct LaggedReturn {
    lag: usize,
    name: String,
}

impl LaggedReturn {
    pub fn new(lag: usize) -> Self {
        Self {
            lag,
            name: format!("return_lag_{lag}"),
        }
    }
}

impl Indicator for LaggedReturn {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.lag + 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        shift(&pct_change(&closes(bars)), self.lag)
    }
}

#[derive(Debug, Clone)]
pub struct ReturnVolatility {
    window: usize,
    name: String,
}

impl ReturnVolatility {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "volatility window must be >= 2");
        Self {
            window,
            name: format!("volatility_{window}"),
        }
    }
}

impl Indicator for ReturnVolatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_std(&pct_change(&closes(bars)), self.window)
    }
}
