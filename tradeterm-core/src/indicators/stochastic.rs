//! Stochastic oscillator (slow form).
//!
//! raw %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over `k`
//! bars; %K = SMA(smooth_k) of raw %K; %D = SMA(d) of %K. A window whose
//! high equals its low reads 50.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticOutput {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k: usize,
    smooth_k: usize,
    d: usize,
    output: StochasticOutput,
    name: String,
}

impl Stochastic {
    pub fn new(k: usize, smooth_k: usize, d: usize, output: StochasticOutput) -> Self {
        assert!(k >= 1 && smooth_k >= 1 && d >= 1, "Stochastic periods must be >= 1");
        let prefix = match output {
            StochasticOutput::K => "stoch_k",
            StochasticOutput::D => "stoch_d",
        };
        Self {
            k,
            smooth_k,
            d,
            output,
            name: format!("{prefix}_{k}_{smooth_k}_{d}"),
        }
    }

    fn raw_k(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut raw = vec![f64::NAN; n];
        if n < self.k {
            return raw;
        }
        for (i, window) in bars.windows(self.k).enumerate() {
            let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let close = window[self.k - 1].close;
            if !highest.is_finite() || !lowest.is_finite() || close.is_nan() {
                continue;
            }
            let range = highest - lowest;
            raw[i + self.k - 1] = if range == 0.0 {
                50.0
            } else {
                100.0 * (close - lowest) / range
            };
        }
        raw
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let k_lookback = self.k + self.smooth_k - 2;
        match self.output {
            StochasticOutput::K => k_lookback,
            StochasticOutput::D => k_lookback + self.d - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let k = sma_of_series(&self.raw_k(bars), self.smooth_k);
        match self.output {
            StochasticOutput::K => k,
            StochasticOutput::D => sma_of_series(&k, self.d),
        }
    }
}
