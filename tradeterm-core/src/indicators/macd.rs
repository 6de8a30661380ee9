//! MACD: Moving Average Convergence/Divergence.
//!
//! line = EMA(fast) - EMA(slow), signal = EMA(signal) of the line, started
//! from the line's first defined value. Each output is its own instance.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::{closes, Bar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdOutput,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdOutput) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must exceed fast period");
        let prefix = match output {
            MacdOutput::Line => "macd",
            MacdOutput::Signal => "macd_signal",
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("{prefix}_{fast}_{slow}_{signal}"),
        }
    }
}

/// Both MACD outputs for an arbitrary series.
pub fn macd_of_series(values: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>) {
    let fast_ema = ema_of_series(values, fast);
    let slow_ema = ema_of_series(values, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema_of_series(&line, signal);
    (line, signal_line)
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdOutput::Line => self.slow - 1,
            MacdOutput::Signal => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (line, signal) = macd_of_series(&closes(bars), self.fast, self.slow, self.signal);
        match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal => signal,
        }
    }
}
