//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), first value at index `period`.
//! A window with no movement at all reads 50.

use super::Indicator;
use crate::domain::{closes, Bar};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rsi_of_series(&closes(bars), self.period)
    }
}

/// RSI over an arbitrary series. Used directly for resampled closes.
///
/// Leading NaNs are skipped; the seed is the first `period` finite changes.
/// A NaN after the seed taints the rest of the output.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return result;
    }

    let changes: Vec<f64> = std::iter::once(f64::NAN)
        .chain(values.windows(2).map(|w| w[1] - w[0]))
        .collect();

    let start = match changes.iter().position(|c| !c.is_nan()) {
        Some(s) => s,
        None => return result,
    };
    let seed_end = start + period;
    if seed_end > n || changes[start..seed_end].iter().any(|c| c.is_nan()) {
        return result;
    }

    let split = |ch: f64| (ch.max(0.0), (-ch).max(0.0));

    let (mut avg_gain, mut avg_loss) = changes[start..seed_end]
        .iter()
        .map(|&ch| split(ch))
        .fold((0.0, 0.0), |(g, l), (cg, cl)| (g + cg, l + cl));
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[seed_end - 1] = rsi_value(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for i in seed_end..n {
        if changes[i].is_nan() {
            break;
        }
        let (gain, loss) = split(changes[i]);
        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        result[i] = rsi_value(avg_gain, avg_loss);
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains() {
        let result = Rsi::new(3).compute(&make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]));
        assert_approx(result[3], 100.0, 1e-6);
        assert_approx(result[5], 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses() {
        let result = Rsi::new(3).compute(&make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]));
        assert_approx(result[3], 0.0, 1e-6);
    }

    #[test]
    fn rsi_known_seed_value() {
        // Changes: +0.34, -0.25, -0.48; avg_gain = 0.34/3, avg_loss = 0.73/3
        let result = Rsi::new(3).compute(&make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]));
        assert!(result[..3].iter().all(|v| v.is_nan()));
        let expected = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(result[3], expected, 1e-9);
    }

    #[test]
    fn rsi_flat_is_fifty() {
        let result = Rsi::new(14).compute(&make_bars(&[42.0; 30]));
        assert_approx(result[29], 50.0, 1e-12);
    }

    #[test]
    fn rsi_bounds() {
        let result = Rsi::new(3).compute(&make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]));
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_of_series_skips_leading_nan() {
        let values = [f64::NAN, f64::NAN, 1.0, 2.0, 3.0, 2.0];
        let result = rsi_of_series(&values, 2);
        assert!(result[3].is_nan());
        assert_approx(result[4], 100.0, 1e-12);
        assert!(result[5] < 100.0);
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
