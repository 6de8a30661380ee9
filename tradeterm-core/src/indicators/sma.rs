//! Simple moving average of a derived series.
//!
//! Used to smooth intermediate series such as raw stochastic %K, which carry
//! a NaN warm-up of their own.

/// Rolling mean over `period` values. A window touching a NaN is NaN, so the
/// input's warm-up carries through and grows by `period - 1`.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }
    for (i, window) in values.windows(period).enumerate() {
        if window.iter().all(|v| !v.is_nan()) {
            out[i + period - 1] = window.iter().sum::<f64>() / period as f64;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rolling_mean() {
        let out = sma_of_series(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert!(out[0].is_nan() && out[1].is_nan());
        assert_approx(out[2], 2.0, DEFAULT_EPSILON);
        assert_approx(out[4], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn leading_nan_extends_warmup() {
        let out = sma_of_series(&[f64::NAN, 2.0, 4.0, 6.0], 2);
        assert!(out[0].is_nan() && out[1].is_nan());
        assert_approx(out[2], 3.0, DEFAULT_EPSILON);
        assert_approx(out[3], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn short_input_is_all_nan() {
        assert!(sma_of_series(&[1.0], 3).iter().all(|v| v.is_nan()));
    }
}
