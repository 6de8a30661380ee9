//! Money Flow Index.
//!
//! Raw flow = typical price * volume. Over `period` bars, flow is positive
//! when the typical price rose against the previous bar and negative when it
//! fell. MFI = 100 - 100 / (1 + positive / negative).

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Mfi {
    period: usize,
    name: String,
}

impl Mfi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "MFI period must be >= 1");
        Self {
            period,
            name: format!("mfi_{period}"),
        }
    }
}

impl Indicator for Mfi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        // (positive, negative) flow per bar; index 0 has no previous bar.
        let flows: Vec<(f64, f64)> = std::iter::once((f64::NAN, f64::NAN))
            .chain(bars.windows(2).map(|w| {
                let prev = w[0].typical_price();
                let tp = w[1].typical_price();
                let raw = tp * w[1].volume as f64;
                if tp > prev {
                    (raw, 0.0)
                } else if tp < prev {
                    (0.0, raw)
                } else {
                    (0.0, 0.0)
                }
            }))
            .collect();

        for i in self.period..n {
            let window = &flows[i + 1 - self.period..=i];
            if window.iter().any(|(p, m)| p.is_nan() || m.is_nan()) {
                continue;
            }
            let positive: f64 = window.iter().map(|(p, _)| p).sum();
            let negative: f64 = window.iter().map(|(_, m)| m).sum();
            result[i] = mfi_value(positive, negative);
        }

        result
    }
}

fn mfi_value(positive: f64, negative: f64) -> f64 {
    if positive == 0.0 && negative == 0.0 {
        50.0
    } else if negative == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + positive / negative)
    }
}
