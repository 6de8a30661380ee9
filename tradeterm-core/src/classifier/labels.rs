//! Forward-looking labels.
//!
//! For bar t, the label looks at closes t+1..=t+lookahead only. The last
//! `lookahead` bars cannot see a full window and stay unlabeled.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Bars ahead inspected for each label.
    pub lookahead: usize,
    /// Fractional move that counts as a BUY or SELL opportunity.
    pub threshold: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            lookahead: 3,
            threshold: 0.02,
        }
    }
}

/// Class per bar: `Some(1)` buy, `Some(-1)` sell, `Some(0)` hold, `None`
/// for the unlabeled tail (or a window touching a non-finite close).
pub fn make_labels(closes: &[f64], config: &LabelConfig) -> Vec<Option<i8>> {
    let n = closes.len();
    let h = config.lookahead;

    (0..n)
        .map(|t| {
            if h == 0 || t + h >= n {
                return None;
            }
            let close = closes[t];
            let window = &closes[t + 1..=t + h];
            if !close.is_finite() || close == 0.0 || window.iter().any(|c| !c.is_finite()) {
                return None;
            }
            let future_max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let future_min = window.iter().copied().fold(f64::INFINITY, f64::min);
            let future_return = (future_max - close) / close;
            let future_loss = (future_min - close) / close;

            Some(if future_return > config.threshold {
                1
            } else if future_loss < -config.threshold {
                -1
            } else {
                0
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_sell_hold() {
        let closes = [100.0, 103.0, 100.0, 100.0, 97.0, 97.5, 97.0, 96.9];
        let labels = make_labels(&closes, &LabelConfig::default());
        // t=0: max(103, 100, 100) = +3% -> buy
        assert_eq!(labels[0], Some(1));
        // t=1: min(100, 100, 97) vs 103 -> about -5.8% -> sell
        assert_eq!(labels[1], Some(-1));
        // t=4: window 97.5, 97, 96.9 -> within 2% -> hold
        assert_eq!(labels[4], Some(0));
    }

    #[test]
    fn buy_wins_over_sell() {
        let closes = [100.0, 103.0, 97.0, 100.0];
        assert_eq!(make_labels(&closes, &LabelConfig::default())[0], Some(1));
    }

    #[test]
    fn tail_is_unlabeled() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let labels = make_labels(&closes, &LabelConfig::default());
        assert!(labels[..7].iter().all(Option::is_some));
        assert!(labels[7..].iter().all(Option::is_none));
    }

    #[test]
    fn exact_threshold_is_hold() {
        let closes = [100.0, 102.0, 101.0, 100.0];
        assert_eq!(make_labels(&closes, &LabelConfig::default())[0], Some(0));
    }
}
