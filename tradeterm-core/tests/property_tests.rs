//! Property tests for analytics invariants.
//!
//! Uses proptest to verify:
//! 1. Daily RSI stays within [0, 100]
//! 2. Labels see at most `lookahead` bars ahead; the tail stays unlabeled
//! 3. Canonical bars are sorted, unique by date and sane
//! 4. Forecast deviation is the absolute predicted return
//! 5. SMOTE balances every present class to the majority count

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tradeterm_core::classifier::labels::{make_labels, LabelConfig};
use tradeterm_core::classifier::smote::smote;
use tradeterm_core::data::Canonicalizer;
use tradeterm_core::domain::{is_strictly_ascending, Bar, HorizonForecast};
use tradeterm_core::indicators::{Indicator, Rsi};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, min..max)
}

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base + Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000,
        })
        .collect()
}

/// Raw rows with day offsets that may repeat, go backwards, or be invalid.
fn arb_raw_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((0..60i64, 1.0..500.0_f64, -0.05..0.05_f64, any::<bool>()), 1..80).prop_map(|rows| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        rows.into_iter()
            .map(|(day, price, skew, inverted)| {
                let (high, low) = if inverted { (price * 0.98, price * 1.02) } else { (price * 1.02, price * 0.98) };
                Bar {
                    date: base + Duration::days(day),
                    open: price,
                    high,
                    low,
                    close: price * (1.0 + skew / 10.0),
                    volume: 100,
                }
            })
            .collect()
    })
}

// ── 1. RSI bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(closes in arb_closes(20, 200)) {
        let bars = bars_from_closes(&closes);
        for v in Rsi::new(14).compute(&bars) {
            if v.is_finite() {
                prop_assert!((0.0..=100.0).contains(&v), "rsi out of range: {v}");
            }
        }
    }
}

// ── 2. Labels ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn label_tail_is_unlabeled(closes in arb_closes(5, 120), lookahead in 1usize..6) {
        let config = LabelConfig { lookahead, threshold: 0.02 };
        let labels = make_labels(&closes, &config);
        prop_assert_eq!(labels.len(), closes.len());
        let tail = lookahead.min(closes.len());
        prop_assert!(labels[closes.len() - tail..].iter().all(Option::is_none));
        prop_assert!(labels[..closes.len() - tail].iter().all(Option::is_some));
    }

    /// Changing closes beyond t + lookahead never changes the label at t.
    #[test]
    fn labels_ignore_the_far_future(
        closes in arb_closes(30, 120),
        replacement in 1.0..1000.0_f64,
        t in 0usize..20,
    ) {
        let config = LabelConfig::default();
        let cut = t + config.lookahead + 1;
        let mut altered = closes.clone();
        for c in altered.iter_mut().skip(cut) {
            *c = replacement;
        }
        let a = make_labels(&closes, &config);
        let b = make_labels(&altered, &config);
        prop_assert_eq!(a[t], b[t]);
    }
}

// ── 3. Canonicalization ──────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn canonical_bars_are_sorted_unique_and_sane(raw in arb_raw_bars()) {
        let (bars, report) = Canonicalizer::canonicalize(&raw).unwrap();
        prop_assert!(is_strictly_ascending(&bars));
        prop_assert!(bars.iter().all(Bar::is_sane));
        prop_assert_eq!(report.input, raw.len());
        prop_assert_eq!(bars.len() + report.invalid + report.duplicates, raw.len());
    }
}

// ── 4. Forecast record ───────────────────────────────────────────────

proptest! {
    #[test]
    fn deviation_is_absolute_return(predicted in 0.01..10_000.0_f64, latest in 0.01..10_000.0_f64) {
        let f = HorizonForecast::new(3, predicted, latest, 0.0, 0.0);
        prop_assert!(f.predicted_deviation_pct >= 0.0);
        prop_assert!((f.predicted_deviation_pct - f.predicted_return_pct.abs()).abs() < 1e-9);
    }
}

// ── 5. SMOTE ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn smote_balances_classes(
        rows in prop::collection::vec((prop::collection::vec(-5.0..5.0_f64, 3), 0usize..3), 3..60),
        seed in any::<u64>(),
    ) {
        let (x, y): (Vec<Vec<f64>>, Vec<usize>) = rows.into_iter().unzip();
        let (ox, oy) = smote(&x, &y, 5, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(ox.len(), oy.len());
        prop_assert_eq!(&ox[..x.len()], &x[..]);

        let count = |labels: &[usize], c: usize| labels.iter().filter(|&&l| l == c).count();
        let target = (0..3).map(|c| count(&y, c)).max().unwrap_or(0);
        for c in 0..3 {
            if count(&y, c) > 0 {
                prop_assert_eq!(count(&oy, c), target);
            } else {
                prop_assert_eq!(count(&oy, c), 0);
            }
        }
    }
}
