//! Property tests for request resolution and configuration round-trips.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use tradeterm_runner::{HistoryWindow, PipelineConfig, PipelineRequest, RequestError};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

proptest! {
    /// Ranges are accepted exactly when they span the minimum.
    #[test]
    fn range_accepted_iff_long_enough(offset in 0i64..3000, span in 0i64..1000) {
        let start = base() + Duration::days(offset);
        let end = start + Duration::days(span);
        let request = PipelineRequest::new("INFY", HistoryWindow::Range { start, end });
        let resolved = request.resolve(base(), 365);
        if span >= 365 {
            prop_assert_eq!(resolved, Ok((start, end)));
        } else {
            prop_assert_eq!(resolved, Err(RequestError::RangeTooShort { days: span, min_days: 365 }));
        }
    }

    /// A lookback always ends today and spans exactly the requested days.
    #[test]
    fn lookback_ends_today(days in 1u32..5000, offset in 0i64..5000) {
        let today = base() + Duration::days(offset);
        let request = PipelineRequest::new("INFY", HistoryWindow::LookbackDays(days));
        let (start, end) = request.resolve(today, 365).unwrap();
        prop_assert_eq!(end, today);
        prop_assert_eq!((end - start).num_days(), days as i64);
    }

    #[test]
    fn symbol_normalization_is_idempotent(symbol in "[ a-zA-Z0-9.&-]{1,12}") {
        let request = PipelineRequest::new(symbol, HistoryWindow::LookbackDays(730));
        if let Ok(normalized) = request.normalized_symbol() {
            let again = PipelineRequest::new(normalized.clone(), HistoryWindow::LookbackDays(730));
            prop_assert_eq!(again.normalized_symbol(), Ok(normalized));
        }
    }

    /// Any valid tuning survives a TOML round trip unchanged.
    #[test]
    fn config_toml_round_trip(
        threshold in 0.001..0.2_f64,
        lookahead in 1usize..10,
        seed in 0u64..(i64::MAX as u64),
        lookback in 1u32..4000,
    ) {
        let mut config = PipelineConfig::default();
        config.labels.threshold = threshold;
        config.labels.lookahead = lookahead;
        config.classifier.seed = seed;
        config.history.default_lookback_days = lookback;

        let text = config.to_toml().unwrap();
        prop_assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }
}
