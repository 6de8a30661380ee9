//! Alignment of period-level values onto the daily timeline, and gap fill.
//!
//! Each daily row carries its period key; the period's single value is
//! left-joined onto every row of that period. Rows whose period has no
//! value (warm-up, dropped trailing period) get NaN and are handled by
//! [`fill_gaps`].

use super::resample::{PeriodKey, Timeframe};
use crate::domain::Bar;
use std::collections::HashMap;

/// Left-join `period_values` (one per resampled period, same order as
/// `periods`) onto `daily`.
pub fn align_to_daily(
    daily: &[Bar],
    timeframe: Timeframe,
    periods: &[PeriodKey],
    period_values: &[f64],
) -> Vec<f64> {
    let lookup: HashMap<PeriodKey, f64> = periods
        .iter()
        .copied()
        .zip(period_values.iter().copied())
        .collect();

    daily
        .iter()
        .map(|bar| {
            lookup
                .get(&timeframe.key(bar.date))
                .copied()
                .unwrap_or(f64::NAN)
        })
        .collect()
}

/// Back-fill each NaN from the next finite value, then forward-fill what
/// remains from the previous finite value.
pub fn fill_gaps(values: &mut [f64]) {
    let mut next = f64::NAN;
    for v in values.iter_mut().rev() {
        if v.is_finite() {
            next = *v;
        } else {
            *v = next;
        }
    }

    let mut prev = f64::NAN;
    for v in values.iter_mut() {
        if v.is_finite() {
            prev = *v;
        } else {
            *v = prev;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::resample::resample;
    use chrono::NaiveDate;

    fn bar(date: &str, close: f64) -> Bar {
        Bar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn weekly_value_repeats_on_every_day_of_week() {
        let daily = vec![
            bar("2024-01-02", 1.0),
            bar("2024-01-04", 2.0),
            bar("2024-01-09", 3.0),
            bar("2024-01-12", 4.0),
        ];
        let weeks = resample(&daily, Timeframe::Weekly);
        let keys: Vec<PeriodKey> = weeks.iter().map(|(k, _)| *k).collect();
        let closes: Vec<f64> = weeks.iter().map(|(_, b)| b.close).collect();

        let aligned = align_to_daily(&daily, Timeframe::Weekly, &keys, &closes);
        assert_eq!(aligned, vec![2.0, 2.0, 4.0, 4.0]);
    }

    #[test]
    fn missing_period_is_nan() {
        let daily = vec![bar("2024-01-02", 1.0), bar("2024-01-10", 2.0)];
        let keys = vec![Timeframe::Weekly.key(daily[0].date)];
        let aligned = align_to_daily(&daily, Timeframe::Weekly, &keys, &[7.0]);
        assert_eq!(aligned[0], 7.0);
        assert!(aligned[1].is_nan());
    }

    #[test]
    fn fill_backward_then_forward() {
        let mut v = vec![f64::NAN, f64::NAN, 1.0, f64::NAN, 3.0, f64::NAN];
        fill_gaps(&mut v);
        assert_eq!(v, vec![1.0, 1.0, 1.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn fill_all_nan_stays_nan() {
        let mut v = vec![f64::NAN; 3];
        fill_gaps(&mut v);
        assert!(v.iter().all(|x| x.is_nan()));
    }
}
