//! Calendar resampling of daily bars into weekly and monthly bars.

use crate::domain::Bar;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    /// Monday to Sunday calendar weeks.
    Weekly,
    /// Calendar months.
    Monthly,
}

/// Identity of a calendar period: `(iso_year, iso_week)` or `(year, month)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    pub year: i32,
    pub index: u32,
}

impl Timeframe {
    pub fn key(&self, date: NaiveDate) -> PeriodKey {
        match self {
            Timeframe::Weekly => {
                let week = date.iso_week();
                PeriodKey {
                    year: week.year(),
                    index: week.week(),
                }
            }
            Timeframe::Monthly => PeriodKey {
                year: date.year(),
                index: date.month(),
            },
        }
    }

    /// Last calendar day of the period containing `date`.
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Timeframe::Weekly => {
                let to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
                date + Duration::days(to_sunday)
            }
            Timeframe::Monthly => {
                let (y, m) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                NaiveDate::from_ymd_opt(y, m, 1)
                    .map(|first| first - Duration::days(1))
                    .unwrap_or(date)
            }
        }
    }

    /// A period is closed when no weekday remains between `last_bar` and the
    /// period's calendar end.
    pub fn is_closed_after(&self, last_bar: NaiveDate) -> bool {
        let end = self.period_end(last_bar);
        last_bar
            .iter_days()
            .skip(1)
            .take_while(|d| *d <= end)
            .all(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
    }
}

/// Aggregate daily bars per period: open=first, high=max, low=min,
/// close=last, volume=sum. The bar is dated at the period's calendar end.
///
/// Periods with no bars never appear. The trailing period is dropped when it
/// is not closed. Input must be sorted by date.
pub fn resample(bars: &[Bar], timeframe: Timeframe) -> Vec<(PeriodKey, Bar)> {
    let mut out: Vec<(PeriodKey, Bar)> = Vec::new();

    for bar in bars {
        let key = timeframe.key(bar.date);
        match out.last_mut() {
            Some((last_key, agg)) if *last_key == key => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume = agg.volume.saturating_add(bar.volume);
            }
            _ => out.push((
                key,
                Bar {
                    date: timeframe.period_end(bar.date),
                    ..bar.clone()
                },
            )),
        }
    }

    if let Some(last) = bars.last() {
        if !timeframe.is_closed_after(last.date) {
            out.pop();
        }
    }

    out
}
