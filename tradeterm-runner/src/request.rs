//! Pipeline request and history-window resolution.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("select a date range of at least {min_days} days (got {days})")]
    RangeTooShort { days: i64, min_days: i64 },

    #[error("range start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("lookback must be at least one day")]
    ZeroLookback,
}

/// How much history to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryWindow {
    /// Calendar days back from today.
    LookbackDays(u32),
    /// Explicit inclusive range.
    Range { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub symbol: String,
    pub window: HistoryWindow,
}

impl PipelineRequest {
    pub fn new(symbol: impl Into<String>, window: HistoryWindow) -> Self {
        Self {
            symbol: symbol.into(),
            window,
        }
    }

    /// Symbol trimmed and uppercased, as carried in the result record.
    pub fn normalized_symbol(&self) -> Result<String, RequestError> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(RequestError::EmptySymbol);
        }
        Ok(symbol)
    }

    /// Concrete `[start, end]` for the fetch. `today` is injected so the
    /// resolution is testable.
    pub fn resolve(&self, today: NaiveDate, min_range_days: i64) -> Result<(NaiveDate, NaiveDate), RequestError> {
        match self.window {
            HistoryWindow::LookbackDays(0) => Err(RequestError::ZeroLookback),
            HistoryWindow::LookbackDays(days) => Ok((today - Duration::days(days as i64), today)),
            HistoryWindow::Range { start, end } => {
                if start > end {
                    return Err(RequestError::InvertedRange { start, end });
                }
                let days = (end - start).num_days();
                if days < min_range_days {
                    return Err(RequestError::RangeTooShort {
                        days,
                        min_days: min_range_days,
                    });
                }
                Ok((start, end))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn lookback_counts_back_from_today() {
        let req = PipelineRequest::new("tcs", HistoryWindow::LookbackDays(30));
        assert_eq!(req.resolve(d(2024, 3, 31), 365).unwrap(), (d(2024, 3, 1), d(2024, 3, 31)));
    }

    #[test]
    fn range_of_exactly_365_days_is_accepted() {
        let req = PipelineRequest::new(
            "TCS",
            HistoryWindow::Range {
                start: d(2023, 1, 1),
                end: d(2024, 1, 1),
            },
        );
        assert!(req.resolve(d(2024, 6, 1), 365).is_ok());
    }

    #[test]
    fn short_range_is_rejected() {
        let req = PipelineRequest::new(
            "TCS",
            HistoryWindow::Range {
                start: d(2024, 1, 1),
                end: d(2024, 6, 30),
            },
        );
        assert_eq!(
            req.resolve(d(2024, 7, 1), 365).unwrap_err(),
            RequestError::RangeTooShort {
                days: 181,
                min_days: 365
            }
        );
    }

    #[test]
    fn inverted_range_and_zero_lookback() {
        let inverted = PipelineRequest::new(
            "TCS",
            HistoryWindow::Range {
                start: d(2024, 2, 1),
                end: d(2023, 1, 1),
            },
        );
        assert!(matches!(
            inverted.resolve(d(2024, 7, 1), 365),
            Err(RequestError::InvertedRange { .. })
        ));
        let zero = PipelineRequest::new("TCS", HistoryWindow::LookbackDays(0));
        assert_eq!(zero.resolve(d(2024, 7, 1), 365).unwrap_err(), RequestError::ZeroLookback);
    }

    #[test]
    fn symbol_normalization() {
        let req = PipelineRequest::new("  infy ", HistoryWindow::LookbackDays(1));
        assert_eq!(req.normalized_symbol().unwrap(), "INFY");
        let blank = PipelineRequest::new("   ", HistoryWindow::LookbackDays(1));
        assert_eq!(blank.normalized_symbol().unwrap_err(), RequestError::EmptySymbol);
    }
}
