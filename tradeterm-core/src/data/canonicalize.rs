//! Bar canonicalization on polars frames: validate, sort, dedupe.

use super::provider::DataError;
use crate::domain::Bar;
use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use tracing::debug;

/// Counts of what canonicalization removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanonicalReport {
    pub input: usize,
    pub invalid: usize,
    pub duplicates: usize,
}

pub struct Canonicalizer;

impl Canonicalizer {
    /// Drop invalid rows, sort ascending by date, keep the first row for a
    /// repeated date.
    pub fn canonicalize(bars: &[Bar]) -> Result<(Vec<Bar>, CanonicalReport), DataError> {
        let df = bars_to_dataframe(bars)?;
        let valid = Self::validate(df.lazy())
            .collect()
            .map_err(|e| DataError::Parquet(format!("validate: {e}")))?;
        let valid_rows = valid.height();
        let out = Self::sort_dedupe(valid.lazy())
            .collect()
            .map_err(|e| DataError::Parquet(format!("sort/dedupe: {e}")))?;

        let report = CanonicalReport {
            input: bars.len(),
            invalid: bars.len() - valid_rows,
            duplicates: valid_rows - out.height(),
        };
        if report.invalid > 0 || report.duplicates > 0 {
            debug!(?report, "canonicalization removed rows");
        }
        Ok((dataframe_to_bars(&out)?, report))
    }

    pub fn sort_dedupe(df: LazyFrame) -> LazyFrame {
        df.sort(["date"], SortMultipleOptions::default().with_maintain_order(true))
            .unique_stable(Some(vec!["date".into()]), UniqueKeepStrategy::First)
    }

    /// Positive prices with the high/low envelope containing open and close.
    /// NaN fails every comparison and is dropped with the rest.
    pub fn validate(df: LazyFrame) -> LazyFrame {
        df.filter(
            col("high")
                .gt_eq(col("low"))
                .and(col("open").gt(0.0))
                .and(col("low").gt(0.0))
                .and(col("close").gt(0.0))
                .and(col("open").gt_eq(col("low")))
                .and(col("open").lt_eq(col("high")))
                .and(col("close").gt_eq(col("low")))
                .and(col("close").lt_eq(col("high"))),
        )
    }
}

fn epoch() -> NaiveDate {
    DateTime::UNIX_EPOCH.date_naive()
}

/// Bars as a `date, open, high, low, close, volume` frame.
pub fn bars_to_dataframe(bars: &[Bar]) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch()).num_days() as i32)
        .collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Parquet(format!("date cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::Parquet(format!("dataframe creation: {e}")))
}

pub const BAR_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Inverse of [`bars_to_dataframe`]. A missing column or a wrong dtype is a
/// schema mismatch.
pub fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<Bar>, DataError> {
    let column = |name: &str| {
        df.column(name)
            .map_err(|_| DataError::SchemaMismatch(format!("missing column '{name}'")))
    };
    let dtype_err = |name: &str, e: PolarsError| DataError::SchemaMismatch(format!("{name} column type: {e}"));

    let date_ca = column("date")?.date().map_err(|e| dtype_err("date", e))?;
    let open_ca = column("open")?.f64().map_err(|e| dtype_err("open", e))?;
    let high_ca = column("high")?.f64().map_err(|e| dtype_err("high", e))?;
    let low_ca = column("low")?.f64().map_err(|e| dtype_err("low", e))?;
    let close_ca = column("close")?.f64().map_err(|e| dtype_err("close", e))?;
    let vol_ca = column("volume")?.u64().map_err(|e| dtype_err("volume", e))?;

    let mut bars = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::SchemaMismatch(format!("null date at row {i}")))?;
        bars.push(Bar {
            date: epoch() + chrono::Duration::days(days as i64),
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(0),
        });
    }
    Ok(bars)
}
