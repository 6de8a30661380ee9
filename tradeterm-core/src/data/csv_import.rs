//! CSV history import, the offline fallback for the chart API.
//!
//! Expects yfinance-style files: `Date,Open,High,Low,Close,Volume` with an
//! optional `Adj Close` column, which is ignored. The provider points at
//! either a single file or a directory holding `{SYMBOL}.csv` files.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    /// Some exports write volume as a float.
    #[serde(rename = "Volume")]
    volume: f64,
}

/// Accepts `2024-01-02` and `2024-01-02 00:00:00+05:30` style dates.
fn parse_date(raw: &str) -> Result<NaiveDate, DataError> {
    let head = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map_err(|e| DataError::SchemaMismatch(format!("bad date '{raw}': {e}")))
}

/// Read every bar in a CSV file, in file order.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DataError::SchemaMismatch(format!("{}: {e}", path.display())))?;
    let mut bars = Vec::new();
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| {
            DataError::SchemaMismatch(format!("{} row {}: {e}", path.display(), line + 1))
        })?;
        bars.push(Bar {
            date: parse_date(&row.date)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: if row.volume.is_finite() && row.volume > 0.0 {
                row.volume.round() as u64
            } else {
                0
            },
        });
    }
    Ok(bars)
}

/// History provider over local CSV files.
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn file_for(&self, symbol: &str) -> Result<PathBuf, DataError> {
        if self.path.is_file() {
            return Ok(self.path.clone());
        }
        [symbol.to_string(), symbol.to_uppercase()]
            .iter()
            .map(|s| self.path.join(format!("{s}.csv")))
            .find(|p| p.is_file())
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let file = self.file_for(symbol)?;
        let bars: Vec<Bar> = read_bars(&file)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        debug!(symbol, file = %file.display(), bars = bars.len(), "csv history loaded");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }
}
