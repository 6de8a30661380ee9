//! Data provider traits and structured error types.
//!
//! `DataProvider` abstracts over history sources (Yahoo chart API, CSV file,
//! Parquet cache) so the pipeline can swap them and tests can mock them.
//! `QuoteSource` is the separate, best-effort live quote lookup.

use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured errors for every data operation.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no data for '{symbol}' between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("provider configuration: {0}")]
    Configuration(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful history fetch for one symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Where the bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Cache,
    Synthetic,
}

/// History source for daily OHLCV bars.
///
/// Providers return bars as delivered; canonicalization happens above this
/// trait, as does caching.
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Daily bars for `symbol` over `[start, end]`.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError>;
}

/// Snapshot of the current trading session. Every field is optional
/// because sources routinely omit some of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuote {
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub last_price: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<u64>,
    pub high52: Option<f64>,
    pub low52: Option<f64>,
}

pub trait QuoteSource: Send + Sync {
    fn quote(&self, symbol: &str) -> Result<LiveQuote, DataError>;
}
