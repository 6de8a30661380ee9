//! History and quote sources, canonicalization and the Parquet cache.

pub mod cache;
pub mod canonicalize;
pub mod csv_import;
pub mod provider;
pub mod yahoo;

pub use cache::{CacheMeta, CachedProvider, CoverageResult, ParquetCache};
pub use canonicalize::{CanonicalReport, Canonicalizer};
pub use csv_import::CsvProvider;
pub use provider::{DataError, DataProvider, DataSource, FetchResult, LiveQuote, QuoteSource};
pub use yahoo::{ProviderConfig, YahooProvider, YahooQuoteSource};
