//! History loading for the pipeline: fetch, then canonicalize.
//!
//! The provider is chosen by the caller (chart API, CSV, cache, synthetic).
//! Whatever it returns is validated, sorted and deduplicated here, so the
//! analytics always see strictly ascending, sane bars.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};
use tradeterm_core::data::{CanonicalReport, Canonicalizer, DataError, DataProvider, DataSource, FetchResult};
use tradeterm_core::domain::Bar;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no valid bars for '{symbol}' after canonicalization ({invalid} invalid rows dropped)")]
    NoValidBars { symbol: String, invalid: usize },
}

#[derive(Debug, Clone)]
pub struct LoadedHistory {
    pub bars: Vec<Bar>,
    pub source: DataSource,
    pub report: CanonicalReport,
}

pub fn load_history(
    provider: &dyn DataProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<LoadedHistory, LoadError> {
    let fetched = provider.fetch(symbol, start, end)?;
    let (bars, report) = Canonicalizer::canonicalize(&fetched.bars)?;
    if report.invalid > 0 {
        warn!(symbol, invalid = report.invalid, "dropped invalid bars");
    }
    if bars.is_empty() {
        return Err(LoadError::NoValidBars {
            symbol: symbol.to_string(),
            invalid: report.invalid,
        });
    }
    debug!(symbol, provider = provider.name(), bars = bars.len(), "history loaded");
    Ok(LoadedHistory {
        bars,
        source: fetched.source,
        report,
    })
}

/// Seeded random walk on weekdays, for offline runs and tests.
///
/// The walk for a symbol depends only on the symbol and the seed, never on
/// the requested range, so overlapping requests agree.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    /// Mean daily return.
    pub drift: f64,
    /// Half-width of the uniform daily shock.
    pub shock: f64,
    /// First day of every walk.
    pub origin: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            drift: 0.0003,
            shock: 0.02,
            origin: NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or_default(),
        }
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.to_uppercase().as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    pub fn generate(&self, symbol: &str, end: NaiveDate) -> Vec<Bar> {
        let mut rng = self.rng_for(symbol);
        let mut price = 100.0_f64;
        let mut bars = Vec::new();

        for date in self.origin.iter_days().take_while(|d| *d <= end) {
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            let daily_return = self.drift + rng.gen_range(-self.shock..=self.shock);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume: rng.gen_range(500_000..5_000_000u64),
            });
            price = close;
        }
        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let bars: Vec<Bar> = self
            .generate(symbol, end)
            .into_iter()
            .filter(|b| b.date >= start)
            .collect();
        if bars.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }
}
