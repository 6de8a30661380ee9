//! Parquet history cache with Hive-style partitioning.
//!
//! Layout: `{cache_dir}/symbol={SYMBOL}/{year}.parquet` plus a `meta.json`
//! sidecar recording the date range the cache is known to cover.
//!
//! - Writes are atomic: each partition goes to `.tmp` and is renamed in.
//! - Loads validate the schema; a corrupt partition is quarantined
//!   (`{file}.quarantined`) and the load reports no cached data.

use super::canonicalize::{bars_to_dataframe, dataframe_to_bars, Canonicalizer};
use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;
use crate::fingerprint::DatasetHash;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    /// Range the upstream fetch asked for; bars may start later or end
    /// earlier when the market was closed.
    pub covered_start: NaiveDate,
    pub covered_end: NaiveDate,
    pub bar_count: usize,
    pub data_hash: DatasetHash,
    pub source: DataSource,
    pub cached_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoverageResult {
    NotCached,
    FullyCovered,
    PartiallyCovered {
        cached_start: NaiveDate,
        cached_end: NaiveDate,
    },
}

pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("symbol={}", symbol.to_uppercase()))
    }

    fn year_path(&self, symbol: &str, year: i32) -> PathBuf {
        self.symbol_dir(symbol).join(format!("{year}.parquet"))
    }

    fn meta_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join("meta.json")
    }

    /// Replace the cached history of `symbol` with `bars`, recorded as
    /// covering `[start, end]`.
    pub fn write(
        &self,
        symbol: &str,
        bars: &[Bar],
        start: NaiveDate,
        end: NaiveDate,
        source: DataSource,
    ) -> Result<(), DataError> {
        if bars.is_empty() {
            return Err(DataError::Cache("no bars to cache".into()));
        }

        let sym_dir = self.symbol_dir(symbol);
        fs::create_dir_all(&sym_dir)?;

        let mut by_year: BTreeMap<i32, Vec<Bar>> = BTreeMap::new();
        for bar in bars {
            by_year.entry(bar.date.year()).or_default().push(bar.clone());
        }

        for (year, year_bars) in &by_year {
            let mut df = bars_to_dataframe(year_bars)?;
            let path = self.year_path(symbol, *year);
            let tmp_path = path.with_extension("parquet.tmp");

            let file = fs::File::create(&tmp_path)?;
            ParquetWriter::new(file)
                .finish(&mut df)
                .map_err(|e| DataError::Parquet(format!("write {}: {e}", tmp_path.display())))?;

            fs::rename(&tmp_path, &path).map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                DataError::Cache(format!("atomic rename failed: {e}"))
            })?;
        }

        // Partitions for years no longer present are stale.
        for path in self.partitions(symbol)? {
            let year = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i32>().ok());
            if year.is_some_and(|y| !by_year.contains_key(&y)) {
                fs::remove_file(&path)?;
            }
        }

        let meta = CacheMeta {
            symbol: symbol.to_uppercase(),
            covered_start: start,
            covered_end: end,
            bar_count: bars.len(),
            data_hash: DatasetHash::of_bars(bars),
            source,
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::Cache(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(symbol), meta_json)?;

        debug!(symbol, bars = bars.len(), years = by_year.len(), "cache written");
        Ok(())
    }

    fn partitions(&self, symbol: &str) -> Result<Vec<PathBuf>, DataError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(self.symbol_dir(symbol))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("parquet") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every cached bar for `symbol`, ascending by date.
    pub fn load(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let not_cached = || DataError::NoData {
            symbol: symbol.to_string(),
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        };
        if !self.symbol_dir(symbol).exists() {
            return Err(not_cached());
        }

        let mut all_bars = Vec::new();
        for path in self.partitions(symbol)? {
            match load_partition(&path) {
                Ok(bars) => all_bars.extend(bars),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "quarantining corrupt cache file");
                    let _ = fs::rename(&path, path.with_extension("parquet.quarantined"));
                    // The covered range no longer holds.
                    let _ = fs::remove_file(self.meta_path(symbol));
                    return Err(not_cached());
                }
            }
        }

        if all_bars.is_empty() {
            return Err(not_cached());
        }
        all_bars.sort_by_key(|b| b.date);
        Ok(all_bars)
    }

    pub fn get_meta(&self, symbol: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(symbol)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// A range is covered when it lies inside the recorded range, or when
    /// the cache was written after `end` and already reaches back to `start`.
    pub fn covers_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> CoverageResult {
        match self.get_meta(symbol) {
            None => CoverageResult::NotCached,
            Some(meta) => {
                let reaches_end = meta.covered_end >= end || meta.cached_at.date() > end;
                if meta.covered_start <= start && reaches_end {
                    CoverageResult::FullyCovered
                } else {
                    CoverageResult::PartiallyCovered {
                        cached_start: meta.covered_start,
                        cached_end: meta.covered_end,
                    }
                }
            }
        }
    }
}

fn load_partition(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = fs::File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::Parquet(format!("read {}: {e}", path.display())))?;
    if df.height() == 0 {
        return Err(DataError::SchemaMismatch("empty parquet file".into()));
    }
    dataframe_to_bars(&df)
}

/// Serves history from the Parquet cache, fetching from `inner` on a miss.
///
/// A miss refetches the union of the cached and requested ranges so the
/// cache always holds one contiguous range.
pub struct CachedProvider<P> {
    inner: P,
    cache: ParquetCache,
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: ParquetCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ParquetCache {
        &self.cache
    }

    fn in_range(bars: Vec<Bar>, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        bars.into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect()
    }
}

impl<P: DataProvider> DataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        "parquet_cache"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let (fetch_start, fetch_end) = match self.cache.covers_range(symbol, start, end) {
            CoverageResult::FullyCovered => match self.cache.load(symbol) {
                Ok(bars) => {
                    let bars = Self::in_range(bars, start, end);
                    if bars.is_empty() {
                        return Err(DataError::NoData {
                            symbol: symbol.to_string(),
                            start,
                            end,
                        });
                    }
                    debug!(symbol, bars = bars.len(), "cache hit");
                    return Ok(FetchResult {
                        symbol: symbol.to_string(),
                        bars,
                        source: DataSource::Cache,
                    });
                }
                Err(e) => {
                    debug!(symbol, error = %e, "cache unreadable, refetching");
                    (start, end)
                }
            },
            CoverageResult::PartiallyCovered {
                cached_start,
                cached_end,
            } => (start.min(cached_start), end.max(cached_end)),
            CoverageResult::NotCached => (start, end),
        };

        let fetched = self.inner.fetch(symbol, fetch_start, fetch_end)?;
        let (bars, _) = Canonicalizer::canonicalize(&fetched.bars)?;
        if let Err(e) = self.cache.write(symbol, &bars, fetch_start, fetch_end, fetched.source) {
            warn!(symbol, error = %e, "cache write failed; continuing uncached");
        }

        let bars = Self::in_range(bars, start, end);
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
            source: fetched.source,
        })
    }
}
