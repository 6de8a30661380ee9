//! Run fingerprinting: deterministic identity of a pipeline run.
//!
//! - `DatasetHash`: content hash of the canonical bars.
//! - `ConfigHash`: hash of the serialized analysis configuration.
//! - `RunFingerprint`: both hashes plus the seed; `key()` is the identity a
//!   fitted-model cache would be keyed on.

use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// BLAKE3 hex digest of canonical bars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    /// Hashes the exact bit patterns, so any change to a price flips the hash.
    pub fn of_bars(bars: &[Bar]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for bar in bars {
            hasher.update(bar.date.to_string().as_bytes());
            for value in [bar.open, bar.high, bar.low, bar.close] {
                hasher.update(&value.to_le_bytes());
            }
            hasher.update(&bar.volume.to_le_bytes());
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// BLAKE3 hex digest of a serialized configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    /// Config structs serialize with fixed field order, so the JSON text is
    /// canonical.
    pub fn of<T: Serialize>(config: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_vec(config)?;
        Ok(Self(blake3::hash(&json).to_hex().to_string()))
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub dataset_hash: DatasetHash,
    pub config_hash: ConfigHash,
    pub seed: u64,
    pub bar_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl RunFingerprint {
    pub fn new(bars: &[Bar], config_hash: ConfigHash, seed: u64) -> Self {
        Self {
            dataset_hash: DatasetHash::of_bars(bars),
            config_hash,
            seed,
            bar_count: bars.len(),
            first_date: bars.first().map(|b| b.date),
            last_date: bars.last().map(|b| b.date),
        }
    }

    /// Combined identity of dataset, configuration and seed.
    pub fn key(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.dataset_hash.0.as_bytes());
        hasher.update(b":");
        hasher.update(self.config_hash.0.as_bytes());
        hasher.update(b":");
        hasher.update(&self.seed.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
