//! Deterministic seed hierarchy.
//!
//! A master seed generates sub-seeds for each `(symbol, component)` pair.
//! Sub-seeds are derived via BLAKE3, independently of the order in which
//! symbols are analyzed, so a multi-symbol run gives the same results as
//! analyzing each symbol alone.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Randomized stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Oversampling,
    Boosting,
}

impl Component {
    fn tag(&self) -> &'static [u8] {
        match self {
            Component::Oversampling => b"oversampling",
            Component::Boosting => b"boosting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for one `(symbol, component)` pair.
    pub fn sub_seed(&self, symbol: &str, component: Component) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(&[0]);
        hasher.update(component.tag());
        let hash = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(word)
    }

    pub fn rng_for(&self, symbol: &str, component: Component) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(symbol, component))
    }
}
