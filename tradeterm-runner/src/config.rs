//! Pipeline configuration, loadable from TOML.
//!
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! overrides and an empty file yields the built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tradeterm_core::classifier::{ClassifierConfig, LabelConfig};
use tradeterm_core::data::ProviderConfig;
use tradeterm_core::features::IndicatorConfig;
use tradeterm_core::fingerprint::ConfigHash;
use tradeterm_core::forecast::ForecastConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Request defaults that are not part of any analytics component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Calendar days fetched when a request gives neither a lookback nor a
    /// range.
    pub default_lookback_days: u32,
    /// Shortest explicit date range accepted.
    pub min_range_days: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_lookback_days: 730,
            min_range_days: 365,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub history: HistoryConfig,
    pub indicators: IndicatorConfig,
    pub labels: LabelConfig,
    pub classifier: ClassifierConfig,
    pub forecast: ForecastConfig,
    pub provider: ProviderConfig,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.indicators.min_bars == 0 {
            return invalid("indicators.min_bars must be at least 1");
        }
        self.indicators
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("indicators: {e}")))?;
        if self.labels.lookahead == 0 {
            return invalid("labels.lookahead must be at least 1");
        }
        if !(self.labels.threshold.is_finite() && self.labels.threshold >= 0.0) {
            return invalid("labels.threshold must be a non-negative number");
        }
        let fraction = self.classifier.train_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return invalid("classifier.train_fraction must be in (0, 1]");
        }
        if self.classifier.smote_k == 0 {
            return invalid("classifier.smote_k must be at least 1");
        }
        if self.classifier.boosting.rounds == 0 {
            return invalid("classifier.boosting.rounds must be at least 1");
        }
        let subsample = self.classifier.boosting.subsample;
        if !(subsample > 0.0 && subsample <= 1.0) {
            return invalid("classifier.boosting.subsample must be in (0, 1]");
        }
        if self.forecast.horizons.is_empty() || self.forecast.horizons.contains(&0) {
            return invalid("forecast.horizons must be a non-empty list of positive steps");
        }
        if self.forecast.order.period == 0 {
            return invalid("forecast.order.period must be at least 1");
        }
        if self.history.default_lookback_days == 0 {
            return invalid("history.default_lookback_days must be at least 1");
        }
        Ok(())
    }

    /// Hash of every setting that affects the analysis output. Provider
    /// settings change where bars come from, not what is computed from them.
    pub fn analysis_hash(&self) -> Result<ConfigHash, ConfigError> {
        let analysis = (
            &self.indicators,
            &self.labels,
            &self.classifier,
            &self.forecast,
        );
        ConfigHash::of(&analysis).map_err(|e| ConfigError::Invalid(format!("hash: {e}")))
    }
}
