//! Label & Signal Classifier.
//!
//! Turns an [`EnrichedSeries`] into a BUY/HOLD/SELL call for the latest bar:
//! forward-looking labels, z-score scaling, SMOTE oversampling, a
//! chronological train/test split and a softmax gradient-boosted model.
//! Every call refits from scratch; nothing is cached between runs.

pub mod gbdt;
pub mod labels;
pub mod scaler;
pub mod smote;

pub use gbdt::{BoostingConfig, GradientBoostedClassifier};
pub use labels::{make_labels, LabelConfig};
pub use scaler::StandardScaler;

use crate::domain::{SignalLabel, SignalResult};
use crate::features::{EnrichedSeries, FEATURE_COLUMNS};
use crate::rng::{Component, SeedHierarchy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("no labeled sample has a complete feature row")]
    InsufficientLabels,

    #[error("no bar has every feature present; cannot score the latest bar")]
    NoLiveFeatures,
}

/// Order of oversampling and the chronological split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Oversample the whole labeled set, then split. Synthetic points built
    /// from late samples can land in the training part, so accuracy reads
    /// optimistic.
    #[default]
    OversampleThenSplit,
    /// Split first and oversample only the training part.
    SplitThenOversample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub seed: u64,
    pub train_fraction: f64,
    pub smote_k: usize,
    pub evaluation_mode: EvaluationMode,
    pub boosting: BoostingConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            train_fraction: 0.8,
            smote_k: 5,
            evaluation_mode: EvaluationMode::default(),
            boosting: BoostingConfig::default(),
        }
    }
}

/// Class index used for training: SELL 0, HOLD 1, BUY 2.
fn class_index(label: i8) -> usize {
    SignalLabel::from_class(label).unwrap_or(SignalLabel::Hold).index()
}

#[derive(Debug, Clone, Default)]
pub struct SignalClassifier {
    labels: LabelConfig,
    config: ClassifierConfig,
}

impl SignalClassifier {
    pub fn new(labels: LabelConfig, config: ClassifierConfig) -> Self {
        Self { labels, config }
    }

    /// Classify the latest bar of `series`.
    ///
    /// `symbol` only selects the seed stream, so symbols analyzed together
    /// do not share random draws.
    pub fn classify(&self, series: &EnrichedSeries, symbol: &str) -> Result<SignalResult, ClassifierError> {
        let missing: Vec<_> = FEATURE_COLUMNS
            .iter()
            .filter(|c| !series.values().contains(**c))
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "feature columns absent; no row is usable");
        }

        let live_row = (0..series.len())
            .rev()
            .find_map(|i| series.feature_row(i, &FEATURE_COLUMNS))
            .ok_or(ClassifierError::NoLiveFeatures)?;

        let labels = make_labels(&series.closes(), &self.labels);
        let (samples, targets): (Vec<Vec<f64>>, Vec<usize>) = labels
            .iter()
            .enumerate()
            .filter_map(|(i, label)| {
                let label = (*label)?;
                let row = series.feature_row(i, &FEATURE_COLUMNS)?;
                Some((row, class_index(label)))
            })
            .unzip();

        if samples.is_empty() {
            return Err(ClassifierError::InsufficientLabels);
        }

        let first = targets[0];
        if targets.iter().all(|&t| t == first) {
            debug!(samples = samples.len(), "single label class; reporting HOLD");
            return Ok(SignalResult::degenerate_hold());
        }

        let scaler = StandardScaler::fit(&samples);
        let scaled = scaler.transform(&samples);

        let seeds = SeedHierarchy::new(self.config.seed);
        let mut smote_rng = seeds.rng_for(symbol, Component::Oversampling);
        let k = self.config.smote_k;

        let (train_x, train_y, test_x, test_y) = match self.config.evaluation_mode {
            EvaluationMode::OversampleThenSplit => {
                let (x, y) = smote::smote(&scaled, &targets, k, &mut smote_rng);
                let cut = split_point(x.len(), self.config.train_fraction);
                let (train_x, test_x) = x.split_at(cut);
                let (train_y, test_y) = y.split_at(cut);
                (train_x.to_vec(), train_y.to_vec(), test_x.to_vec(), test_y.to_vec())
            }
            EvaluationMode::SplitThenOversample => {
                let cut = split_point(scaled.len(), self.config.train_fraction);
                let (train_x, train_y) = smote::smote(&scaled[..cut], &targets[..cut], k, &mut smote_rng);
                (train_x, train_y, scaled[cut..].to_vec(), targets[cut..].to_vec())
            }
        };

        if train_x.is_empty() {
            return Err(ClassifierError::InsufficientLabels);
        }

        let mut boost_rng = seeds.rng_for(symbol, Component::Boosting);
        let model = GradientBoostedClassifier::fit(
            &train_x,
            &train_y,
            SignalLabel::ALL.len(),
            &self.config.boosting,
            &mut boost_rng,
        );

        let accuracy = if test_x.is_empty() {
            0.0
        } else {
            let correct = test_x
                .iter()
                .zip(&test_y)
                .filter(|(row, truth)| model.predict(row) == **truth)
                .count();
            correct as f64 / test_x.len() as f64
        };

        let label = SignalLabel::from_index(model.predict(&scaler.transform_row(&live_row)))
            .unwrap_or(SignalLabel::Hold);
        debug!(
            samples = samples.len(),
            train = train_x.len(),
            test = test_x.len(),
            accuracy,
            %label,
            "classifier fitted"
        );

        Ok(SignalResult { label, accuracy })
    }
}

fn split_point(len: usize, train_fraction: f64) -> usize {
    ((len as f64 * train_fraction).floor() as usize).min(len)
}
