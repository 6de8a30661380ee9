//! Per-horizon forecast record.

use serde::{Deserialize, Serialize};

/// Forecast for one horizon, produced by an independent model fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonForecast {
    #[serde(skip)]
    pub horizon: usize,
    pub predicted_price: f64,
    pub latest_close: f64,
    pub predicted_return_pct: f64,
    pub predicted_deviation_pct: f64,
    #[serde(rename = "AIC")]
    pub aic: f64,
    #[serde(rename = "BIC")]
    pub bic: f64,
}

impl HorizonForecast {
    /// Build the record from a point forecast and the last observed close.
    ///
    /// `latest_close` must be positive; callers check this before fitting.
    pub fn new(horizon: usize, predicted_price: f64, latest_close: f64, aic: f64, bic: f64) -> Self {
        let diff = predicted_price - latest_close;
        Self {
            horizon,
            predicted_price,
            latest_close,
            predicted_return_pct: diff / latest_close * 100.0,
            predicted_deviation_pct: diff.abs() / latest_close * 100.0,
            aic,
            bic,
        }
    }

    /// Map key used in the result record, e.g. `"3_Day"`.
    pub fn key(&self) -> String {
        horizon_key(self.horizon)
    }

    /// Copy with every number rounded to two decimals for display.
    pub fn rounded(&self) -> Self {
        Self {
            horizon: self.horizon,
            predicted_price: round2(self.predicted_price),
            latest_close: round2(self.latest_close),
            predicted_return_pct: round2(self.predicted_return_pct),
            predicted_deviation_pct: round2(self.predicted_deviation_pct),
            aic: round2(self.aic),
            bic: round2(self.bic),
        }
    }
}

pub fn horizon_key(horizon: usize) -> String {
    format!("{horizon}_Day")
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
