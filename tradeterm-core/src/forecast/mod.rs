//! Horizon Forecaster: one seasonal ARIMA fit per requested horizon.

pub mod optimize;
pub mod sarima;

pub use optimize::{Minimum, NelderMead};
pub use sarima::{SarimaFit, SarimaOrder};

use crate::domain::HorizonForecast;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("series too short for the model: need {required} closes, got {available}")]
    SeriesTooShort { required: usize, available: usize },

    #[error("model fit did not converge: {0}")]
    ConvergenceFailure(String),

    #[error("latest close must be a positive number, got {0}")]
    InvalidLatestClose(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub horizons: Vec<usize>,
    pub order: SarimaOrder,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizons: vec![3, 5],
            order: SarimaOrder::default(),
            max_iterations: 2_000,
            tolerance: 1e-8,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HorizonForecaster {
    config: ForecastConfig,
}

impl HorizonForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn horizons(&self) -> &[usize] {
        &self.config.horizons
    }

    fn optimizer(&self) -> NelderMead {
        NelderMead {
            max_iterations: self.config.max_iterations,
            f_tolerance: self.config.tolerance,
            ..NelderMead::default()
        }
    }

    /// Fit the model on `closes` and forecast `horizon` steps ahead.
    pub fn forecast_horizon(&self, closes: &[f64], horizon: usize) -> Result<HorizonForecast, ForecastError> {
        let order = self.config.order;
        let required = order.min_observations();
        if closes.len() < required {
            return Err(ForecastError::SeriesTooShort {
                required,
                available: closes.len(),
            });
        }
        let latest_close = closes[closes.len() - 1];
        if !latest_close.is_finite() || latest_close <= 0.0 {
            return Err(ForecastError::InvalidLatestClose(latest_close));
        }
        if horizon == 0 {
            return Err(ForecastError::ConvergenceFailure("horizon must be at least 1".into()));
        }

        let fit = sarima::fit(closes, order, &self.optimizer());
        if !fit.optimizer.value.is_finite() {
            return Err(ForecastError::ConvergenceFailure(
                "sum of squares diverged for every parameter tried".into(),
            ));
        }
        if !fit.optimizer.converged {
            warn!(
                horizon,
                iterations = fit.optimizer.iterations,
                "simplex hit its iteration limit; using best point found"
            );
        }

        let predicted = fit.forecast(horizon).last().copied().unwrap_or(f64::NAN);
        if !predicted.is_finite() || !fit.aic.is_finite() || !fit.bic.is_finite() {
            return Err(ForecastError::ConvergenceFailure(format!(
                "non-finite forecast for {horizon}-step horizon"
            )));
        }

        debug!(horizon, predicted, aic = fit.aic, "horizon fitted");
        Ok(HorizonForecast::new(horizon, predicted, latest_close, fit.aic, fit.bic))
    }

    /// Every configured horizon, fitted independently. A failed horizon
    /// lands in the error map and does not affect the others.
    pub fn forecast_all(
        &self,
        closes: &[f64],
    ) -> (BTreeMap<usize, HorizonForecast>, BTreeMap<usize, ForecastError>) {
        let mut forecasts = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for &horizon in self.horizons() {
            match self.forecast_horizon(closes, horizon) {
                Ok(f) => {
                    forecasts.insert(horizon, f);
                }
                Err(e) => {
                    warn!(horizon, error = %e, "forecast failed");
                    errors.insert(horizon, e);
                }
            }
        }
        (forecasts, errors)
    }
}
