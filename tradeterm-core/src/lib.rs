//! TradeTerm Core: indicators, multi-timeframe features, signal classifier,
//! horizon forecaster, data providers.
//!
//! - Domain types (bars, signals, horizon forecasts)
//! - `Indicator` trait and the daily indicator set
//! - Indicator Engine: daily columns plus weekly/monthly resample and align
//! - Label & Signal Classifier: forward labels, SMOTE, softmax GBDT
//! - Horizon Forecaster: seasonal ARIMA by conditional sum of squares
//! - History providers (chart API, CSV, Parquet cache) and live quotes

pub mod classifier;
pub mod data;
pub mod domain;
pub mod features;
pub mod fingerprint;
pub mod forecast;
pub mod indicators;
pub mod rng;
