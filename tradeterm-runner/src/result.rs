//! The record returned for every pipeline run.
//!
//! Always well-formed: a fatal failure yields `symbol` plus `error` only;
//! component failures leave their own field absent and set the matching
//! `*_error` entry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tradeterm_core::data::LiveQuote;
use tradeterm_core::domain::{round2, HorizonForecast, SignalLabel};
use tradeterm_core::features::{EnrichedSeries, IndicatorColumn};
use tradeterm_core::fingerprint::RunFingerprint;

/// One display row: date, OHLCV and the chart indicator subset, rounded to
/// two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "RSI_D", skip_serializing_if = "Option::is_none", default)]
    pub rsi_d: Option<f64>,
    #[serde(rename = "MACD_D", skip_serializing_if = "Option::is_none", default)]
    pub macd_d: Option<f64>,
    #[serde(rename = "MACD_SIGNAL_D", skip_serializing_if = "Option::is_none", default)]
    pub macd_signal_d: Option<f64>,
    #[serde(rename = "ATR", skip_serializing_if = "Option::is_none", default)]
    pub atr: Option<f64>,
    #[serde(rename = "EMA5", skip_serializing_if = "Option::is_none", default)]
    pub ema5: Option<f64>,
    #[serde(rename = "EMA10", skip_serializing_if = "Option::is_none", default)]
    pub ema10: Option<f64>,
}

impl ChartRow {
    pub fn rows(series: &EnrichedSeries) -> Vec<ChartRow> {
        series
            .rows()
            .map(|row| {
                let get = |col: IndicatorColumn| row.get(col).map(round2);
                ChartRow {
                    date: row.bar.date.format("%Y-%m-%d").to_string(),
                    open: round2(row.bar.open),
                    high: round2(row.bar.high),
                    low: round2(row.bar.low),
                    close: round2(row.bar.close),
                    volume: row.bar.volume,
                    rsi_d: get(IndicatorColumn::RsiDaily),
                    macd_d: get(IndicatorColumn::MacdDaily),
                    macd_signal_d: get(IndicatorColumn::MacdSignalDaily),
                    atr: get(IndicatorColumn::Atr),
                    ema5: get(IndicatorColumn::Ema5),
                    ema10: get(IndicatorColumn::Ema10),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chart: Option<Vec<ChartRow>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signal: Option<SignalLabel>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signal_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signal_error: Option<String>,
    /// Keyed `"{h}_Day"`, values rounded to two decimals.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub forecasts: BTreeMap<String, HorizonForecast>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub forecast_errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub live: Option<LiveQuote>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub live_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fingerprint: Option<RunFingerprint>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl PipelineResult {
    /// Record for a run that could not produce a chart.
    pub fn failed(symbol: impl Into<String>, error: impl ToString) -> Self {
        Self {
            symbol: symbol.into(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
