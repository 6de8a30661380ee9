//! Indicator Engine: daily, weekly and monthly indicators aligned onto the
//! daily rows of a bar history.
//!
//! The engine owns the column vocabulary ([`IndicatorColumn`]) and the
//! column store ([`EnrichedSeries`]). Downstream components only ever read
//! an `EnrichedSeries`; they never call an indicator directly.

pub mod align;
pub mod engine;
pub mod resample;

pub use engine::build_enriched;
pub use resample::{PeriodKey, Timeframe};

use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Every column the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndicatorColumn {
    #[serde(rename = "RSI_D")]
    RsiDaily,
    #[serde(rename = "MACD_D")]
    MacdDaily,
    #[serde(rename = "MACD_SIGNAL_D")]
    MacdSignalDaily,
    #[serde(rename = "ADX")]
    Adx,
    #[serde(rename = "STOCH_K")]
    StochK,
    #[serde(rename = "STOCH_D")]
    StochD,
    #[serde(rename = "ATR")]
    Atr,
    #[serde(rename = "MFI")]
    Mfi,
    #[serde(rename = "Return")]
    Return,
    #[serde(rename = "Lag1")]
    Lag1,
    #[serde(rename = "Lag3")]
    Lag3,
    #[serde(rename = "Lag5")]
    Lag5,
    #[serde(rename = "Volatility05")]
    Volatility05,
    #[serde(rename = "Volatility10")]
    Volatility10,
    #[serde(rename = "EMA5")]
    Ema5,
    #[serde(rename = "EMA10")]
    Ema10,
    #[serde(rename = "RSI_W")]
    RsiWeekly,
    #[serde(rename = "MACD_W")]
    MacdWeekly,
    #[serde(rename = "MACD_SIGNAL_W")]
    MacdSignalWeekly,
    #[serde(rename = "RSI_M")]
    RsiMonthly,
    #[serde(rename = "MACD_M")]
    MacdMonthly,
    #[serde(rename = "MACD_SIGNAL_M")]
    MacdSignalMonthly,
}

impl IndicatorColumn {
    pub const ALL: [IndicatorColumn; 22] = [
        IndicatorColumn::RsiDaily,
        IndicatorColumn::MacdDaily,
        IndicatorColumn::MacdSignalDaily,
        IndicatorColumn::Adx,
        IndicatorColumn::StochK,
        IndicatorColumn::StochD,
        IndicatorColumn::Atr,
        IndicatorColumn::Mfi,
        IndicatorColumn::Return,
        IndicatorColumn::Lag1,
        IndicatorColumn::Lag3,
        IndicatorColumn::Lag5,
        IndicatorColumn::Volatility05,
        IndicatorColumn::Volatility10,
        IndicatorColumn::Ema5,
        IndicatorColumn::Ema10,
        IndicatorColumn::RsiWeekly,
        IndicatorColumn::MacdWeekly,
        IndicatorColumn::MacdSignalWeekly,
        IndicatorColumn::RsiMonthly,
        IndicatorColumn::MacdMonthly,
        IndicatorColumn::MacdSignalMonthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorColumn::RsiDaily => "RSI_D",
            IndicatorColumn::MacdDaily => "MACD_D",
            IndicatorColumn::MacdSignalDaily => "MACD_SIGNAL_D",
            IndicatorColumn::Adx => "ADX",
            IndicatorColumn::StochK => "STOCH_K",
            IndicatorColumn::StochD => "STOCH_D",
            IndicatorColumn::Atr => "ATR",
            IndicatorColumn::Mfi => "MFI",
            IndicatorColumn::Return => "Return",
            IndicatorColumn::Lag1 => "Lag1",
            IndicatorColumn::Lag3 => "Lag3",
            IndicatorColumn::Lag5 => "Lag5",
            IndicatorColumn::Volatility05 => "Volatility05",
            IndicatorColumn::Volatility10 => "Volatility10",
            IndicatorColumn::Ema5 => "EMA5",
            IndicatorColumn::Ema10 => "EMA10",
            IndicatorColumn::RsiWeekly => "RSI_W",
            IndicatorColumn::MacdWeekly => "MACD_W",
            IndicatorColumn::MacdSignalWeekly => "MACD_SIGNAL_W",
            IndicatorColumn::RsiMonthly => "RSI_M",
            IndicatorColumn::MacdMonthly => "MACD_M",
            IndicatorColumn::MacdSignalMonthly => "MACD_SIGNAL_M",
        }
    }
}

impl fmt::Display for IndicatorColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier input columns, in model feature order.
pub const FEATURE_COLUMNS: [IndicatorColumn; 21] = [
    IndicatorColumn::RsiDaily,
    IndicatorColumn::MacdDaily,
    IndicatorColumn::MacdSignalDaily,
    IndicatorColumn::Adx,
    IndicatorColumn::StochK,
    IndicatorColumn::StochD,
    IndicatorColumn::Atr,
    IndicatorColumn::Mfi,
    IndicatorColumn::Lag1,
    IndicatorColumn::Lag3,
    IndicatorColumn::Lag5,
    IndicatorColumn::Volatility05,
    IndicatorColumn::Volatility10,
    IndicatorColumn::Ema5,
    IndicatorColumn::Ema10,
    IndicatorColumn::RsiWeekly,
    IndicatorColumn::MacdWeekly,
    IndicatorColumn::MacdSignalWeekly,
    IndicatorColumn::RsiMonthly,
    IndicatorColumn::MacdMonthly,
    IndicatorColumn::MacdSignalMonthly,
];

/// Columns shown on the price chart.
pub const CHART_COLUMNS: [IndicatorColumn; 6] = [
    IndicatorColumn::RsiDaily,
    IndicatorColumn::MacdDaily,
    IndicatorColumn::MacdSignalDaily,
    IndicatorColumn::Atr,
    IndicatorColumn::Ema5,
    IndicatorColumn::Ema10,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("insufficient history: need at least {required} bars, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("bars are not strictly ascending by date")]
    UnsortedInput,

    #[error("invalid indicator setting: {0}")]
    InvalidConfig(String),
}

/// Indicator periods and the warm-up minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub min_bars: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub adx_period: usize,
    pub stoch_k: usize,
    pub stoch_smooth_k: usize,
    pub stoch_d: usize,
    pub atr_period: usize,
    pub mfi_period: usize,
    pub weekly_rsi_period: usize,
    pub weekly_macd: (usize, usize, usize),
    pub monthly_rsi_period: usize,
    pub monthly_macd: (usize, usize, usize),
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            min_bars: 200,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx_period: 14,
            stoch_k: 14,
            stoch_smooth_k: 3,
            stoch_d: 3,
            atr_period: 14,
            mfi_period: 14,
            weekly_rsi_period: 14,
            weekly_macd: (12, 26, 9),
            monthly_rsi_period: 14,
            monthly_macd: (6, 13, 5),
        }
    }
}

impl IndicatorConfig {
    /// Reject periods the indicator constructors cannot accept.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("adx_period", self.adx_period),
            ("atr_period", self.atr_period),
            ("mfi_period", self.mfi_period),
            ("stoch_k", self.stoch_k),
            ("stoch_smooth_k", self.stoch_smooth_k),
            ("stoch_d", self.stoch_d),
            ("weekly_rsi_period", self.weekly_rsi_period),
            ("monthly_rsi_period", self.monthly_rsi_period),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, period)| *period == 0) {
            return Err(IndicatorError::InvalidConfig(format!("{name} must be at least 1")));
        }

        let macds = [
            ("macd", (self.macd_fast, self.macd_slow, self.macd_signal)),
            ("weekly_macd", self.weekly_macd),
            ("monthly_macd", self.monthly_macd),
        ];
        for (name, (fast, slow, signal)) in macds {
            if fast == 0 || signal == 0 {
                return Err(IndicatorError::InvalidConfig(format!(
                    "{name} fast and signal periods must be at least 1"
                )));
            }
            if slow <= fast {
                return Err(IndicatorError::InvalidConfig(format!(
                    "{name} slow period ({slow}) must exceed fast period ({fast})"
                )));
            }
        }
        Ok(())
    }
}

/// Column store for indicator series, one value per bar.
///
/// Only columns with at least one finite value are ever stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorValues {
    series: BTreeMap<IndicatorColumn, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column. A column without any finite value is dropped.
    pub fn insert(&mut self, column: IndicatorColumn, values: Vec<f64>) {
        if values.iter().any(|v| v.is_finite()) {
            self.series.insert(column, values);
        } else {
            self.series.remove(&column);
        }
    }

    /// Value at a bar index; `None` when absent or not finite.
    pub fn get(&self, column: IndicatorColumn, bar_index: usize) -> Option<f64> {
        self.series
            .get(&column)
            .and_then(|v| v.get(bar_index).copied())
            .filter(|v| v.is_finite())
    }

    pub fn get_series(&self, column: IndicatorColumn) -> Option<&[f64]> {
        self.series.get(&column).map(|v| v.as_slice())
    }

    pub fn contains(&self, column: IndicatorColumn) -> bool {
        self.series.contains_key(&column)
    }

    pub fn columns(&self) -> impl Iterator<Item = IndicatorColumn> + '_ {
        self.series.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub(crate) fn series_mut(&mut self) -> impl Iterator<Item = &mut Vec<f64>> {
        self.series.values_mut()
    }
}

/// Bars plus their aligned indicator columns. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    bars: Vec<Bar>,
    values: IndicatorValues,
}

impl EnrichedSeries {
    pub fn new(bars: Vec<Bar>, values: IndicatorValues) -> Self {
        Self { bars, values }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn values(&self) -> &IndicatorValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        crate::domain::closes(&self.bars)
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Feature vector for a row, in `columns` order. `None` if any value is
    /// absent or not finite.
    pub fn feature_row(&self, index: usize, columns: &[IndicatorColumn]) -> Option<Vec<f64>> {
        columns.iter().map(|&c| self.values.get(c, index)).collect()
    }

    pub fn row(&self, index: usize) -> Option<EnrichedBar> {
        let bar = self.bars.get(index)?.clone();
        let values = self
            .values
            .columns()
            .filter_map(|c| self.values.get(c, index).map(|v| (c, v)))
            .collect();
        Some(EnrichedBar { bar, values })
    }

    pub fn rows(&self) -> impl Iterator<Item = EnrichedBar> + '_ {
        (0..self.bars.len()).filter_map(move |i| self.row(i))
    }
}

/// One daily row: the bar and the indicator values present for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub bar: Bar,
    pub values: BTreeMap<IndicatorColumn, f64>,
}

impl EnrichedBar {
    pub fn get(&self, column: IndicatorColumn) -> Option<f64> {
        self.values.get(&column).copied()
    }
}
