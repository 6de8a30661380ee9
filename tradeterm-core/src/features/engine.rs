//! Builds an [`EnrichedSeries`] from canonical daily bars.

use super::align::{align_to_daily, fill_gaps};
use super::resample::{resample, PeriodKey, Timeframe};
use super::{EnrichedSeries, IndicatorColumn, IndicatorConfig, IndicatorError, IndicatorValues};
use crate::domain::{is_strictly_ascending, Bar};
use crate::indicators::{
    Adx, Atr, EwmMean, Indicator, LaggedReturn, Macd, MacdOutput, Mfi, PctChange, ReturnVolatility,
    Rsi, Stochastic, StochasticOutput,
};
use tracing::debug;

type ColumnIndicator = (IndicatorColumn, Box<dyn Indicator>);

fn column<I: Indicator + 'static>(column: IndicatorColumn, indicator: I) -> ColumnIndicator {
    (column, Box::new(indicator))
}

/// Daily indicator set, one instance per output column.
fn daily_indicators(config: &IndicatorConfig) -> Vec<ColumnIndicator> {
    let (fast, slow, signal) = (config.macd_fast, config.macd_slow, config.macd_signal);
    let (k, smooth_k, d) = (config.stoch_k, config.stoch_smooth_k, config.stoch_d);
    vec![
        column(IndicatorColumn::RsiDaily, Rsi::new(config.rsi_period)),
        column(IndicatorColumn::MacdDaily, Macd::new(fast, slow, signal, MacdOutput::Line)),
        column(IndicatorColumn::MacdSignalDaily, Macd::new(fast, slow, signal, MacdOutput::Signal)),
        column(IndicatorColumn::Adx, Adx::new(config.adx_period)),
        column(IndicatorColumn::StochK, Stochastic::new(k, smooth_k, d, StochasticOutput::K)),
        column(IndicatorColumn::StochD, Stochastic::new(k, smooth_k, d, StochasticOutput::D)),
        column(IndicatorColumn::Atr, Atr::new(config.atr_period)),
        column(IndicatorColumn::Mfi, Mfi::new(config.mfi_period)),
        column(IndicatorColumn::Return, PctChange),
        column(IndicatorColumn::Lag1, LaggedReturn::new(1)),
        column(IndicatorColumn::Lag3, LaggedReturn::new(3)),
        column(IndicatorColumn::Lag5, LaggedReturn::new(5)),
        column(IndicatorColumn::Volatility05, ReturnVolatility::new(5)),
        column(IndicatorColumn::Volatility10, ReturnVolatility::new(10)),
        column(IndicatorColumn::Ema5, EwmMean::new(5)),
        column(IndicatorColumn::Ema10, EwmMean::new(10)),
    ]
}

/// Indicators computed on one resampled timeframe.
fn period_indicators(timeframe: Timeframe, config: &IndicatorConfig) -> Vec<ColumnIndicator> {
    let (rsi_period, (fast, slow, signal), [rsi, line, sig]) = match timeframe {
        Timeframe::Weekly => (
            config.weekly_rsi_period,
            config.weekly_macd,
            [
                IndicatorColumn::RsiWeekly,
                IndicatorColumn::MacdWeekly,
                IndicatorColumn::MacdSignalWeekly,
            ],
        ),
        Timeframe::Monthly => (
            config.monthly_rsi_period,
            config.monthly_macd,
            [
                IndicatorColumn::RsiMonthly,
                IndicatorColumn::MacdMonthly,
                IndicatorColumn::MacdSignalMonthly,
            ],
        ),
    };
    vec![
        column(rsi, Rsi::new(rsi_period)),
        column(line, Macd::new(fast, slow, signal, MacdOutput::Line)),
        column(sig, Macd::new(fast, slow, signal, MacdOutput::Signal)),
    ]
}

/// Compute every indicator column for `bars` and align it to the daily rows.
///
/// Bars must already be canonical. Columns with no finite value are left out;
/// the rest are back-filled then forward-filled so every row is populated.
pub fn build_enriched(bars: &[Bar], config: &IndicatorConfig) -> Result<EnrichedSeries, IndicatorError> {
    config.validate()?;
    if !is_strictly_ascending(bars) {
        return Err(IndicatorError::UnsortedInput);
    }
    if bars.len() < config.min_bars {
        return Err(IndicatorError::InsufficientHistory {
            required: config.min_bars,
            available: bars.len(),
        });
    }

    let mut values = IndicatorValues::new();

    for (col, indicator) in daily_indicators(config) {
        values.insert(col, indicator.compute(bars));
    }

    for timeframe in [Timeframe::Weekly, Timeframe::Monthly] {
        let periods = resample(bars, timeframe);
        let keys: Vec<PeriodKey> = periods.iter().map(|(k, _)| *k).collect();
        let period_bars: Vec<Bar> = periods.into_iter().map(|(_, b)| b).collect();
        debug!(?timeframe, periods = period_bars.len(), "resampled");

        for (col, indicator) in period_indicators(timeframe, config) {
            let per_period = indicator.compute(&period_bars);
            values.insert(col, align_to_daily(bars, timeframe, &keys, &per_period));
        }
    }

    for series in values.series_mut() {
        fill_gaps(series);
    }

    debug!(bars = bars.len(), columns = values.len(), "indicator engine complete");
    Ok(EnrichedSeries::new(bars.to_vec(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, NaiveDate, Weekday};

    /// Weekday-only bars following `close(i)`.
    fn weekday_bars(n: usize, close: impl Fn(usize) -> f64) -> Vec<Bar> {
        let mut date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let mut bars = Vec::with_capacity(n);
        for i in 0..n {
            while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                date += Duration::days(1);
            }
            let c = close(i);
            bars.push(Bar {
                date,
                open: c * 0.995,
                high: c * 1.01,
                low: c * 0.99,
                close: c,
                volume: 10_000 + (i as u64 % 7) * 500,
            });
            date += Duration::days(1);
        }
        bars
    }

    #[test]
    fn rejects_short_history() {
        let bars = weekday_bars(50, |i| 100.0 + i as f64);
        let err = build_enriched(&bars, &IndicatorConfig::default()).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientHistory {
                required: 200,
                available: 50
            }
        );
    }

    #[test]
    fn rejects_unsorted() {
        let mut bars = weekday_bars(250, |i| 100.0 + i as f64);
        bars.swap(3, 4);
        assert_eq!(
            build_enriched(&bars, &IndicatorConfig::default()).unwrap_err(),
            IndicatorError::UnsortedInput
        );
    }

    #[test]
    fn invalid_periods_are_errors_not_panics() {
        let bars = weekday_bars(300, |i| 100.0 + i as f64);
        let configs = [
            IndicatorConfig { rsi_period: 0, ..IndicatorConfig::default() },
            IndicatorConfig { stoch_d: 0, ..IndicatorConfig::default() },
            IndicatorConfig { macd_slow: 12, ..IndicatorConfig::default() },
            IndicatorConfig { monthly_macd: (13, 6, 5), ..IndicatorConfig::default() },
            IndicatorConfig { weekly_macd: (12, 26, 0), ..IndicatorConfig::default() },
        ];
        for config in configs {
            assert!(
                matches!(build_enriched(&bars, &config), Err(IndicatorError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn full_history_has_every_column_on_every_row() {
        let bars = weekday_bars(420, |i| 100.0 * (1.0 + 0.003 * (i as f64 * 0.7).sin()) + i as f64 * 0.2);
        let series = build_enriched(&bars, &IndicatorConfig::default()).unwrap();
        assert_eq!(series.len(), bars.len());
        for column in IndicatorColumn::ALL {
            assert!(series.values().contains(column), "missing {column}");
        }
        for row in series.rows() {
            assert_eq!(row.values.len(), IndicatorColumn::ALL.len());
        }
    }

    #[test]
    fn short_history_omits_monthly_columns() {
        // ~12 months: not enough closed months for RSI(14) or MACD(6,13,5)
        let bars = weekday_bars(250, |i| 100.0 + (i as f64 * 0.3).sin());
        let series = build_enriched(&bars, &IndicatorConfig::default()).unwrap();
        assert!(!series.values().contains(IndicatorColumn::RsiMonthly));
        assert!(!series.values().contains(IndicatorColumn::MacdSignalMonthly));
        assert!(series.values().contains(IndicatorColumn::RsiWeekly));
    }

    #[test]
    fn flat_history_is_finite() {
        let bars = weekday_bars(420, |_| 100.0);
        let series = build_enriched(&bars, &IndicatorConfig::default()).unwrap();
        let last = series.len() - 1;
        assert_eq!(series.values().get(IndicatorColumn::RsiDaily, last), Some(50.0));
        assert_eq!(series.values().get(IndicatorColumn::Adx, last), Some(0.0));
        assert_eq!(series.values().get(IndicatorColumn::Return, last), Some(0.0));
    }
}
