//! Pipeline Orchestrator.
//!
//! fetch → canonicalize → Indicator Engine → classifier → forecaster →
//! assemble. Only a fetch or indicator failure is fatal; the classifier and
//! each forecast horizon fail on their own, leaving the rest of the record
//! intact. The classifier and forecaster read the same immutable
//! `EnrichedSeries` and never see each other's intermediate state.

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use tradeterm_core::classifier::SignalClassifier;
use tradeterm_core::data::{Canonicalizer, DataProvider, QuoteSource};
use tradeterm_core::domain::{horizon_key, Bar};
use tradeterm_core::features::build_enriched;
use tradeterm_core::fingerprint::RunFingerprint;
use tradeterm_core::forecast::HorizonForecaster;

use crate::config::PipelineConfig;
use crate::data_loader::load_history;
use crate::request::{HistoryWindow, PipelineRequest};
use crate::result::{ChartRow, PipelineResult};

pub struct Pipeline {
    config: PipelineConfig,
    provider: Box<dyn DataProvider>,
    quotes: Option<Box<dyn QuoteSource>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, provider: Box<dyn DataProvider>) -> Self {
        Self {
            config,
            provider,
            quotes: None,
        }
    }

    pub fn with_quote_source(mut self, quotes: Box<dyn QuoteSource>) -> Self {
        self.quotes = Some(quotes);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Request using the configured default lookback.
    pub fn default_request(&self, symbol: impl Into<String>) -> PipelineRequest {
        PipelineRequest::new(
            symbol,
            HistoryWindow::LookbackDays(self.config.history.default_lookback_days),
        )
    }

    pub fn run(&self, request: &PipelineRequest) -> PipelineResult {
        self.run_at(request, chrono::Local::now().date_naive())
    }

    /// [`Pipeline::run`] with an explicit "today" for lookback windows.
    pub fn run_at(&self, request: &PipelineRequest, today: NaiveDate) -> PipelineResult {
        let symbol = match request.normalized_symbol() {
            Ok(s) => s,
            Err(e) => return PipelineResult::failed(request.symbol.trim(), e),
        };

        let mut result = match request.resolve(today, self.config.history.min_range_days) {
            Err(e) => PipelineResult::failed(&symbol, e),
            Ok((start, end)) => match load_history(self.provider.as_ref(), &symbol, start, end) {
                Ok(history) => {
                    debug!(symbol, source = ?history.source, bars = history.bars.len(), "history ready");
                    analyze_canonical(&symbol, &history.bars, &self.config)
                }
                Err(e) => {
                    warn!(symbol, error = %e, "history fetch failed");
                    PipelineResult::failed(&symbol, e)
                }
            },
        };

        // The quote is independent of the history and reported either way.
        if let Some(quotes) = &self.quotes {
            match quotes.quote(&symbol) {
                Ok(quote) => result.live = Some(quote),
                Err(e) => {
                    warn!(symbol, error = %e, "live quote unavailable");
                    result.live_error = Some(e.to_string());
                }
            }
        }
        result
    }
}

/// Everything after the fetch: canonicalize `bars`, then analyze. No I/O.
pub fn analyze_bars(symbol: &str, bars: &[Bar], config: &PipelineConfig) -> PipelineResult {
    match Canonicalizer::canonicalize(bars) {
        Ok((canonical, _)) => analyze_canonical(symbol, &canonical, config),
        Err(e) => PipelineResult::failed(symbol, e),
    }
}

fn analyze_canonical(symbol: &str, bars: &[Bar], config: &PipelineConfig) -> PipelineResult {
    let series = match build_enriched(bars, &config.indicators) {
        Ok(series) => series,
        Err(e) => {
            warn!(symbol, error = %e, "indicator construction failed");
            return PipelineResult::failed(symbol, e);
        }
    };

    let mut result = PipelineResult {
        symbol: symbol.to_string(),
        ..PipelineResult::default()
    };

    match config.analysis_hash() {
        Ok(hash) => result.fingerprint = Some(RunFingerprint::new(bars, hash, config.classifier.seed)),
        Err(e) => warn!(symbol, error = %e, "fingerprint unavailable"),
    }

    let classifier = SignalClassifier::new(config.labels.clone(), config.classifier.clone());
    match classifier.classify(&series, symbol) {
        Ok(signal) => {
            result.signal = Some(signal.label);
            result.signal_accuracy = Some(signal.accuracy);
        }
        Err(e) => {
            warn!(symbol, error = %e, "signal unavailable");
            result.signal_error = Some(e.to_string());
        }
    }

    let forecaster = HorizonForecaster::new(config.forecast.clone());
    let (forecasts, errors) = forecaster.forecast_all(&series.closes());
    result.forecasts = forecasts
        .values()
        .map(|f| (f.key(), f.rounded()))
        .collect();
    result.forecast_errors = errors
        .into_iter()
        .map(|(h, e)| (horizon_key(h), e.to_string()))
        .collect();

    result.chart = Some(ChartRow::rows(&series));

    info!(
        symbol,
        bars = series.len(),
        signal = ?result.signal,
        forecasts = result.forecasts.len(),
        "pipeline complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::SyntheticProvider;
    use tradeterm_core::data::{DataError, LiveQuote};

    struct DownQuotes;

    impl QuoteSource for DownQuotes {
        fn quote(&self, _symbol: &str) -> Result<LiveQuote, DataError> {
            Err(DataError::Network("connection refused".into()))
        }
    }

    struct FixedQuotes;

    impl QuoteSource for FixedQuotes {
        fn quote(&self, _symbol: &str) -> Result<LiveQuote, DataError> {
            Ok(LiveQuote {
                last_price: Some(123.4),
                ..LiveQuote::default()
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    #[test]
    fn short_range_is_a_top_level_error() {
        let pipeline = Pipeline::new(PipelineConfig::default(), Box::new(SyntheticProvider::new(1)));
        let request = PipelineRequest::new(
            "tcs",
            HistoryWindow::Range {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            },
        );
        let result = pipeline.run_at(&request, today());
        assert_eq!(result.symbol, "TCS");
        assert!(result.error.unwrap().contains("365"));
        assert!(result.chart.is_none());
    }

    #[test]
    fn quote_failure_does_not_touch_analysis() {
        let pipeline = Pipeline::new(PipelineConfig::default(), Box::new(SyntheticProvider::new(1)))
            .with_quote_source(Box::new(DownQuotes));
        let result = pipeline.run_at(&PipelineRequest::new("TCS", HistoryWindow::LookbackDays(30)), today());
        assert!(result.live.is_none());
        assert!(result.live_error.unwrap().contains("connection refused"));
        // 30 calendar days is far below the warm-up minimum.
        assert!(result.error.unwrap().contains("insufficient history"));
    }

    #[test]
    fn quote_reported_with_full_analysis() {
        let pipeline = Pipeline::new(PipelineConfig::default(), Box::new(SyntheticProvider::new(1)))
            .with_quote_source(Box::new(FixedQuotes));
        let result = pipeline.run_at(&pipeline.default_request("TCS"), today());
        assert!(result.error.is_none(), "{:?}", result.error);
        assert_eq!(result.live.unwrap().last_price, Some(123.4));
        assert!(result.chart.is_some());
        assert!(result.fingerprint.is_some());
    }
}
