//! Yahoo Finance history and quote sources.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API, with retries and
//! exponential backoff. Yahoo has no official API and changes its response
//! format without notice; parse failures surface as
//! [`DataError::SchemaMismatch`] and the CSV import path is the fallback.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, LiveQuote, QuoteSource};
use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings passed at construction; nothing is read from
/// process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// PEM bundle added to the trusted roots.
    pub ca_bundle: Option<PathBuf>,
    /// Appended to bare symbols, e.g. ".NS" for the National Stock Exchange
    /// of India. Empty disables it.
    pub exchange_suffix: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".into(),
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            ca_bundle: None,
            exchange_suffix: ".NS".into(),
        }
    }
}

impl ProviderConfig {
    /// Exchange ticker for a user-entered symbol.
    pub fn ticker(&self, symbol: &str) -> String {
        let upper = symbol.trim().to_uppercase();
        let suffix = self.exchange_suffix.to_uppercase();
        if suffix.is_empty() || upper.ends_with(&suffix) {
            upper
        } else {
            format!("{upper}{suffix}")
        }
    }

    fn build_client(&self) -> Result<reqwest::blocking::Client, DataError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36");
        if let Some(path) = &self.ca_bundle {
            let pem = std::fs::read(path)?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| DataError::Configuration(format!("CA bundle {}: {e}", path.display())))?;
            builder = builder.add_root_certificate(cert);
        }
        builder
            .build()
            .map_err(|e| DataError::Configuration(format!("HTTP client: {e}")))
    }
}

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<u64>,
    chart_previous_close: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Shared HTTP plumbing for the history provider and the quote source.
struct ChartClient {
    client: reqwest::blocking::Client,
    config: ProviderConfig,
}

impl ChartClient {
    fn new(config: ProviderConfig) -> Result<Self, DataError> {
        Ok(Self {
            client: config.build_client()?,
            config,
        })
    }

    fn get(&self, ticker: &str, url: &str) -> Result<ChartData, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(self.config.base_delay_ms) * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: ticker.to_string(),
                        });
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(ticker, attempt, retry_after, "rate limited");
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if !status.is_success() {
                        warn!(ticker, attempt, %status, "chart request failed");
                        last_error = Some(DataError::Network(format!("HTTP {status} for {ticker}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::SchemaMismatch(format!("chart response for {ticker}: {e}"))
                    })?;
                    return unwrap_chart(ticker, chart);
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(ticker, attempt, error = %e, "chart request unreachable");
                    last_error = Some(DataError::Network(e.to_string()));
                }
                Err(e) => return Err(DataError::Network(e.to_string())),
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Network("max retries exceeded".into())))
    }
}

fn unwrap_chart(ticker: &str, resp: ChartResponse) -> Result<ChartData, DataError> {
    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: ticker.to_string(),
        },
        Some(err) => DataError::SchemaMismatch(format!("{}: {}", err.code, err.description)),
        None => DataError::SchemaMismatch("empty result with no error".into()),
    })?;

    result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::SchemaMismatch("result array is empty".into()))
}

fn unix_seconds(date: NaiveDate, end_of_day: bool) -> i64 {
    let time = if end_of_day {
        chrono::NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        chrono::NaiveTime::from_hms_opt(0, 0, 0)
    };
    time.map(|t| date.and_time(t).and_utc().timestamp())
        .unwrap_or_default()
}

/// Convert the chart payload into bars. Rows where every field is null
/// (holidays) are skipped; rows missing any price are dropped.
fn parse_bars(ticker: &str, data: ChartData) -> Result<Vec<Bar>, DataError> {
    let timestamps = data
        .timestamp
        .ok_or_else(|| DataError::SchemaMismatch(format!("no timestamps for {ticker}")))?;
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::SchemaMismatch(format!("no quote data for {ticker}")))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut dropped = 0usize;

    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| DataError::SchemaMismatch(format!("invalid timestamp: {ts}")))?;

        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        match (open, high, low, close) {
            (Some(open), Some(high), Some(low), Some(close)) => bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume: volume.unwrap_or(0),
            }),
            (None, None, None, None) if volume.is_none() => {}
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(ticker, dropped, "dropped partially null rows");
    }
    Ok(bars)
}

/// History provider backed by the chart API.
pub struct YahooProvider {
    inner: ChartClient,
}

impl YahooProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, DataError> {
        Ok(Self {
            inner: ChartClient::new(config)?,
        })
    }

    fn chart_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/v8/finance/chart/{ticker}?period1={}&period2={}&interval=1d",
            self.inner.config.base_url,
            unix_seconds(start, false),
            unix_seconds(end, true),
        )
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let ticker = self.inner.config.ticker(symbol);
        let url = self.chart_url(&ticker, start, end);
        let data = self.inner.get(&ticker, &url)?;
        let bars = parse_bars(&ticker, data)?;
        if bars.is_empty() {
            return Err(DataError::NoData {
                symbol: ticker,
                start,
                end,
            });
        }
        debug!(ticker, bars = bars.len(), "history fetched");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }
}

/// Live quote from the same chart endpoint's session metadata.
pub struct YahooQuoteSource {
    inner: ChartClient,
}

impl YahooQuoteSource {
    pub fn new(config: ProviderConfig) -> Result<Self, DataError> {
        Ok(Self {
            inner: ChartClient::new(config)?,
        })
    }
}

fn quote_from_chart(data: ChartData) -> LiveQuote {
    let meta = data.meta;
    let open = data
        .indicators
        .quote
        .first()
        .and_then(|q| q.open.iter().rev().find_map(|v| *v));
    LiveQuote {
        open,
        close: meta.chart_previous_close,
        last_price: meta.regular_market_price,
        day_high: meta.regular_market_day_high,
        day_low: meta.regular_market_day_low,
        volume: meta.regular_market_volume,
        high52: meta.fifty_two_week_high,
        low52: meta.fifty_two_week_low,
    }
}

impl QuoteSource for YahooQuoteSource {
    fn quote(&self, symbol: &str) -> Result<LiveQuote, DataError> {
        let ticker = self.inner.config.ticker(symbol);
        let url = format!(
            "{}/v8/finance/chart/{ticker}?range=1d&interval=1d",
            self.inner.config.base_url
        );
        let data = self.inner.get(&ticker, &url)?;
        Ok(quote_from_chart(data))
    }
}
