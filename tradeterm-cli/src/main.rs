//! TradeTerm CLI: run the analytics pipeline and print the result as JSON.
//!
//! Commands:
//! - `analyze` - fetch history, compute indicators, classify and forecast
//! - `config` - print the default pipeline configuration as TOML
//!
//! Logs go to stderr; stdout carries only the JSON result.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::info;
use tradeterm_core::data::{
    CachedProvider, CsvProvider, DataProvider, ParquetCache, QuoteSource, YahooProvider,
    YahooQuoteSource,
};
use tradeterm_runner::{
    HistoryWindow, Pipeline, PipelineConfig, PipelineRequest, PipelineResult, SyntheticProvider,
};

#[derive(Parser)]
#[command(
    name = "tradeterm",
    about = "TradeTerm CLI: indicators, BUY/HOLD/SELL signal and short-horizon forecasts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more symbols and print the pipeline result as JSON.
    Analyze {
        /// Symbols to analyze (e.g., RELIANCE TCS INFY).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Calendar days of history ending today. Defaults to the configured lookback.
        #[arg(long, conflicts_with_all = ["start", "end"])]
        days: Option<u32>,

        /// Start date (YYYY-MM-DD). Requires --end.
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Requires --start.
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// Path to a TOML pipeline config. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read history from a CSV file or a directory of `{SYMBOL}.csv` files.
        #[arg(long, conflicts_with = "synthetic")]
        csv: Option<PathBuf>,

        /// Generate seeded synthetic history instead of fetching.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Parquet cache directory for fetched history.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Fetch straight from the network without the Parquet cache.
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        /// Skip the live quote lookup.
        #[arg(long, default_value_t = false)]
        no_live: bool,

        /// Pretty-print the JSON output.
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Print the default pipeline configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbols,
            days,
            start,
            end,
            config,
            csv,
            synthetic,
            cache_dir,
            no_cache,
            no_live,
            pretty,
        } => {
            let config = match config {
                Some(path) => PipelineConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            let window = history_window(days, start.as_deref(), end.as_deref())?;
            let source = SourceOptions {
                csv,
                synthetic,
                cache_dir,
                no_cache,
                no_live,
            };
            run_analyze(config, symbols, window, source, pretty)
        }
        Commands::Config => {
            print!("{}", PipelineConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradeterm=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

struct SourceOptions {
    csv: Option<PathBuf>,
    synthetic: bool,
    cache_dir: PathBuf,
    no_cache: bool,
    no_live: bool,
}

/// `None` means the configured default lookback.
fn history_window(
    days: Option<u32>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<HistoryWindow>> {
    match (days, start, end) {
        (Some(days), _, _) => Ok(Some(HistoryWindow::LookbackDays(days))),
        (None, Some(start), Some(end)) => Ok(Some(HistoryWindow::Range {
            start: parse_date(start)?,
            end: parse_date(end)?,
        })),
        (None, None, None) => Ok(None),
        _ => bail!("--start and --end must be given together"),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

fn build_pipeline(config: PipelineConfig, source: SourceOptions) -> Result<Pipeline> {
    let provider: Box<dyn DataProvider> = if source.synthetic {
        Box::new(SyntheticProvider::new(config.classifier.seed))
    } else if let Some(path) = source.csv {
        Box::new(CsvProvider::new(path))
    } else {
        let yahoo = YahooProvider::new(config.provider.clone())?;
        if source.no_cache {
            Box::new(yahoo)
        } else {
            Box::new(CachedProvider::new(yahoo, ParquetCache::new(source.cache_dir)))
        }
    };

    let quotes: Option<Box<dyn QuoteSource>> = if source.no_live || source.synthetic {
        None
    } else {
        Some(Box::new(YahooQuoteSource::new(config.provider.clone())?))
    };

    let pipeline = Pipeline::new(config, provider);
    Ok(match quotes {
        Some(quotes) => pipeline.with_quote_source(quotes),
        None => pipeline,
    })
}

fn run_analyze(
    config: PipelineConfig,
    symbols: Vec<String>,
    window: Option<HistoryWindow>,
    source: SourceOptions,
    pretty: bool,
) -> Result<()> {
    let pipeline = build_pipeline(config, source)?;

    let results: Vec<PipelineResult> = symbols
        .par_iter()
        .map(|symbol| {
            let request = match &window {
                Some(window) => PipelineRequest::new(symbol.as_str(), *window),
                None => pipeline.default_request(symbol.as_str()),
            };
            pipeline.run(&request)
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_error()).count();
    info!(symbols = results.len(), failed, "analysis finished");

    let json = match (results.as_slice(), pretty) {
        ([single], true) => serde_json::to_string_pretty(single)?,
        ([single], false) => serde_json::to_string(single)?,
        (_, true) => serde_json::to_string_pretty(&results)?,
        (_, false) => serde_json::to_string(&results)?,
    };
    println!("{json}");

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
