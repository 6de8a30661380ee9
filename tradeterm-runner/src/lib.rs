//! TradeTerm Runner: pipeline orchestration on top of `tradeterm-core`.
//!
//! - Request validation and history-window resolution
//! - History loading (any provider) with canonicalization
//! - TOML pipeline configuration
//! - The Pipeline Orchestrator and its JSON result record

pub mod config;
pub mod data_loader;
pub mod pipeline;
pub mod request;
pub mod result;

pub use config::{ConfigError, HistoryConfig, PipelineConfig};
pub use data_loader::{load_history, LoadError, LoadedHistory, SyntheticProvider};
pub use pipeline::{analyze_bars, Pipeline};
pub use request::{HistoryWindow, PipelineRequest, RequestError};
pub use result::{ChartRow, PipelineResult};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn pipeline_is_shareable_across_workers() {
        assert_send::<Pipeline>();
        assert_sync::<Pipeline>();
    }

    #[test]
    fn records_are_send_sync() {
        assert_send::<PipelineResult>();
        assert_sync::<PipelineResult>();
        assert_send::<PipelineRequest>();
        assert_sync::<PipelineRequest>();
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
