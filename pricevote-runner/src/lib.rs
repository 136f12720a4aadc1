//! PriceVote Runner — config, tabular store, file feeds, pipeline runs, reports.
//!
//! This crate builds on `pricevote-core` to provide:
//! - TOML pipeline configuration
//! - CSV tabular store for the compiled price matrix, plus label export
//! - Ticker list files and per-ticker CSV feeds
//! - Single-ticker training and universe sweeps
//! - JSON / CSV / Markdown report export

pub mod config;
pub mod export;
pub mod feed;
pub mod pipeline;
pub mod store;

pub use config::{ConfigError, PipelineConfig};
pub use export::{
    export_sweep_csv, export_sweep_json, export_training_json, generate_report,
    generate_sweep_report, import_sweep_json, import_training_json, write_json,
};
pub use feed::{CsvDirFeed, TickerListFile};
pub use pipeline::{
    log_split_policy, run_sweep, train_ticker, MemberScore, PipelineError, SweepFailure,
    SweepReport, TrainingReport, SCHEMA_VERSION,
};
pub use store::{load_matrix, save_matrix, write_label_frame};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn reports_are_send_sync() {
        assert_send::<TrainingReport>();
        assert_sync::<TrainingReport>();
        assert_send::<SweepReport>();
        assert_sync::<SweepReport>();
    }

    #[test]
    fn pipeline_error_is_send_sync() {
        assert_send::<PipelineError>();
        assert_sync::<PipelineError>();
    }

    #[test]
    fn feeds_are_send_sync() {
        assert_send::<CsvDirFeed>();
        assert_sync::<CsvDirFeed>();
        assert_send::<TickerListFile>();
        assert_sync::<TickerListFile>();
    }
}
