//! Pipeline runner — wires together labels, features, split and committee.
//!
//! Two entry points:
//! - `train_ticker()`: one target ticker against the whole matrix. Used by
//!   the `train` command.
//! - `run_sweep()`: every ticker (or the first `limit`) as target in turn,
//!   optionally on the rayon pool. Results keep universe order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use pricevote_core::data::{DataError, PriceMatrix};
use pricevote_core::domain::{ClassCounts, DatasetHash, RunId};
use pricevote_core::features::{extract_features, FeatureError};
use pricevote_core::labels::{generate_labels, LabelError};
use pricevote_core::models::{
    accuracy, split, Classifier, Committee, ModelError, SplitStrategy,
};
use pricevote_core::rng::{RngHierarchy, SeedStream};

use crate::config::{ConfigError, PipelineConfig};

/// Errors from the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("label error: {0}")]
    Label(#[from] LabelError),
    #[error("feature error: {0}")]
    Feature(#[from] FeatureError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("'{ticker}' has {rows} usable rows, at least {required} required")]
    InsufficientData {
        ticker: String,
        rows: usize,
        required: usize,
    },
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Held-out accuracy of one committee member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberScore {
    pub name: String,
    pub accuracy: f64,
}

/// Outcome of training the committee for one target ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub ticker: String,
    pub dataset_hash: String,
    pub config_hash: String,
    pub seed: u64,
    pub split: SplitStrategy,
    /// Committee accuracy on the test rows.
    pub accuracy: f64,
    pub member_scores: Vec<MemberScore>,
    /// Label counts over every matrix row, before invalid rows are dropped.
    pub label_distribution: ClassCounts,
    /// Committee predictions on the test rows.
    pub predicted_distribution: ClassCounts,
    pub matrix_rows: usize,
    pub dropped_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub n_features: usize,
}

/// A ticker the sweep could not train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub ticker: String,
    pub error: String,
}

/// Outcome of a universe sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub dataset_hash: String,
    pub config_hash: String,
    pub seed: u64,
    pub reports: Vec<TrainingReport>,
    pub failures: Vec<SweepFailure>,
    /// Mean committee accuracy over trained tickers (None if none trained).
    pub mean_accuracy: Option<f64>,
}

impl SweepReport {
    pub fn attempted(&self) -> usize {
        self.reports.len() + self.failures.len()
    }
}

/// Warn once per run when the split can leak future rows into training.
pub fn log_split_policy(config: &PipelineConfig) {
    if config.split.is_leaky() {
        warn!(
            split = config.split.name(),
            "random split on time series: test rows may precede training rows"
        );
    }
}

/// Train and score the committee for one target ticker.
pub fn train_ticker(
    matrix: &PriceMatrix,
    ticker: &str,
    config: &PipelineConfig,
) -> Result<TrainingReport, PipelineError> {
    config.validate()?;
    let config_hash = config.config_hash()?;
    let dataset_hash = matrix.fingerprint();
    train_with_hashes(matrix, ticker, config, &dataset_hash.0, &config_hash)
}

fn train_with_hashes(
    matrix: &PriceMatrix,
    ticker: &str,
    config: &PipelineConfig,
    dataset_hash: &str,
    config_hash: &str,
) -> Result<TrainingReport, PipelineError> {
    let frame = generate_labels(matrix, ticker, &config.label)?;
    let features = extract_features(matrix, &frame)?;

    if features.n_rows() < config.min_rows {
        return Err(PipelineError::InsufficientData {
            ticker: ticker.to_string(),
            rows: features.n_rows(),
            required: config.min_rows,
        });
    }

    let seeds = RngHierarchy::new(config.seed);
    let mut split_rng = seeds.rng_for(ticker, SeedStream::Split, 0);
    let parts = split(&features.x, &features.y, config.split, &mut split_rng)?;

    let forest_seed = seeds.sub_seed(ticker, SeedStream::Forest, 0);
    let mut committee = Committee::standard(&config.committee, forest_seed)?;
    committee.fit(&parts.train_x, &parts.train_y)?;

    let predicted = committee.predict(&parts.test_x)?;
    let score = accuracy(&predicted, &parts.test_y)?;
    let member_scores = committee
        .member_scores(&parts.test_x, &parts.test_y)?
        .into_iter()
        .map(|(name, score)| MemberScore {
            name,
            accuracy: score,
        })
        .collect();

    let run_id = RunId::new(DatasetHash::from_hash(dataset_hash), ticker, config.seed);
    let report = TrainingReport {
        schema_version: SCHEMA_VERSION,
        run_id: run_id.hash(),
        ticker: ticker.to_string(),
        dataset_hash: dataset_hash.to_string(),
        config_hash: config_hash.to_string(),
        seed: config.seed,
        split: config.split,
        accuracy: score,
        member_scores,
        label_distribution: frame.distribution(),
        predicted_distribution: ClassCounts::from_labels(&predicted),
        matrix_rows: matrix.n_rows(),
        dropped_rows: features.dropped_rows,
        train_rows: parts.train_rows.len(),
        test_rows: parts.test_rows.len(),
        n_features: features.n_features(),
    };

    info!(
        run = %run_id,
        accuracy = report.accuracy,
        spread = %report.label_distribution,
        predicted = %report.predicted_distribution,
        "committee trained"
    );
    Ok(report)
}

/// Train every ticker of the matrix (or the first `limit`) as target.
///
/// A ticker that fails is recorded in `failures` and the sweep continues.
/// Config errors abort before any training.
pub fn run_sweep(
    matrix: &PriceMatrix,
    config: &PipelineConfig,
    limit: Option<usize>,
) -> Result<SweepReport, PipelineError> {
    config.validate()?;
    let config_hash = config.config_hash()?;
    let dataset_hash = matrix.fingerprint().0;

    let tickers: Vec<&str> = matrix
        .tickers()
        .iter()
        .map(String::as_str)
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    info!(
        tickers = tickers.len(),
        parallel = config.parallel,
        dataset = &dataset_hash[..dataset_hash.len().min(12)],
        "starting sweep"
    );

    let run_one =
        |ticker: &str| train_with_hashes(matrix, ticker, config, &dataset_hash, &config_hash);
    // Collecting a parallel iterator preserves input order
    let outcomes: Vec<Result<TrainingReport, PipelineError>> = if config.parallel {
        tickers.par_iter().map(|&t| run_one(t)).collect()
    } else {
        tickers.iter().map(|&t| run_one(t)).collect()
    };

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (&ticker, outcome) in tickers.iter().zip(outcomes) {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!(ticker, error = %e, "skipping ticker");
                failures.push(SweepFailure {
                    ticker: ticker.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    let mean_accuracy = if reports.is_empty() {
        None
    } else {
        Some(reports.iter().map(|r| r.accuracy).sum::<f64>() / reports.len() as f64)
    };
    debug!(trained = reports.len(), failed = failures.len(), "sweep finished");
    if let Some(mean) = mean_accuracy {
        info!(mean_accuracy = mean, trained = reports.len(), "sweep complete");
    }

    Ok(SweepReport {
        schema_version: SCHEMA_VERSION,
        dataset_hash,
        config_hash,
        seed: config.seed,
        reports,
        failures,
        mean_accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use pricevote_core::domain::Cell;

    fn wave_matrix(n: usize) -> PriceMatrix {
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let dates = (0..n).map(|i| start + Duration::days(i as i64)).collect();
        let wave = |phase: f64, level: f64| -> Vec<Cell> {
            (0..n)
                .map(|i| Cell::Present(level * (1.0 + 0.05 * ((i as f64 + phase) * 0.4).sin())))
                .collect()
        };
        let flat = vec![Cell::Present(50.0); n];
        PriceMatrix::new(
            dates,
            vec!["UP".into(), "DOWN".into(), "FLAT".into()],
            vec![wave(0.0, 100.0), wave(2.0, 30.0), flat],
        )
        .unwrap()
    }

    fn fast_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.committee.forest.n_trees = 10;
        config
    }

    #[test]
    fn report_counts_add_up() {
        let matrix = wave_matrix(80);
        let report = train_ticker(&matrix, "UP", &fast_config()).unwrap();

        assert_eq!(report.ticker, "UP");
        assert_eq!(report.matrix_rows, 80);
        assert_eq!(report.train_rows + report.test_rows + report.dropped_rows, 80);
        assert_eq!(report.test_rows, 20);
        assert_eq!(report.n_features, 3);
        assert_eq!(report.predicted_distribution.total(), report.test_rows);
        assert_eq!(report.label_distribution.total(), 80);
        assert_eq!(report.member_scores.len(), 3);
        assert!((0.0..=1.0).contains(&report.accuracy));
    }

    #[test]
    fn training_is_deterministic() {
        let matrix = wave_matrix(60);
        let a = train_ticker(&matrix, "UP", &fast_config()).unwrap();
        let b = train_ticker(&matrix, "UP", &fast_config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn largest_seed_trains_and_sweeps() {
        let matrix = wave_matrix(60);
        let config = PipelineConfig {
            seed: u64::MAX,
            ..fast_config()
        };
        let report = train_ticker(&matrix, "UP", &config).unwrap();
        assert_eq!(report.seed, u64::MAX);
        assert_eq!(report.config_hash, config.config_hash().unwrap());

        let sweep = run_sweep(&matrix, &config, Some(2)).unwrap();
        assert_eq!(sweep.seed, u64::MAX);
    }

    #[test]
    fn too_few_rows_fail() {
        let matrix = wave_matrix(15);
        let err = train_ticker(&matrix, "UP", &fast_config()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData {
                rows: 15,
                required: 20,
                ..
            }
        ));
    }

    #[test]
    fn flat_target_is_degenerate() {
        let matrix = wave_matrix(40);
        let err = train_ticker(&matrix, "FLAT", &fast_config()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Model(ModelError::DegenerateLabels { classes: 1 })
        ));
    }

    #[test]
    fn unknown_ticker_is_a_label_error() {
        let matrix = wave_matrix(40);
        let err = train_ticker(&matrix, "NOPE", &fast_config()).unwrap_err();
        assert!(matches!(err, PipelineError::Label(LabelError::UnknownTicker { .. })));
    }

    #[test]
    fn sweep_keeps_universe_order_and_records_failures() {
        let matrix = wave_matrix(60);
        let sweep = run_sweep(&matrix, &fast_config(), None).unwrap();

        assert_eq!(sweep.attempted(), 3);
        let trained: Vec<&str> = sweep.reports.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(trained, vec!["UP", "DOWN"]);
        assert_eq!(sweep.failures.len(), 1);
        assert_eq!(sweep.failures[0].ticker, "FLAT");

        let mean = (sweep.reports[0].accuracy + sweep.reports[1].accuracy) / 2.0;
        assert_eq!(sweep.mean_accuracy, Some(mean));
    }

    #[test]
    fn parallel_and_sequential_sweeps_agree() {
        let matrix = wave_matrix(60);
        let parallel = run_sweep(&matrix, &fast_config(), None).unwrap();
        let sequential = run_sweep(
            &matrix,
            &PipelineConfig {
                parallel: false,
                ..fast_config()
            },
            None,
        )
        .unwrap();
        assert_eq!(parallel.reports, sequential.reports);
        assert_eq!(parallel.mean_accuracy, sequential.mean_accuracy);
    }

    #[test]
    fn sweep_limit_takes_leading_tickers() {
        let matrix = wave_matrix(60);
        let sweep = run_sweep(&matrix, &fast_config(), Some(1)).unwrap();
        assert_eq!(sweep.attempted(), 1);
        assert_eq!(sweep.reports[0].ticker, "UP");
    }
}
