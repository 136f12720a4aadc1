//! Classifiers and the voting committee.
//!
//! Every model implements `Classifier`. The committee only sees that trait, so
//! its membership can change without touching the vote aggregation.

pub mod committee;
pub mod decision_tree;
pub mod knn;
pub mod linear_svc;
pub mod random_forest;
pub mod split;

pub use committee::{accuracy, majority_vote, Committee, CommitteeConfig};
pub use decision_tree::{DecisionTree, TreeConfig};
pub use knn::{KNearestNeighbors, KnnConfig};
pub use linear_svc::{LinearSvc, LinearSvcConfig};
pub use random_forest::{ForestConfig, RandomForest};
pub use split::{split, SplitStrategy, TrainTestSplit};

use crate::domain::{ClassCounts, Label};
use ndarray::Array2;
use thiserror::Error;

/// Errors from model training, prediction and evaluation.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("insufficient data: {rows} rows, at least {required} required")]
    InsufficientData { rows: usize, required: usize },

    #[error("training labels contain {classes} distinct class(es); at least 2 are required")]
    DegenerateLabels { classes: usize },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("model '{model}' used before fit")]
    NotFitted { model: String },

    #[error("committee has no members")]
    EmptyCommittee,

    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("invalid model config: {0}")]
    InvalidConfig(String),
}

/// A trainable three-class classifier.
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Train on `x` (rows = samples) and aligned labels `y`. Refitting replaces
    /// any previous state.
    fn fit(&mut self, x: &Array2<f64>, y: &[Label]) -> Result<(), ModelError>;

    /// One label per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<Label>, ModelError>;
}

/// Shared training-input validation: matching lengths and at least one row.
pub(crate) fn check_training_input(x: &Array2<f64>, y: &[Label]) -> Result<(), ModelError> {
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if y.is_empty() {
        return Err(ModelError::InsufficientData {
            rows: 0,
            required: 1,
        });
    }
    Ok(())
}

/// Fail unless `y` has at least two distinct classes.
pub(crate) fn require_class_diversity(y: &[Label]) -> Result<(), ModelError> {
    let classes = ClassCounts::from_labels(y).distinct_classes();
    if classes < 2 {
        return Err(ModelError::DegenerateLabels { classes });
    }
    Ok(())
}

/// Fail unless `x` has the feature count seen during fit.
pub(crate) fn check_feature_count(
    model: &str,
    expected: usize,
    x: &Array2<f64>,
) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::ShapeMismatch(format!(
            "{model} was fit on {expected} features, got {}",
            x.ncols()
        )));
    }
    Ok(())
}

/// Index of the largest score. Ties go to the lowest class.
pub(crate) fn argmax_class(scores: &[f64; 3]) -> Label {
    let mut best = 0;
    for i in 1..3 {
        if scores[i] > scores[best] {
            best = i;
        }
    }
    Label::ALL[best]
}
