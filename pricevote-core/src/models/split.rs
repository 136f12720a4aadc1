//! Train/test splitting.
//!
//! Two policies:
//! - `Random` (default): shuffled holdout. On time series this leaks future
//!   rows into training; `SplitStrategy::is_leaky` reports it.
//! - `Chronological`: the last rows are held out in their original order.
//!
//! Both hold out `ceil(test_fraction * n)` rows.

use super::ModelError;
use crate::domain::Label;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// How rows are assigned to the test set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitStrategy {
    Random { test_fraction: f64 },
    Chronological { test_fraction: f64 },
}

impl Default for SplitStrategy {
    fn default() -> Self {
        SplitStrategy::Random {
            test_fraction: 0.25,
        }
    }
}

impl SplitStrategy {
    pub fn test_fraction(&self) -> f64 {
        match *self {
            SplitStrategy::Random { test_fraction }
            | SplitStrategy::Chronological { test_fraction } => test_fraction,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SplitStrategy::Random { .. } => "random",
            SplitStrategy::Chronological { .. } => "chronological",
        }
    }

    /// True when test rows may precede training rows in time.
    pub fn is_leaky(&self) -> bool {
        matches!(self, SplitStrategy::Random { .. })
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let f = self.test_fraction();
        if !(f > 0.0 && f < 1.0) {
            return Err(ModelError::InvalidSplit(format!(
                "test_fraction must be in (0, 1), got {f}"
            )));
        }
        Ok(())
    }

    /// Number of test rows for `n` samples.
    pub fn test_size(&self, n: usize) -> usize {
        (self.test_fraction() * n as f64).ceil() as usize
    }
}

/// Result of a split. Row indices refer to the input matrix.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train_x: Array2<f64>,
    pub train_y: Vec<Label>,
    pub test_x: Array2<f64>,
    pub test_y: Vec<Label>,
    pub train_rows: Vec<usize>,
    pub test_rows: Vec<usize>,
}

/// Partition `x`/`y` into train and test sets. `rng` is only drawn from by
/// the random policy.
pub fn split(
    x: &Array2<f64>,
    y: &[Label],
    strategy: SplitStrategy,
    rng: &mut StdRng,
) -> Result<TrainTestSplit, ModelError> {
    strategy.validate()?;
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }

    let n = y.len();
    let n_test = strategy.test_size(n);
    if n_test == 0 || n_test >= n {
        return Err(ModelError::InsufficientData { rows: n, required: 2 });
    }

    let (train_rows, test_rows) = match strategy {
        SplitStrategy::Random { .. } => {
            let mut perm: Vec<usize> = (0..n).collect();
            perm.shuffle(rng);
            let train = perm.split_off(n_test);
            (train, perm)
        }
        SplitStrategy::Chronological { .. } => {
            let cut = n - n_test;
            ((0..cut).collect(), (cut..n).collect())
        }
    };

    Ok(TrainTestSplit {
        train_x: x.select(Axis(0), &train_rows),
        train_y: train_rows.iter().map(|&i| y[i]).collect(),
        test_x: x.select(Axis(0), &test_rows),
        test_y: test_rows.iter().map(|&i| y[i]).collect(),
        train_rows,
        test_rows,
    })
}
