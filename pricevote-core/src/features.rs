//! Feature extraction.
//!
//! Turns a price matrix and a target's label frame into a model-ready
//! `FeatureSet`:
//!
//! 1. drop rows whose horizon returns are not all finite
//! 2. per-ticker row-over-row percent change over the surviving rows
//!    (first surviving row is 0)
//! 3. sanitize: infinities and NaN become 0
//!
//! Columns follow the matrix ticker order, target included.

use crate::data::PriceMatrix;
use crate::domain::{Cell, ClassCounts, Label};
use crate::labels::LabelFrame;
use chrono::NaiveDate;
use ndarray::Array2;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("label frame has {label_rows} rows but the price matrix has {matrix_rows}")]
    Misaligned {
        matrix_rows: usize,
        label_rows: usize,
    },
}

/// Model input: `x` rows aligned 1:1 with `y`.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub x: Array2<f64>,
    pub y: Vec<Label>,
    /// Date of each surviving row.
    pub dates: Vec<NaiveDate>,
    /// Column names of `x`.
    pub tickers: Vec<String>,
    /// Rows removed for non-finite horizon returns.
    pub dropped_rows: usize,
}

impl FeatureSet {
    pub fn n_rows(&self) -> usize {
        self.y.len()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn label_counts(&self) -> ClassCounts {
        ClassCounts::from_labels(&self.y)
    }

    /// Feature column for a ticker.
    pub fn column(&self, ticker: &str) -> Option<Vec<f64>> {
        let idx = self.tickers.iter().position(|t| t == ticker)?;
        Some(self.x.column(idx).to_vec())
    }
}

/// Relative change from `previous` to `current`. No guarding.
pub fn pct_change(previous: f64, current: f64) -> f64 {
    (current - previous) / previous
}

/// Replace every non-finite value with 0. Returns how many were replaced.
///
/// Idempotent: a second pass replaces nothing.
pub fn sanitize_in_place(x: &mut Array2<f64>) -> usize {
    let mut replaced = 0;
    x.mapv_inplace(|v| {
        if v.is_finite() {
            v
        } else {
            replaced += 1;
            0.0
        }
    });
    replaced
}

/// Build `X` and `y` for the label frame's target.
pub fn extract_features(
    matrix: &PriceMatrix,
    labels: &LabelFrame,
) -> Result<FeatureSet, FeatureError> {
    if labels.n_rows() != matrix.n_rows() {
        return Err(FeatureError::Misaligned {
            matrix_rows: matrix.n_rows(),
            label_rows: labels.n_rows(),
        });
    }

    let kept: Vec<usize> = (0..matrix.n_rows())
        .filter(|&t| labels.is_row_valid(t))
        .collect();
    let dropped_rows = matrix.n_rows() - kept.len();

    let mut x = Array2::<f64>::zeros((kept.len(), matrix.n_cols()));
    for col in 0..matrix.n_cols() {
        let prices = matrix.column_at(col);
        let changes = percent_changes(prices, &kept);
        for (row, cell) in changes.into_iter().enumerate() {
            x[[row, col]] = cell.value().unwrap_or(f64::NAN);
        }
    }
    let replaced = sanitize_in_place(&mut x);

    let y: Vec<Label> = kept.iter().map(|&t| labels.labels()[t]).collect();
    let dates: Vec<NaiveDate> = kept.iter().map(|&t| matrix.dates()[t]).collect();

    debug!(
        ticker = labels.ticker(),
        rows = y.len(),
        features = x.ncols(),
        dropped_rows,
        replaced,
        "features extracted"
    );

    Ok(FeatureSet {
        x,
        y,
        dates,
        tickers: matrix.tickers().to_vec(),
        dropped_rows,
    })
}

/// Percent change between consecutive kept rows, absent prices read as 0.
/// The first kept row has no predecessor and is `Absent`.
fn percent_changes(prices: &[Cell], kept: &[usize]) -> Vec<Cell> {
    let mut out = Vec::with_capacity(kept.len());
    let mut previous: Option<f64> = None;
    for &t in kept {
        let current = prices[t].or_zero();
        out.push(match previous {
            Some(p) => Cell::Computed(pct_change(p, current)),
            None => Cell::Absent,
        });
        previous = Some(current);
    }
    out
}
