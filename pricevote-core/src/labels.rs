//! Forward-return labeling.
//!
//! For a target ticker, compute the forward return over each horizon
//! `1..=H` and reduce the horizons to one `Label` per row:
//!
//! - walk horizons in ascending order
//! - the first return strictly above `+threshold` yields `Buy`
//! - the first return strictly below `-threshold` yields `Sell`
//! - no crossing at all yields `Hold`
//!
//! This is an OR-reduction, not a majority vote: the earliest crossing decides.
//!
//! Gap policy: absent target prices are taken as 0 before returns are computed.
//! Horizons that run past the last row are `Absent`, and `0/0` returns are NaN;
//! both reduce as 0. `x/0` returns stay infinite so the feature extractor can
//! drop those rows.

use crate::data::PriceMatrix;
use crate::domain::{Cell, ClassCounts, Label};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_HORIZONS: usize = 7;
pub const DEFAULT_THRESHOLD: f64 = 0.02;

/// Labeling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Number of forward horizons, in trading rows.
    pub horizons: usize,
    /// Move threshold as a fraction (0.02 = 2%).
    pub threshold: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            horizons: DEFAULT_HORIZONS,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl LabelConfig {
    pub fn validate(&self) -> Result<(), LabelError> {
        if self.horizons == 0 {
            return Err(LabelError::InvalidConfig(
                "horizons must be at least 1".into(),
            ));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(LabelError::InvalidConfig(format!(
                "threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LabelError {
    #[error("target ticker '{ticker}' is not a column of the price matrix")]
    UnknownTicker { ticker: String },

    #[error("invalid label config: {0}")]
    InvalidConfig(String),
}

/// Relative change from `now` to `future`. No guarding: a zero `now` yields
/// NaN or ±inf.
pub fn forward_return(now: f64, future: f64) -> f64 {
    (future - now) / now
}

/// First-threshold-wins reduction over returns in ascending horizon order.
pub fn classify<I>(returns: I, threshold: f64) -> Label
where
    I: IntoIterator<Item = f64>,
{
    for r in returns {
        if r > threshold {
            return Label::Buy;
        }
        if r < -threshold {
            return Label::Sell;
        }
    }
    Label::Hold
}

/// Horizon returns and labels for one target ticker, aligned to matrix rows.
#[derive(Debug, Clone)]
pub struct LabelFrame {
    ticker: String,
    config: LabelConfig,
    dates: Vec<NaiveDate>,
    /// `returns[h][t]` is the return over horizon `h + 1` from row `t`.
    returns: Vec<Vec<Cell>>,
    labels: Vec<Label>,
}

impl LabelFrame {
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn config(&self) -> LabelConfig {
        self.config
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Raw return cells for a 1-based horizon.
    pub fn returns(&self, horizon: usize) -> Option<&[Cell]> {
        horizon
            .checked_sub(1)
            .and_then(|h| self.returns.get(h))
            .map(Vec::as_slice)
    }

    /// Return used by the reduction: absent and NaN become 0, infinities stay.
    pub fn filled_return(&self, horizon: usize, row: usize) -> f64 {
        fill_nan(self.returns[horizon - 1][row])
    }

    /// Filled returns for one row in ascending horizon order.
    pub fn row_returns(&self, row: usize) -> Vec<f64> {
        self.returns.iter().map(|col| fill_nan(col[row])).collect()
    }

    /// True when every filled horizon return of `row` is finite.
    pub fn is_row_valid(&self, row: usize) -> bool {
        self.returns.iter().all(|col| fill_nan(col[row]).is_finite())
    }

    /// Per-class counts of the label column.
    pub fn distribution(&self) -> ClassCounts {
        ClassCounts::from_labels(&self.labels)
    }

    /// Column name for a 1-based horizon, e.g. `ADM.L_3d`.
    pub fn horizon_column_name(&self, horizon: usize) -> String {
        format!("{}_{}d", self.ticker, horizon)
    }

    /// Column name of the label, e.g. `ADM.L_target`.
    pub fn target_column_name(&self) -> String {
        format!("{}_target", self.ticker)
    }
}

fn fill_nan(cell: Cell) -> f64 {
    match cell.value() {
        Some(v) if v.is_nan() => 0.0,
        Some(v) => v,
        None => 0.0,
    }
}

/// Compute horizon returns and labels for `ticker`.
pub fn generate_labels(
    matrix: &PriceMatrix,
    ticker: &str,
    config: &LabelConfig,
) -> Result<LabelFrame, LabelError> {
    config.validate()?;
    let column = matrix
        .column(ticker)
        .ok_or_else(|| LabelError::UnknownTicker {
            ticker: ticker.to_string(),
        })?;

    let prices: Vec<f64> = column.iter().map(|c| c.or_zero()).collect();
    let n = prices.len();

    let returns: Vec<Vec<Cell>> = (1..=config.horizons)
        .map(|h| {
            (0..n)
                .map(|t| {
                    if t + h < n {
                        Cell::Computed(forward_return(prices[t], prices[t + h]))
                    } else {
                        Cell::Absent
                    }
                })
                .collect()
        })
        .collect();

    let labels: Vec<Label> = (0..n)
        .map(|t| classify(returns.iter().map(|col| fill_nan(col[t])), config.threshold))
        .collect();

    let frame = LabelFrame {
        ticker: ticker.to_string(),
        config: *config,
        dates: matrix.dates().to_vec(),
        returns,
        labels,
    };
    debug!(
        ticker,
        rows = n,
        spread = %frame.distribution(),
        "labels generated"
    );
    Ok(frame)
}
