//! PriceMatrix — date-indexed closes, one column per ticker.
//!
//! Rows are the ascending union of every instrument's dates. Columns follow the
//! instrument universe order and hold `Cell`s, so a gap stays `Absent` rather
//! than silently turning into a zero price.

use super::provider::DataError;
use crate::domain::{Cell, DatasetHash};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Date × ticker matrix of closes.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    columns: Vec<Vec<Cell>>,
}

impl PriceMatrix {
    /// Assemble a matrix, checking every shape invariant.
    ///
    /// - at least one ticker, no duplicates
    /// - dates strictly ascending
    /// - one column per ticker, each as long as `dates`
    pub fn new(
        dates: Vec<NaiveDate>,
        tickers: Vec<String>,
        columns: Vec<Vec<Cell>>,
    ) -> Result<Self, DataError> {
        if tickers.is_empty() {
            return Err(DataError::EmptyUniverse);
        }

        let mut seen = HashSet::new();
        for ticker in &tickers {
            if !seen.insert(ticker.as_str()) {
                return Err(DataError::DuplicateTicker {
                    ticker: ticker.clone(),
                });
            }
        }

        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(DataError::Shape(format!(
                "dates must be strictly ascending: {} is followed by {}",
                pair[0], pair[1]
            )));
        }

        if columns.len() != tickers.len() {
            return Err(DataError::Shape(format!(
                "{} columns for {} tickers",
                columns.len(),
                tickers.len()
            )));
        }
        for (ticker, column) in tickers.iter().zip(&columns) {
            if column.len() != dates.len() {
                return Err(DataError::Shape(format!(
                    "column '{ticker}' has {} cells, expected {}",
                    column.len(),
                    dates.len()
                )));
            }
        }

        Ok(Self {
            dates,
            tickers,
            columns,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    pub fn column(&self, ticker: &str) -> Option<&[Cell]> {
        self.column_index(ticker).map(|i| self.columns[i].as_slice())
    }

    /// Column by position. Panics if `index >= n_cols()`.
    pub fn column_at(&self, index: usize) -> &[Cell] {
        &self.columns[index]
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.columns[col][row]
    }

    /// First and last date, if the matrix has any rows.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }

    /// Count absent cells per ticker.
    pub fn gap_report(&self) -> GapReport {
        let per_ticker = self
            .tickers
            .iter()
            .zip(&self.columns)
            .map(|(ticker, column)| TickerGaps {
                ticker: ticker.clone(),
                absent: column.iter().filter(|c| c.is_absent()).count(),
            })
            .collect();
        GapReport {
            rows: self.n_rows(),
            per_ticker,
        }
    }

    /// Compute a deterministic BLAKE3 hash over dates, tickers and cells.
    ///
    /// Present and computed cells with equal values hash differently, as do
    /// absent cells and zeros.
    pub fn fingerprint(&self) -> DatasetHash {
        let mut hasher = blake3::Hasher::new();
        for date in &self.dates {
            hasher.update(date.to_string().as_bytes());
        }
        for (ticker, column) in self.tickers.iter().zip(&self.columns) {
            hasher.update(ticker.as_bytes());
            hasher.update(&[0]);
            for cell in column {
                match cell {
                    Cell::Absent => {
                        hasher.update(&[0]);
                    }
                    Cell::Present(v) => {
                        hasher.update(&[1]);
                        hasher.update(&v.to_le_bytes());
                    }
                    Cell::Computed(v) => {
                        hasher.update(&[2]);
                        hasher.update(&v.to_le_bytes());
                    }
                }
            }
        }
        DatasetHash(hasher.finalize().to_hex().to_string())
    }
}

/// Absent-cell count for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerGaps {
    pub ticker: String,
    pub absent: usize,
}

/// Data-gap diagnostics for a matrix.
///
/// Gaps are not errors: labeling and featurization fill them with zero. This
/// report keeps them observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    pub rows: usize,
    pub per_ticker: Vec<TickerGaps>,
}

impl GapReport {
    pub fn total_absent(&self) -> usize {
        self.per_ticker.iter().map(|g| g.absent).sum()
    }

    pub fn has_gaps(&self) -> bool {
        self.total_absent() > 0
    }

    /// Tickers with no observation at all (no overlap with the matrix dates).
    pub fn empty_tickers(&self) -> Vec<&str> {
        self.per_ticker
            .iter()
            .filter(|g| self.rows > 0 && g.absent == self.rows)
            .map(|g| g.ticker.as_str())
            .collect()
    }

    pub fn absent_for(&self, ticker: &str) -> Option<usize> {
        self.per_ticker
            .iter()
            .find(|g| g.ticker == ticker)
            .map(|g| g.absent)
    }
}
