//! Collaborator traits and structured error types.
//!
//! The ticker source and the price feed live outside the core. These traits
//! abstract over them (ticker list files, per-ticker CSV directories, in-memory
//! fixtures) so the pipeline can be driven and mocked without touching disk.

use crate::domain::PriceSeries;
use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("duplicate date {date} in series for '{ticker}'")]
    DuplicateDate { ticker: String, date: NaiveDate },

    #[error("dates out of order for '{ticker}': {previous} is followed by {next}")]
    UnsortedDates {
        ticker: String,
        previous: NaiveDate,
        next: NaiveDate,
    },

    #[error("duplicate ticker '{ticker}' in universe")]
    DuplicateTicker { ticker: String },

    #[error("unknown ticker '{ticker}'")]
    UnknownTicker { ticker: String },

    #[error("instrument universe is empty")]
    EmptyUniverse,

    #[error("no price data for '{ticker}'")]
    NoData { ticker: String },

    #[error("matrix shape error: {0}")]
    Shape(String),

    #[error("tabular store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Supplies the instrument universe.
pub trait TickerSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Ordered, duplicate-free list of tickers.
    fn tickers(&self) -> Result<Vec<String>, DataError>;
}

/// Supplies one price series per ticker.
///
/// Implementations return `DataError::NoData` when they simply have nothing for
/// a ticker; the matrix builder treats that as a gap rather than a failure.
pub trait PriceFeed {
    /// Human-readable name of this feed.
    fn name(&self) -> &str;

    fn fetch(&self, ticker: &str) -> Result<PriceSeries, DataError>;
}

/// A fixed ticker list.
#[derive(Debug, Clone, Default)]
pub struct StaticTickers(pub Vec<String>);

impl TickerSource for StaticTickers {
    fn name(&self) -> &str {
        "static"
    }

    fn tickers(&self) -> Result<Vec<String>, DataError> {
        Ok(self.0.clone())
    }
}

/// In-memory feed, mostly for tests and synthetic runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeed {
    series: HashMap<String, PriceSeries>,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.ticker().to_string(), series);
    }
}

impl PriceFeed for InMemoryFeed {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, ticker: &str) -> Result<PriceSeries, DataError> {
        self.series
            .get(ticker)
            .cloned()
            .ok_or_else(|| DataError::NoData {
                ticker: ticker.to_string(),
            })
    }
}
