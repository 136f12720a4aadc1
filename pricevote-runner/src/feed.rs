//! File-backed collaborators: ticker list files and per-ticker CSV feeds.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pricevote_core::data::{DataError, PriceFeed, TickerSource};
use pricevote_core::domain::{PricePoint, PriceSeries};
use tracing::debug;

/// Ticker universe read from a text file: one ticker per line, blank lines
/// and `#` comments ignored, duplicates dropped (first occurrence kept).
#[derive(Debug, Clone)]
pub struct TickerListFile {
    path: PathBuf,
}

impl TickerListFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Parse ticker list text.
pub fn parse_ticker_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}

impl TickerSource for TickerListFile {
    fn name(&self) -> &str {
        "ticker-list"
    }

    fn tickers(&self) -> Result<Vec<String>, DataError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| DataError::Io(format!("read {}: {e}", self.path.display())))?;
        let tickers = parse_ticker_list(&content);
        if tickers.is_empty() {
            return Err(DataError::EmptyUniverse);
        }
        Ok(tickers)
    }
}

/// Directory of `{TICKER}.csv` files with a `Date` column and an
/// `Adj Close` (or, failing that, `Close`) column.
///
/// A missing file is `NoData`, so the ticker becomes a gap in the matrix.
/// Rows whose close is empty, `null` or otherwise not a number are skipped.
#[derive(Debug, Clone)]
pub struct CsvDirFeed {
    dir: PathBuf,
}

impl CsvDirFeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }
}

impl PriceFeed for CsvDirFeed {
    fn name(&self) -> &str {
        "csv-dir"
    }

    fn fetch(&self, ticker: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(DataError::NoData {
                ticker: ticker.to_string(),
            });
        }
        let series = read_ticker_csv(ticker, &path)?;
        if series.is_empty() {
            return Err(DataError::NoData {
                ticker: ticker.to_string(),
            });
        }
        Ok(series)
    }
}

fn read_ticker_csv(ticker: &str, path: &Path) -> Result<PriceSeries, DataError> {
    let context = |msg: String| DataError::Store(format!("{}: {msg}", path.display()));

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| context(e.to_string()))?;

    let headers = rdr.headers().map_err(|e| context(e.to_string()))?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);
    let date_col = find("Date").ok_or_else(|| context("missing 'Date' column".into()))?;
    let close_col = find("Adj Close")
        .or_else(|| find("Close"))
        .ok_or_else(|| context("missing 'Adj Close' or 'Close' column".into()))?;

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.records() {
        let record = record.map_err(|e| context(e.to_string()))?;
        let line = record.position().map_or(0, |p| p.line());

        // Empty, "null" and other non-numeric closes
        let close = record.get(close_col).unwrap_or_default().parse::<f64>();
        let Some(close) = close.ok().filter(|c| c.is_finite()) else {
            skipped += 1;
            continue;
        };
        let raw_date = record.get(date_col).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| context(format!("line {line}: bad date '{raw_date}': {e}")))?;
        points.push(PricePoint::new(date, close));
    }

    debug!(ticker, points = points.len(), skipped, "ticker csv read");
    PriceSeries::from_unsorted(ticker, points)
}
