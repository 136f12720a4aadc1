//! Multi-ticker time alignment.
//!
//! Given a price series per ticker, align them to a common timeline: the union
//! of every ticker's dates. A ticker with no close on some date gets an
//! `Absent` cell there (no forward-fill, no zero-fill).

use super::matrix::PriceMatrix;
use super::provider::{DataError, PriceFeed, TickerSource};
use crate::domain::{Cell, PriceSeries};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Outer-join price series on date.
///
/// Columns follow `universe` order. A universe ticker missing from `series`
/// becomes an all-absent column; series for tickers outside the universe are
/// ignored.
pub fn build_price_matrix(
    universe: &[String],
    series: &HashMap<String, PriceSeries>,
) -> Result<PriceMatrix, DataError> {
    if universe.is_empty() {
        return Err(DataError::EmptyUniverse);
    }

    // Collect the union of all dates
    let mut all_dates = BTreeSet::new();
    for ticker in universe {
        if let Some(s) = series.get(ticker) {
            all_dates.extend(s.points().iter().map(|p| p.date));
        }
    }
    let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

    let row_of: HashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let columns = universe
        .iter()
        .map(|ticker| {
            let mut column = vec![Cell::Absent; dates.len()];
            if let Some(s) = series.get(ticker) {
                for point in s.points() {
                    column[row_of[&point.date]] = Cell::Present(point.close);
                }
            }
            column
        })
        .collect();

    PriceMatrix::new(dates, universe.to_vec(), columns)
}

/// Pull the universe from `source`, fetch every ticker from `feed` and join.
///
/// `DataError::NoData` from the feed is a gap, logged and kept as an absent
/// column. Any other feed error aborts the build.
pub fn compile_matrix(
    source: &dyn TickerSource,
    feed: &dyn PriceFeed,
) -> Result<PriceMatrix, DataError> {
    let tickers = dedup_preserving_order(source.tickers()?);
    info!(
        source = source.name(),
        feed = feed.name(),
        tickers = tickers.len(),
        "compiling price matrix"
    );

    let mut series = HashMap::new();
    for (i, ticker) in tickers.iter().enumerate() {
        match feed.fetch(ticker) {
            Ok(s) => {
                debug!(ticker = %ticker, points = s.len(), "[{}/{}] loaded", i + 1, tickers.len());
                series.insert(ticker.clone(), s);
            }
            Err(DataError::NoData { .. }) => {
                warn!(ticker = %ticker, "no price data; column will be empty");
            }
            Err(e) => return Err(e),
        }
    }

    let matrix = build_price_matrix(&tickers, &series)?;
    let gaps = matrix.gap_report();
    if gaps.has_gaps() {
        warn!(
            absent = gaps.total_absent(),
            empty = gaps.empty_tickers().len(),
            "price matrix has gaps"
        );
    }
    Ok(matrix)
}

fn dedup_preserving_order(tickers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
