//! PriceSeries — one instrument's daily adjusted closes.

use crate::data::DataError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single `(date, adjusted_close)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Time-ordered closes for one ticker.
///
/// Dates are strictly increasing; construction rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points that must already be in ascending date order.
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, DataError> {
        let ticker = ticker.into();
        for pair in points.windows(2) {
            let (prev, next) = (pair[0].date, pair[1].date);
            if prev == next {
                return Err(DataError::DuplicateDate { ticker, date: next });
            }
            if prev > next {
                return Err(DataError::UnsortedDates {
                    ticker,
                    previous: prev,
                    next,
                });
            }
        }
        Ok(Self { ticker, points })
    }

    /// Sort points by date first. Duplicate dates are still an error.
    pub fn from_unsorted(
        ticker: impl Into<String>,
        mut points: Vec<PricePoint>,
    ) -> Result<Self, DataError> {
        points.sort_by_key(|p| p.date);
        Self::new(ticker, points)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn accepts_increasing_dates() {
        let s = PriceSeries::new(
            "ADM.L",
            vec![
                PricePoint::new(d("2020-01-13"), 10.0),
                PricePoint::new(d("2020-01-14"), 10.5),
            ],
        )
        .unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.first_date(), Some(d("2020-01-13")));
        assert_eq!(s.last_date(), Some(d("2020-01-14")));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new(
            "ADM.L",
            vec![
                PricePoint::new(d("2020-01-13"), 10.0),
                PricePoint::new(d("2020-01-13"), 10.5),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, DataError::DuplicateDate { .. }));
    }

    #[test]
    fn rejects_unsorted_dates() {
        let err = PriceSeries::new(
            "ADM.L",
            vec![
                PricePoint::new(d("2020-01-14"), 10.0),
                PricePoint::new(d("2020-01-13"), 10.5),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, DataError::UnsortedDates { .. }));
    }

    #[test]
    fn from_unsorted_sorts() {
        let s = PriceSeries::from_unsorted(
            "ADM.L",
            vec![
                PricePoint::new(d("2020-01-14"), 10.5),
                PricePoint::new(d("2020-01-13"), 10.0),
            ],
        )
        .unwrap();
        assert_eq!(s.points()[0].close, 10.0);
    }

    #[test]
    fn empty_series_is_valid() {
        let s = PriceSeries::new("ADM.L", vec![]).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.first_date(), None);
    }
}
