//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Join union — matrix dates are the union of input dates, cells present
//!    exactly where a series had a point
//! 2. Threshold strictness — a return equal to the threshold is Hold, one
//!    past it crosses
//! 3. First crossing wins — the earliest horizon past the threshold decides
//! 4. Sanitize idempotence — a second pass replaces nothing
//! 5. Row alignment — X and y always have the same number of rows

use chrono::{Duration, NaiveDate};
use ndarray::Array2;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use pricevote_core::data::{build_price_matrix, PriceMatrix};
use pricevote_core::domain::{Cell, Label, PricePoint, PriceSeries};
use pricevote_core::features::{extract_features, sanitize_in_place};
use pricevote_core::labels::{classify, generate_labels, LabelConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap() + Duration::days(offset as i64)
}

/// A set of day offsets with a close for each.
fn arb_series_points() -> impl Strategy<Value = Vec<(u32, f64)>> {
    prop::collection::btree_map(0u32..60, 1.0..500.0_f64, 0..25)
        .prop_map(|m| m.into_iter().collect())
}

fn arb_return() -> impl Strategy<Value = f64> {
    (-0.1..0.1_f64).prop_map(|r| (r * 1e4).round() / 1e4)
}

/// A price cell: mostly present, sometimes absent, occasionally zero.
fn arb_cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        8 => (1.0..200.0_f64).prop_map(Cell::Present),
        1 => Just(Cell::Absent),
        1 => Just(Cell::Present(0.0)),
    ]
}

fn arb_matrix() -> impl Strategy<Value = PriceMatrix> {
    (1usize..4, 0usize..30).prop_flat_map(|(cols, rows)| {
        prop::collection::vec(prop::collection::vec(arb_cell(), rows), cols).prop_map(
            move |columns| {
                let dates = (0..rows as u32).map(day).collect();
                let tickers = (0..cols).map(|i| format!("T{i}")).collect();
                PriceMatrix::new(dates, tickers, columns).unwrap()
            },
        )
    })
}

fn arb_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![
            6 => -10.0..10.0_f64,
            1 => Just(f64::NAN),
            1 => Just(f64::INFINITY),
            1 => Just(f64::NEG_INFINITY),
        ],
        0..40,
    )
}

// ── 1. Join Union ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn join_is_union_of_dates(a in arb_series_points(), b in arb_series_points()) {
        let mut series = HashMap::new();
        for (name, pts) in [("A", &a), ("B", &b)] {
            let points = pts.iter().map(|&(d, c)| PricePoint::new(day(d), c)).collect();
            series.insert(name.to_string(), PriceSeries::new(name, points).unwrap());
        }
        let universe = vec!["A".to_string(), "B".to_string()];
        let matrix = build_price_matrix(&universe, &series).unwrap();

        let expected: BTreeSet<NaiveDate> =
            a.iter().chain(&b).map(|&(d, _)| day(d)).collect();
        prop_assert_eq!(matrix.dates().to_vec(), expected.into_iter().collect::<Vec<_>>());

        for (col, pts) in [&a, &b].into_iter().enumerate() {
            let by_date: HashMap<NaiveDate, f64> =
                pts.iter().map(|&(d, c)| (day(d), c)).collect();
            for (row, date) in matrix.dates().iter().enumerate() {
                match by_date.get(date) {
                    Some(&c) => prop_assert_eq!(matrix.cell(row, col), Cell::Present(c)),
                    None => prop_assert!(matrix.cell(row, col).is_absent()),
                }
            }
        }
    }
}

// ── 2. Threshold Strictness ──────────────────────────────────────────

proptest! {
    #[test]
    fn return_at_threshold_is_hold(tau in 0.0..0.2_f64, horizons in 1usize..10) {
        prop_assert_eq!(classify(vec![tau; horizons], tau), Label::Hold);
        prop_assert_eq!(classify(vec![-tau; horizons], tau), Label::Hold);
    }

    #[test]
    fn return_past_threshold_crosses(
        tau in 0.0..0.2_f64,
        eps in 1e-6..0.1_f64,
        horizons in 1usize..10,
    ) {
        prop_assert_eq!(classify(vec![tau + eps; horizons], tau), Label::Buy);
        prop_assert_eq!(classify(vec![-(tau + eps); horizons], tau), Label::Sell);
    }
}

// ── 3. First Crossing Wins ───────────────────────────────────────────

proptest! {
    #[test]
    fn earliest_crossing_decides(returns in prop::collection::vec(arb_return(), 1..10)) {
        let tau = 0.02;
        let expected = returns
            .iter()
            .find_map(|&r| {
                if r > tau {
                    Some(Label::Buy)
                } else if r < -tau {
                    Some(Label::Sell)
                } else {
                    None
                }
            })
            .unwrap_or(Label::Hold);
        prop_assert_eq!(classify(returns.iter().copied(), tau), expected);
    }
}

// ── 4. Sanitize Idempotence ──────────────────────────────────────────

proptest! {
    #[test]
    fn sanitize_is_idempotent(values in arb_values()) {
        let n = values.len();
        let mut x = Array2::from_shape_vec((n, 1), values.clone()).unwrap();
        let replaced = sanitize_in_place(&mut x);

        prop_assert_eq!(replaced, values.iter().filter(|v| !v.is_finite()).count());
        prop_assert!(x.iter().all(|v| v.is_finite()));

        let once = x.clone();
        prop_assert_eq!(sanitize_in_place(&mut x), 0);
        prop_assert_eq!(x, once);
    }
}

// ── 5. Row Alignment ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn features_and_labels_stay_aligned(matrix in arb_matrix(), horizons in 1usize..8) {
        let config = LabelConfig { horizons, ..Default::default() };
        let frame = generate_labels(&matrix, "T0", &config).unwrap();
        prop_assert_eq!(frame.n_rows(), matrix.n_rows());

        let features = extract_features(&matrix, &frame).unwrap();
        prop_assert_eq!(features.x.nrows(), features.y.len());
        prop_assert_eq!(features.dates.len(), features.y.len());
        prop_assert_eq!(features.n_features(), matrix.n_cols());
        prop_assert_eq!(features.n_rows() + features.dropped_rows, matrix.n_rows());
        prop_assert!(features.x.iter().all(|v| v.is_finite()));
    }
}
