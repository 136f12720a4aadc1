//! Domain types for PriceVote

pub mod cell;
pub mod ids;
pub mod label;
pub mod series;

pub use cell::Cell;
pub use ids::{DatasetHash, RunId};
pub use label::{ClassCounts, Label};
pub use series::{PricePoint, PriceSeries};
