//! Price data: collaborator traits, the price matrix and its builder.

pub mod align;
pub mod matrix;
pub mod provider;

pub use align::{build_price_matrix, compile_matrix};
pub use matrix::{GapReport, PriceMatrix, TickerGaps};
pub use provider::{DataError, InMemoryFeed, PriceFeed, StaticTickers, TickerSource};
