//! Cell — a tri-state matrix value.
//!
//! A cell is either an observed price, a value the pipeline derived (returns,
//! percent changes), or explicitly absent. Absence survives until the final
//! sanitization boundary, where it collapses to 0.

use serde::{Deserialize, Serialize};

/// One matrix entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Cell {
    /// Observed in the price feed or the tabular store.
    Present(f64),
    /// No data for this date.
    #[default]
    Absent,
    /// Derived by the pipeline. May be non-finite until sanitized.
    Computed(f64),
}

impl Cell {
    /// The numeric value, if any. Non-finite computed values are returned as-is.
    pub fn value(self) -> Option<f64> {
        match self {
            Cell::Present(v) | Cell::Computed(v) => Some(v),
            Cell::Absent => None,
        }
    }

    pub fn is_absent(self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// Absent → 0, everything else untouched (NaN and ±inf included).
    ///
    /// This is the gap-fill applied to prices before returns are computed.
    pub fn or_zero(self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    /// Absent or non-finite → 0.
    pub fn sanitized(self) -> f64 {
        match self.value() {
            Some(v) if v.is_finite() => v,
            _ => 0.0,
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Absent, Cell::Present)
    }
}
