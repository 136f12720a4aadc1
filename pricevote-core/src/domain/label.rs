//! Three-class direction label and per-class counts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the target over the labeling horizon.
///
/// Variant order matches the numeric value, so `Ord` sorts Sell < Hold < Buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Sell,
    Hold,
    Buy,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Sell, Label::Hold, Label::Buy];

    pub fn as_i8(self) -> i8 {
        match self {
            Label::Sell => -1,
            Label::Hold => 0,
            Label::Buy => 1,
        }
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Label::Sell),
            0 => Some(Label::Hold),
            1 => Some(Label::Buy),
            _ => None,
        }
    }

    /// Dense index in `0..3`, usable for per-class arrays.
    pub fn index(self) -> usize {
        match self {
            Label::Sell => 0,
            Label::Hold => 1,
            Label::Buy => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Per-class counts ("data spread" of a label column or prediction vector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassCounts {
    pub sell: usize,
    pub hold: usize,
    pub buy: usize,
}

impl ClassCounts {
    pub fn from_labels(labels: &[Label]) -> Self {
        let mut counts = Self::default();
        for &label in labels {
            counts.increment(label);
        }
        counts
    }

    pub fn increment(&mut self, label: Label) {
        match label {
            Label::Sell => self.sell += 1,
            Label::Hold => self.hold += 1,
            Label::Buy => self.buy += 1,
        }
    }

    pub fn get(&self, label: Label) -> usize {
        match label {
            Label::Sell => self.sell,
            Label::Hold => self.hold,
            Label::Buy => self.buy,
        }
    }

    pub fn total(&self) -> usize {
        self.sell + self.hold + self.buy
    }

    /// Number of classes with at least one member.
    pub fn distinct_classes(&self) -> usize {
        Label::ALL.iter().filter(|&&l| self.get(l) > 0).count()
    }
}

impl fmt::Display for ClassCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{-1: {}, 0: {}, 1: {}}}", self.sell, self.hold, self.buy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_round_trip() {
        for label in Label::ALL {
            assert_eq!(Label::from_i8(label.as_i8()), Some(label));
            assert_eq!(Label::from_index(label.index()), Some(label));
        }
        assert_eq!(Label::from_i8(2), None);
    }

    #[test]
    fn ordering_follows_value() {
        assert!(Label::Sell < Label::Hold);
        assert!(Label::Hold < Label::Buy);
    }

    #[test]
    fn counts_and_display() {
        let counts = ClassCounts::from_labels(&[Label::Buy, Label::Hold, Label::Buy]);
        assert_eq!(counts.buy, 2);
        assert_eq!(counts.hold, 1);
        assert_eq!(counts.sell, 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.distinct_classes(), 2);
        assert_eq!(counts.to_string(), "{-1: 0, 0: 1, 1: 2}");
    }
}
