//! Trading signal labels and the classifier's per-run result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete trading signal.
///
/// Three encodings coexist:
/// - class value: Sell = -1, Hold = 0, Buy = 1 (label construction)
/// - training index: Sell = 0, Hold = 1, Buy = 2 (non-negative, for boosting)
/// - display string: "SELL" / "HOLD" / "BUY"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalLabel {
    Sell,
    Hold,
    Buy,
}

impl SignalLabel {
    pub const ALL: [SignalLabel; 3] = [SignalLabel::Sell, SignalLabel::Hold, SignalLabel::Buy];

    pub fn from_class(class: i8) -> Option<Self> {
        match class {
            -1 => Some(Self::Sell),
            0 => Some(Self::Hold),
            1 => Some(Self::Buy),
            _ => None,
        }
    }

    pub fn class(self) -> i8 {
        match self {
            Self::Sell => -1,
            Self::Hold => 0,
            Self::Buy => 1,
        }
    }

    /// Shifted encoding {-1, 0, 1} -> {0, 1, 2}.
    pub fn index(self) -> usize {
        (self.class() + 1) as usize
    }

    /// Inverse of [`SignalLabel::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::from_class(index as i8 - 1)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
            Self::Buy => "BUY",
        }
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal for the most recent bar plus the held-out accuracy of the model
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub label: SignalLabel,
    /// Fraction of correct predictions on the test slice, in [0, 1].
    pub accuracy: f64,
}

impl SignalResult {
    /// Result reported when the labels contain a single class.
    pub fn degenerate_hold() -> Self {
        Self {
            label: SignalLabel::Hold,
            accuracy: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_index_roundtrip() {
        for label in SignalLabel::ALL {
            assert_eq!(SignalLabel::from_class(label.class()), Some(label));
            assert_eq!(SignalLabel::from_index(label.index()), Some(label));
        }
        assert_eq!(SignalLabel::Sell.index(), 0);
        assert_eq!(SignalLabel::Buy.index(), 2);
        assert_eq!(SignalLabel::from_class(2), None);
    }

    #[test]
    fn serializes_as_screaming_case() {
        let json = serde_json::to_string(&SignalLabel::Buy).unwrap();
        assert_eq!(json, "\"BUY\"");
        assert_eq!(SignalLabel::Hold.to_string(), "HOLD");
    }
}
