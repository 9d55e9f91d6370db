//! Position fixes: where the walker is, as reported by the location source.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A single location reading.
///
/// Fixes arrive at irregular, sensor-dependent intervals and may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFix {
    #[serde(flatten)]
    pub coordinate: Coordinate,

    /// Accuracy radius in meters.
    #[serde(default)]
    pub accuracy: f64,

    /// When the fix was taken.
    pub at: Timestamp,
}

impl PositionFix {
    pub fn new(coordinate: Coordinate, accuracy: f64, at: Timestamp) -> Self {
        Self {
            coordinate,
            accuracy,
            at,
        }
    }
}
