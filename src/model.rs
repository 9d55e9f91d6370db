//! Core data model for stroll.
//!
//! These types describe what a walk is made of:
//! routes and their stops, coordinates, and the position fixes that
//! arrive while walking.

mod fix;
mod route;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub use fix::PositionFix;
pub use route::{Route, RouteCatalog, RouteError, Stop};

/// A point on the earth's surface, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

/// Which stop arrival detection measures toward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// The stop currently being narrated.
    Current,

    /// The upcoming stop, clamped to the last one.
    #[default]
    Next,
}

impl TargetMode {
    /// Short label used in status text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Next => "next",
        }
    }

    /// Index of the stop to measure toward.
    ///
    /// `stop_count` must be non-zero. Never wraps past the final stop.
    pub fn target_index(self, active_index: usize, stop_count: usize) -> usize {
        let last = stop_count.saturating_sub(1);
        match self {
            Self::Current => active_index.min(last),
            Self::Next => (active_index + 1).min(last),
        }
    }
}

impl FromStr for TargetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "current" => Ok(Self::Current),
            "next" => Ok(Self::Next),
            other => Err(format!("unknown target mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_target_is_clamped_to_last_stop() {
        for count in 2..6 {
            for active in 0..count {
                let target = TargetMode::Next.target_index(active, count);
                assert!(target <= count - 1);
            }
        }
        assert_eq!(TargetMode::Next.target_index(0, 3), 1);
        assert_eq!(TargetMode::Next.target_index(2, 3), 2);
    }

    #[test]
    fn current_target_is_the_active_stop() {
        assert_eq!(TargetMode::Current.target_index(1, 3), 1);
    }

    #[test]
    fn parses_target_modes() {
        assert_eq!("current".parse::<TargetMode>().unwrap(), TargetMode::Current);
        assert_eq!(" next ".parse::<TargetMode>().unwrap(), TargetMode::Next);
        assert!("previous".parse::<TargetMode>().is_err());
    }
}
