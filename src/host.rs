//! Host effects: what the walk engine asks of the app around it.
//!
//! The engine never renders, speaks, or vibrates by itself. It hands short
//! status lines, redraw frames, and arrival notices to a [`WalkHost`]. None of
//! these calls may fail the engine; narration failures are swallowed.

use std::fmt;

use crate::model::{Coordinate, Route, Stop, TargetMode};
use crate::position::PositionError;

/// Why narration could not start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NarrationError {
    /// Platform policy refused playback without a user gesture.
    #[error("playback blocked")]
    Blocked,

    #[error("no narration for stop '{0}'")]
    Missing(String),
}

/// Short, user-readable walk-mode status.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkStatus {
    Off,
    Seeking,
    Distance { meters: u32, target: TargetMode },
    Paused,
    Position(PositionError),
}

impl fmt::Display for WalkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("walk: off"),
            Self::Seeking => f.write_str("walk: seeking GPS…"),
            Self::Distance { meters, target } => {
                write!(f, "walk: {meters}m → {}", target.label())
            }
            Self::Paused => f.write_str("walk: paused (background)"),
            Self::Position(PositionError::PermissionDenied) => f.write_str("walk: GPS blocked"),
            Self::Position(PositionError::Unavailable) => f.write_str("walk: no GPS"),
            Self::Position(PositionError::Timeout) => f.write_str("walk: GPS timeout"),
        }
    }
}

/// A throttled redraw frame: where the walker is relative to the tour.
#[derive(Debug, Clone, PartialEq)]
pub struct Guidance {
    pub position: Coordinate,
    pub active_index: usize,
    pub target_index: usize,
    pub distance_m: u32,
    pub bearing_deg: f64,
    pub eta_to_target_secs: f64,
    pub eta_to_end_secs: f64,

    /// Distance to the route line; infinite when the route has no line.
    pub off_route_m: f64,
}

/// The app around the walk engine.
pub trait WalkHost {
    /// Shows a status line. Replaces the previous one.
    fn show_status(&mut self, status: &WalkStatus);

    /// Starts narration for `stop`.
    fn play_narration(&mut self, stop: &Stop) -> Result<(), NarrationError>;

    /// Haptic or toast on arrival. Fire and forget.
    fn notify_arrival(&mut self, _stop: &Stop) {}

    /// Redraws the map and guidance.
    fn redraw(&mut self, _guidance: &Guidance) {}

    /// The walker has strayed `_meters` from the route line.
    fn off_route(&mut self, _meters: f64) {}

    /// The final stop of `_route` was reached.
    fn tour_completed(&mut self, _route: &Route) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_status_lines() {
        let cases = [
            (WalkStatus::Off, "walk: off"),
            (WalkStatus::Seeking, "walk: seeking GPS…"),
            (
                WalkStatus::Distance {
                    meters: 42,
                    target: TargetMode::Next,
                },
                "walk: 42m → next",
            ),
            (
                WalkStatus::Distance {
                    meters: 7,
                    target: TargetMode::Current,
                },
                "walk: 7m → current",
            ),
            (WalkStatus::Paused, "walk: paused (background)"),
            (
                WalkStatus::Position(PositionError::PermissionDenied),
                "walk: GPS blocked",
            ),
            (WalkStatus::Position(PositionError::Unavailable), "walk: no GPS"),
            (WalkStatus::Position(PositionError::Timeout), "walk: GPS timeout"),
        ];
        for (status, expected) in cases {
            assert_eq!(status.to_string(), expected);
        }
    }
}
