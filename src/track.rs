//! Recorded walks: scripted event files for replaying walk mode.
//!
//! A track is JSONL, one event per line, replayed in file order:
//!
//! ```text
//! {"event":"enable"}
//! {"event":"fix","lat":21.3000,"lng":-157.8500,"accuracy":8,"at":"2024-05-01T08:00:00Z"}
//! {"event":"error","kind":"timeout"}
//! {"event":"hidden"}
//! {"event":"visible"}
//! {"event":"route","id":"waikiki"}
//! {"event":"stop","index":2}
//! {"event":"disable"}
//! {"event":"refuse","kind":"permission-denied"}
//! {"event":"grant"}
//! ```
//!
//! Blank lines are skipped.

use std::{fs, io, path::Path};

// Trait must be in scope for `.lines()` on `BufReader`.
use io::BufRead;

use serde::{Deserialize, Serialize};

use crate::model::PositionFix;
use crate::position::PositionError;

/// Errors that can occur while reading a track.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
}

/// One scripted input to walk mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TrackEvent {
    /// The location source reports a fix.
    Fix(PositionFix),

    /// The location source reports a failure.
    Error { kind: PositionError },

    /// The app goes to the background.
    Hidden,

    /// The app returns to the foreground.
    Visible,

    /// The walker turns walk mode on.
    Enable,

    /// The walker turns walk mode off.
    Disable,

    /// The walker picks another route.
    Route { id: String },

    /// The walker steps to a stop by hand.
    Stop { index: usize },

    /// The platform starts refusing location watches.
    Refuse { kind: PositionError },

    /// The platform accepts location watches again.
    Grant,
}

/// Loads a track file.
pub fn load(path: &Path) -> Result<Vec<TrackEvent>, TrackError> {
    let file = fs::File::open(path)?;
    parse(io::BufReader::new(file))
}

/// Parses track lines from any reader.
pub fn parse(reader: impl BufRead) -> Result<Vec<TrackEvent>, TrackError> {
    let mut events = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| TrackError::Json {
            line: i + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}
