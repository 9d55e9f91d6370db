//! Position stream: continuous location watching as an explicit subscription.
//!
//! A [`PositionSource`] is the platform capability. It pushes events into a
//! channel for as long as a watch is active. [`PositionStream`] owns the
//! receiving end, so stopping the stream discards anything still buffered:
//! once `stop` returns, no event from that watch is ever handed out.
//!
//! Sources may call back at any rate, from any thread.

mod scripted;

use std::sync::mpsc::{self, Receiver, Sender};

use jiff::SignedDuration;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::PositionFix;

pub use scripted::ScriptedSource;

/// Accuracy versus battery trade-off for location sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PowerMode {
    /// Low latency, high accuracy.
    #[default]
    HighAccuracy,

    /// Coarser, older fixes to conserve battery.
    PowerSaving,
}

/// Sampling parameters handed to the platform when a watch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,

    /// Oldest cached fix the platform may return.
    pub maximum_age: SignedDuration,

    /// How long a single fix may take before a timeout is reported.
    pub timeout: SignedDuration,
}

impl WatchOptions {
    pub fn for_power_mode(mode: PowerMode) -> Self {
        match mode {
            PowerMode::HighAccuracy => Self {
                high_accuracy: true,
                maximum_age: SignedDuration::from_secs(10),
                timeout: SignedDuration::from_secs(15),
            },
            PowerMode::PowerSaving => Self {
                high_accuracy: false,
                maximum_age: SignedDuration::from_secs(30),
                timeout: SignedDuration::from_secs(15),
            },
        }
    }
}

/// Why the location source could not deliver a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "kebab-case")]
pub enum PositionError {
    /// The user refused location access. Terminal until walk mode is re-enabled.
    #[error("location permission denied")]
    PermissionDenied,

    /// This platform has no location capability. Terminal.
    #[error("location unavailable")]
    Unavailable,

    /// A single fix took too long. The watch carries on.
    #[error("location fix timed out")]
    Timeout,
}

impl PositionError {
    /// Whether the watch cannot recover on its own.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Timeout)
    }
}

/// What a watch delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(PositionFix),
    Error(PositionError),
}

/// A platform location capability.
pub trait PositionSource {
    /// Starts a background watch that pushes events into `sink`.
    ///
    /// Fails immediately when the capability is missing or refused.
    fn watch(
        &mut self,
        options: WatchOptions,
        sink: Sender<PositionEvent>,
    ) -> Result<(), PositionError>;

    /// Cancels the current watch, if any.
    fn clear_watch(&mut self);
}

/// A started-or-stopped subscription to a [`PositionSource`].
pub struct PositionStream<S> {
    source: S,
    receiver: Option<Receiver<PositionEvent>>,
    options: Option<WatchOptions>,
}

impl<S: PositionSource> PositionStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            receiver: None,
            options: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    /// Starts watching in `mode`. Returns whether a new watch was started.
    ///
    /// A no-op when already watching with the same options. A different mode
    /// restarts the watch.
    pub fn start(&mut self, mode: PowerMode) -> Result<bool, PositionError> {
        let options = WatchOptions::for_power_mode(mode);
        if self.is_active() {
            if self.options == Some(options) {
                return Ok(false);
            }
            self.stop();
        }

        let (sink, receiver) = mpsc::channel();
        self.source.watch(options, sink)?;
        debug!("position watch started ({mode:?})");
        self.receiver = Some(receiver);
        self.options = Some(options);
        Ok(true)
    }

    /// Stops watching and drops anything not yet handed out. Idempotent.
    pub fn stop(&mut self) {
        if self.receiver.take().is_some() {
            self.source.clear_watch();
            debug!("position watch stopped");
        }
    }

    /// Next pending event, if the stream is active and one is waiting.
    pub fn next_event(&mut self) -> Option<PositionEvent> {
        self.receiver.as_ref()?.try_recv().ok()
    }
}
