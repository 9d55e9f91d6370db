//! A position source driven by hand: track replays and tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc::Sender};

use super::{PositionError, PositionEvent, PositionSource, WatchOptions};

/// A cloneable handle to a hand-driven location source.
///
/// The controller owns one clone through its stream; the driver keeps
/// another and calls [`emit`](Self::emit) the way a platform would call back.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    sink: Option<Sender<PositionEvent>>,
    options: Option<WatchOptions>,
    refusal: Option<PositionError>,
    watch_count: usize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every watch is refused with `error`.
    #[cfg(test)]
    pub fn refusing(error: PositionError) -> Self {
        let source = Self::default();
        source.set_refusal(Some(error));
        source
    }

    /// Refuse future watches with `error`, or accept them again with `None`.
    pub fn set_refusal(&self, error: Option<PositionError>) {
        self.lock().refusal = error;
    }

    /// Delivers an event to the current watch.
    ///
    /// Returns false when nobody is watching and the event was dropped.
    pub fn emit(&self, event: PositionEvent) -> bool {
        let mut inner = self.lock();
        let Some(sink) = &inner.sink else {
            return false;
        };
        if sink.send(event).is_ok() {
            true
        } else {
            // Receiver is gone without a clear_watch; treat as cancelled.
            inner.sink = None;
            false
        }
    }

    #[cfg(test)]
    pub fn is_watching(&self) -> bool {
        self.lock().sink.is_some()
    }

    /// Options of the most recent watch.
    #[cfg(test)]
    pub fn options(&self) -> Option<WatchOptions> {
        self.lock().options
    }

    /// How many watches have been started.
    #[cfg(test)]
    pub fn watch_count(&self) -> usize {
        self.lock().watch_count
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PositionSource for ScriptedSource {
    fn watch(
        &mut self,
        options: WatchOptions,
        sink: Sender<PositionEvent>,
    ) -> Result<(), PositionError> {
        let mut inner = self.lock();
        if let Some(error) = inner.refusal {
            return Err(error);
        }
        inner.sink = Some(sink);
        inner.options = Some(options);
        inner.watch_count += 1;
        Ok(())
    }

    fn clear_watch(&mut self) {
        self.lock().sink = None;
    }
}
