//! Published document events.
//!
//! The core has no UI dependency; embedders subscribe here and react to
//! snapshot replacements and background-resolution progress.

use crate::fetch::FetchStatus;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

/// Events published by the editing engine and the background loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The current snapshot was replaced (edit, undo, redo, or load).
    SnapshotReplaced,
    /// The background fetch status changed.
    FetchStatusChanged(FetchStatus),
    /// A background image finished resolving and is available to render.
    ImageResolved,
}

/// Fan-out hub for [`BoardEvent`]s.
///
/// Cloning the hub yields another handle to the same subscriber list, so
/// the editor and the loader publish into one stream. Subscribers that
/// drop their receiver are pruned on the next publish.
#[derive(Clone, Default)]
pub struct EventHub {
    subscribers: Arc<Mutex<Vec<Sender<BoardEvent>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its event stream.
    pub fn subscribe(&self) -> Receiver<BoardEvent> {
        let (tx, rx) = channel();
        self.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber.
    pub fn publish(&self, event: BoardEvent) {
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<BoardEvent>>> {
        // A poisoned subscriber list is still a usable subscriber list.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
