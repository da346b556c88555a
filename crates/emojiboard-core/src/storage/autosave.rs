//! Debounced document persistence.
//!
//! Coalesces bursts of edits (a drag producing many intermediate moves)
//! into a single write: every change re-arms a deadline, and the write
//! only happens once the deadline passes without another change.

use super::DocumentStore;
use crate::document::{BoardDocument, DocumentError};
use log::{debug, error, warn};
use std::time::{Duration, Instant};

/// Default debounce interval between the last edit and the write.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(5);

/// Persists the current document to a [`DocumentStore`], debounced.
///
/// Driven from the owner thread: `note_change` on every snapshot
/// replacement, `tick` from the embedder's frame/poll loop. Replacing the
/// deadline in `note_change` is what invalidates a pending firing; there
/// is no timer thread to race with.
pub struct Autosaver<S: DocumentStore> {
    store: S,
    debounce: Duration,
    deadline: Option<Instant>,
}

impl<S: DocumentStore> Autosaver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            debounce: DEFAULT_DEBOUNCE,
            deadline: None,
        }
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// (Re)arm the save timer after a snapshot replacement.
    pub fn note_change(&mut self) {
        self.deadline = Some(Instant::now() + self.debounce);
    }

    /// Whether a save is scheduled but not yet fired.
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire a due save against the *current* snapshot (not the one that
    /// armed the timer). Returns whether a write was attempted.
    pub fn tick(&mut self, document: &BoardDocument) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {}
            _ => return false,
        }
        self.deadline = None;
        self.write(document);
        true
    }

    /// Write immediately, bypassing the debounce. For orderly shutdown.
    pub fn flush(&mut self, document: &BoardDocument) {
        self.deadline = None;
        self.write(document);
    }

    /// Load the previously persisted document, falling back to an empty
    /// board on any failure. Corruption never surfaces past startup.
    pub fn load(&self) -> BoardDocument {
        match self.store.read() {
            Ok(Some(bytes)) => match decode(&bytes) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("persisted document is corrupt, starting empty: {e}");
                    BoardDocument::new()
                }
            },
            Ok(None) => BoardDocument::new(),
            Err(e) => {
                warn!("could not read persisted document, starting empty: {e}");
                BoardDocument::new()
            }
        }
    }

    // Persistence failures must never interrupt editing; log and move on.
    fn write(&self, document: &BoardDocument) {
        match document.to_json() {
            Ok(json) => match self.store.write(json.as_bytes()) {
                Ok(()) => debug!("document saved"),
                Err(e) => error!("autosave write failed: {e}"),
            },
            Err(e) => error!("autosave encoding failed: {e}"),
        }
    }
}

fn decode(bytes: &[u8]) -> Result<BoardDocument, DocumentError> {
    let json = std::str::from_utf8(bytes).map_err(|e| DocumentError::Corrupt(e.to_string()))?;
    BoardDocument::from_json(json)
}
