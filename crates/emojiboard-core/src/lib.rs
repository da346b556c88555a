//! EmojiBoard core library.
//!
//! Platform-agnostic document model, editing engine, and persistence
//! pipeline for the EmojiBoard drawing-board editor: an immutable document
//! snapshot with stable emoji identities, its canonical JSON encoding,
//! snapshot-based undo/redo, an asynchronous background-image fetch
//! pipeline with staleness checks, and debounced autosave.
//!
//! Rendering, gesture handling, and platform file pickers live in
//! embedding applications; they drive the [`BoardSession`] intent API and
//! observe its published [`BoardEvent`]s.

pub mod document;
pub mod editor;
pub mod events;
pub mod fetch;
pub mod session;
pub mod storage;

pub use document::{Background, BoardDocument, DocumentError, Emoji, EmojiId};
pub use editor::BoardEditor;
pub use events::{BoardEvent, EventHub};
pub use fetch::{BackgroundLoader, FetchError, FetchStatus, ImageFetcher};
pub use session::BoardSession;
pub use storage::{
    Autosaver, DEFAULT_DEBOUNCE, DocumentStore, FileStore, MemoryStore, StoreError, StoreResult,
};
