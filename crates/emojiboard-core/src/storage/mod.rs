//! Storage abstraction for document persistence.

mod autosave;
mod file;
mod memory;

pub use autosave::{Autosaver, DEFAULT_DEBOUNCE};
pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Storage errors. These never reach the editing path: writes log and
/// swallow them, and a failed startup read degrades to an empty document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A durable location holding at most one persisted document.
///
/// Implementations can back this with a file, a database row, or an
/// in-memory buffer for tests.
pub trait DocumentStore: Send + Sync {
    /// Read the persisted bytes, or `None` if nothing has been written yet.
    fn read(&self) -> StoreResult<Option<Vec<u8>>>;

    /// Replace the persisted bytes.
    fn write(&self, bytes: &[u8]) -> StoreResult<()>;
}
