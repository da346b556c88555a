//! File-backed document store.

use super::{DocumentStore, StoreError, StoreResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores the document as a single JSON file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store writing to `path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn new(path: PathBuf) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Io(format!("failed to create storage directory: {e}"))
                })?;
            }
        }
        Ok(Self { path })
    }

    /// Create a store in the platform's local data directory
    /// (`.../emojiboard/board.json`).
    pub fn default_location() -> StoreResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StoreError::Io("could not determine home directory".to_string()))?;
        Self::new(base.join("emojiboard").join("board.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileStore {
    fn read(&self) -> StoreResult<Option<Vec<u8>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read(&self.path)
            .map(Some)
            .map_err(|e| StoreError::Io(format!("failed to read {}: {e}", self.path.display())))
    }

    fn write(&self, bytes: &[u8]) -> StoreResult<()> {
        fs::write(&self.path, bytes)
            .map_err(|e| StoreError::Io(format!("failed to write {}: {e}", self.path.display())))
    }
}
