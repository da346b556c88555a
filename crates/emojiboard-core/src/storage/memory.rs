//! In-memory document store for tests and ephemeral use.

use super::{DocumentStore, StoreError, StoreResult};
use std::sync::RwLock;

/// Holds the persisted bytes in memory.
#[derive(Default)]
pub struct MemoryStore {
    contents: RwLock<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently persisted bytes, if any.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.contents.read().ok().and_then(|c| c.clone())
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self) -> StoreResult<Option<Vec<u8>>> {
        let contents = self
            .contents
            .read()
            .map_err(|e| StoreError::Other(format!("lock error: {e}")))?;
        Ok(contents.clone())
    }

    fn write(&self, bytes: &[u8]) -> StoreResult<()> {
        let mut contents = self
            .contents
            .write()
            .map_err(|e| StoreError::Other(format!("lock error: {e}")))?;
        *contents = Some(bytes.to_vec());
        Ok(())
    }
}
