//! Persistent store collaborator boundary
//!
//! The on-disk key/value store is an external concern: cross-process file
//! locking and the storage format belong to the implementor. This core only
//! consumes the interface. A sled-backed default and an in-memory test double
//! are provided.

pub mod sled_store;

pub use sled_store::SledStore;

use crate::error::StoreError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Opaque key/value store. Values are serialized blobs; keys are strings.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn flush(&self) -> Result<(), StoreError>;
}

/// HashMap-backed store for tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl PersistentStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store_roundtrip() {
        let store = InMemoryStore::new();
        store.put("k", b"value").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"value".to_vec()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
