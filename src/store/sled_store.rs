//! Sled-backed persistent store.

use crate::error::StoreError;
use crate::store::PersistentStore;
use std::path::Path;

/// Default on-disk implementation of the store collaborator. Sled owns the
/// file format and the cross-process locking.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(SledStore { db })
    }
}

impl PersistentStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sled_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store");
        {
            let store = SledStore::open(&path).unwrap();
            store.put("file-hash:/a", b"payload").unwrap();
            store.flush().unwrap();
        }
        let reopened = SledStore::open(&path).unwrap();
        assert_eq!(reopened.get("file-hash:/a").unwrap(), Some(b"payload".to_vec()));
    }
}
