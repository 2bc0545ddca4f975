//! File hash caching
//!
//! Avoids re-reading unchanged content: a cached digest is reused only while
//! the file's (length, modified-time) pair still matches what was recorded
//! and the timestamp inspector vouches for the modified-time. Cache layers
//! (front, split, persistent) all speak [`FileHashCache`].

pub mod front;
pub mod sizer;
pub mod split;

pub use front::InMemoryFrontCache;
pub use sizer::{CacheCapSizer, FILE_HASHES_CACHE_SIZE};
pub use split::SplitFileHashCache;

use crate::error::SnapshotError;
use crate::store::PersistentStore;
use crate::timestamp::{epoch_millis, TimestampInspector};
use crate::types::ContentHash;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cached digest plus the file metadata it was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub length: u64,
    /// Modification time, millis since the Unix epoch.
    pub modified: u64,
    pub hash: ContentHash,
}

/// Thread-safe file-hash cache. Keys are namespaced absolute paths; values
/// are [`CacheEntry`] records. Visibility of a put to other threads in the
/// same process is immediate; cross-process visibility (through a persistent
/// tier) is only eventual and is kept safe by the timestamp inspector.
pub trait FileHashCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, SnapshotError>;
    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), SnapshotError>;
}

/// Hashes files through a [`FileHashCache`], re-reading content only when the
/// recorded metadata no longer matches or cannot be trusted.
pub struct CachingFileHasher {
    cache: Arc<dyn FileHashCache>,
    inspector: Arc<TimestampInspector>,
    /// Hasher-configuration identity; part of every cache key so a policy
    /// change invalidates all prior entries.
    namespace: ContentHash,
    /// Subtrees whose content never mutates after creation. Entries under
    /// them skip the timestamp-staleness rule.
    immutable_roots: Vec<PathBuf>,
}

impl CachingFileHasher {
    pub fn new(
        cache: Arc<dyn FileHashCache>,
        inspector: Arc<TimestampInspector>,
        namespace: ContentHash,
    ) -> Self {
        CachingFileHasher {
            cache,
            inspector,
            namespace,
            immutable_roots: Vec::new(),
        }
    }

    pub fn with_immutable_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.immutable_roots = roots;
        self
    }

    fn is_immutable(&self, path: &Path) -> bool {
        self.immutable_roots.iter().any(|root| path.starts_with(root))
    }

    fn cache_key(&self, path: &Path) -> String {
        format!("{}:{}", self.namespace, path.display())
    }

    /// Digest a regular file, via the cache when sound.
    pub fn hash_file(&self, path: &Path) -> Result<ContentHash, SnapshotError> {
        let metadata = std::fs::metadata(path).map_err(|e| SnapshotError::io(path, e))?;
        let length = metadata.len();
        let modified = metadata
            .modified()
            .map(epoch_millis)
            .map_err(|e| SnapshotError::io(path, e))?;

        let key = self.cache_key(path);
        if let Some(entry) = self.cache.get(&key)? {
            let metadata_unchanged = entry.length == length && entry.modified == modified;
            let timestamp_sound = self.is_immutable(path)
                || self
                    .inspector
                    .timestamp_can_be_used_to_detect_file_change(path, modified);
            if metadata_unchanged && timestamp_sound {
                debug!(path = %path.display(), "file hash cache hit");
                return Ok(entry.hash);
            }
        }

        let hash = hash_file_contents(path)?;
        self.cache.put(
            &key,
            CacheEntry {
                length,
                modified,
                hash,
            },
        )?;
        Ok(hash)
    }
}

/// Stream a file's bytes through the digest.
pub fn hash_file_contents(path: &Path) -> Result<ContentHash, SnapshotError> {
    let mut file = File::open(path).map_err(|e| SnapshotError::io(path, e))?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher).map_err(|e| SnapshotError::io(path, e))?;
    Ok(ContentHash::from_bytes(*hasher.finalize().as_bytes()))
}

/// Adapts the persistent store collaborator to [`FileHashCache`].
///
/// A value that fails to decode is reported with its key; a corrupt entry
/// silently treated as a miss would be indistinguishable from a content
/// change.
pub struct PersistentFileHashCache {
    store: Arc<dyn PersistentStore>,
}

impl PersistentFileHashCache {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        PersistentFileHashCache { store }
    }
}

impl FileHashCache for PersistentFileHashCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, SnapshotError> {
        match self.store.get(key)? {
            Some(bytes) => {
                let entry =
                    bincode::deserialize(&bytes).map_err(|e| SnapshotError::Serialization {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), SnapshotError> {
        let bytes = bincode::serialize(&entry).map_err(|e| {
            warn!(key, "failed to serialize cache entry");
            SnapshotError::Serialization {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.store.put(key, &bytes)?;
        Ok(())
    }
}
