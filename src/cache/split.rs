//! Split cache routing
//!
//! Routes each lookup between two backing caches: a global tier for files
//! under an immutable store root (resolved dependency artifacts and the like,
//! content-addressed and never mutated after creation) and a local tier for
//! everything else. Global entries survive across builds and projects; local
//! entries stay subject to the timestamp inspector's staleness rule applied
//! by the caching hasher.

use crate::cache::{CacheEntry, FileHashCache};
use crate::error::SnapshotError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct SplitFileHashCache {
    global: Arc<dyn FileHashCache>,
    local: Arc<dyn FileHashCache>,
    immutable_roots: Vec<PathBuf>,
}

impl SplitFileHashCache {
    pub fn new(
        global: Arc<dyn FileHashCache>,
        local: Arc<dyn FileHashCache>,
        immutable_roots: Vec<PathBuf>,
    ) -> Self {
        SplitFileHashCache {
            global,
            local,
            immutable_roots,
        }
    }

    /// Cache keys are `<namespace>:<absolute path>`; the namespace hex never
    /// contains a separator, so the path is everything after the first colon.
    fn path_of(key: &str) -> &Path {
        match key.split_once(':') {
            Some((_, path)) => Path::new(path),
            None => Path::new(key),
        }
    }

    fn backing(&self, key: &str) -> &Arc<dyn FileHashCache> {
        let path = Self::path_of(key);
        if self.immutable_roots.iter().any(|root| path.starts_with(root)) {
            &self.global
        } else {
            &self.local
        }
    }
}

impl FileHashCache for SplitFileHashCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, SnapshotError> {
        self.backing(key).get(key)
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), SnapshotError> {
        self.backing(key).put(key, entry)
    }
}
