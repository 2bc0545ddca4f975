//! Build session lifecycle
//!
//! Owns the build-boundary state and fans out the two lifecycle
//! notifications: "build starting" captures the boundary timestamp, "build
//! finished" persists it and, for processes that outlive a single build,
//! drops the volatile front caches.

use crate::cache::{
    CacheCapSizer, CachingFileHasher, FileHashCache, InMemoryFrontCache,
    PersistentFileHashCache, SplitFileHashCache, FILE_HASHES_CACHE_SIZE,
};
use crate::config::ImprintConfig;
use crate::error::SnapshotError;
use crate::store::PersistentStore;
use crate::timestamp::TimestampInspector;
use crate::types::ContentHash;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct BuildSession {
    inspector: Arc<TimestampInspector>,
    store: Arc<dyn PersistentStore>,
    /// Front caches to drop at build completion when the process may serve
    /// multiple unrelated builds.
    volatile_caches: RwLock<Vec<Arc<InMemoryFrontCache>>>,
    drop_caches_on_finish: bool,
}

impl BuildSession {
    pub fn new(
        scope_dir: &Path,
        store: Arc<dyn PersistentStore>,
        drop_caches_on_finish: bool,
    ) -> Result<Self, SnapshotError> {
        let inspector = Arc::new(TimestampInspector::open(scope_dir)?);
        Ok(BuildSession {
            inspector,
            store,
            volatile_caches: RwLock::new(Vec::new()),
            drop_caches_on_finish,
        })
    }

    pub fn inspector(&self) -> Arc<TimestampInspector> {
        self.inspector.clone()
    }

    pub fn store(&self) -> Arc<dyn PersistentStore> {
        self.store.clone()
    }

    pub fn register_volatile_cache(&self, cache: Arc<InMemoryFrontCache>) {
        self.volatile_caches.write().push(cache);
    }

    pub fn on_build_start(&self) {
        self.inspector.on_build_start();
        info!(
            this_build = self.inspector.this_build_timestamp(),
            last_build = self.inspector.last_build_timestamp(),
            "build boundary captured"
        );
    }

    pub fn on_build_finish(&self) -> Result<(), SnapshotError> {
        self.inspector.on_build_finish()?;
        self.store.flush().map_err(SnapshotError::from)?;
        if self.drop_caches_on_finish {
            for cache in self.volatile_caches.read().iter() {
                cache.clear();
            }
        }
        Ok(())
    }

    /// Wire the standard cache stack for this session: a persistent tier
    /// behind split global/local front caches sized to the configured heap.
    /// The fronts are registered as volatile with this session.
    pub fn standard_file_hasher(
        &self,
        config: &ImprintConfig,
        namespace: ContentHash,
    ) -> CachingFileHasher {
        let sizer = if config.short_lived_process {
            CacheCapSizer::short_lived(config.max_heap_mb)
        } else {
            CacheCapSizer::new(config.max_heap_mb)
        };
        let capacity = sizer.scale(FILE_HASHES_CACHE_SIZE);
        let persistent: Arc<dyn FileHashCache> =
            Arc::new(PersistentFileHashCache::new(self.store.clone()));
        let global = Arc::new(InMemoryFrontCache::new(capacity, Some(persistent.clone())));
        let local = Arc::new(InMemoryFrontCache::new(capacity, Some(persistent)));
        self.register_volatile_cache(global.clone());
        self.register_volatile_cache(local.clone());
        let split = Arc::new(SplitFileHashCache::new(
            global,
            local,
            config.immutable_roots.clone(),
        ));
        CachingFileHasher::new(split, self.inspector(), namespace)
            .with_immutable_roots(config.immutable_roots.clone())
    }
}
