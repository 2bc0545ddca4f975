//! In-memory front cache
//!
//! Capacity-bounded map in front of an optional slower tier. Reads populate
//! the map; writes go through to the delegate. When the owning process may
//! outlive a single build, the session can drop all entries at build
//! completion so unrelated builds never observe each other's working set.

use crate::cache::{CacheEntry, FileHashCache};
use crate::error::SnapshotError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

struct Stamped {
    stamp: u64,
    entry: CacheEntry,
}

pub struct InMemoryFrontCache {
    entries: RwLock<HashMap<String, Stamped>>,
    capacity: usize,
    tick: AtomicU64,
    delegate: Option<Arc<dyn FileHashCache>>,
}

impl InMemoryFrontCache {
    pub fn new(capacity: usize, delegate: Option<Arc<dyn FileHashCache>>) -> Self {
        InMemoryFrontCache {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            tick: AtomicU64::new(0),
            delegate,
        }
    }

    fn next_stamp(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    /// Drop every in-memory entry. The delegate tier is untouched.
    pub fn clear(&self) {
        let mut map = self.entries.write();
        let dropped = map.len();
        map.clear();
        debug!(dropped, "front cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Evict the oldest tenth when full. Batch eviction amortizes the scan;
    /// exact LRU order is not a correctness requirement.
    fn make_room(&self, map: &mut HashMap<String, Stamped>) {
        if map.len() < self.capacity {
            return;
        }
        let evict = (self.capacity / 10).max(1);
        let mut stamps: Vec<u64> = map.values().map(|s| s.stamp).collect();
        stamps.sort_unstable();
        let threshold = stamps[evict.min(stamps.len()) - 1];
        map.retain(|_, s| s.stamp > threshold);
    }
}

impl FileHashCache for InMemoryFrontCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, SnapshotError> {
        {
            let map = self.entries.read();
            if let Some(stamped) = map.get(key) {
                return Ok(Some(stamped.entry));
            }
        }
        if let Some(delegate) = &self.delegate {
            if let Some(entry) = delegate.get(key)? {
                let mut map = self.entries.write();
                self.make_room(&mut map);
                map.insert(
                    key.to_string(),
                    Stamped {
                        stamp: self.next_stamp(),
                        entry,
                    },
                );
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), SnapshotError> {
        if let Some(delegate) = &self.delegate {
            delegate.put(key, entry)?;
        }
        let mut map = self.entries.write();
        self.make_room(&mut map);
        map.insert(
            key.to_string(),
            Stamped {
                stamp: self.next_stamp(),
                entry,
            },
        );
        Ok(())
    }
}
