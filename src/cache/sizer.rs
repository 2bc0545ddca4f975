//! Heap-proportional cache sizing
//!
//! In-memory cache capacities scale with the heap the process is allowed to
//! use. Reference capacities were tuned against a reference heap; a smaller
//! or larger heap gets a proportionally smaller or larger cache, never less
//! than a tenth of the reference. Short-lived processes halve the result:
//! they will not live long enough to amortize a large working set.

/// Heap size the reference capacities were tuned against.
const REFERENCE_HEAP_MB: u64 = 910;

/// Reference capacity for the file-hash cache.
pub const FILE_HASHES_CACHE_SIZE: usize = 400_000;

#[derive(Debug, Clone, Copy)]
pub struct CacheCapSizer {
    max_heap_mb: u64,
    short_lived_process: bool,
}

impl CacheCapSizer {
    pub fn new(max_heap_mb: u64) -> Self {
        CacheCapSizer {
            max_heap_mb,
            short_lived_process: false,
        }
    }

    /// Constrained execution mode: roughly half the scaled size.
    pub fn short_lived(max_heap_mb: u64) -> Self {
        CacheCapSizer {
            max_heap_mb,
            short_lived_process: true,
        }
    }

    /// Scale a reference capacity to the configured heap, rounded down to
    /// hundreds with a floor of one tenth of the reference.
    pub fn scale(&self, reference: usize) -> usize {
        let scaled = (reference as u64).saturating_mul(self.max_heap_mb) / REFERENCE_HEAP_MB;
        let floor = (reference / 10) as u64;
        let mut capacity = scaled.max(floor);
        if self.short_lived_process {
            capacity /= 2;
        }
        let rounded = (capacity / 100) * 100;
        rounded.max(100) as usize
    }
}
