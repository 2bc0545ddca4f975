//! Build-boundary timestamp inspector
//!
//! Tracks the end of the previous build and the start of the current one for
//! a cache scope. A cached hash keyed by (length, mtime) is only trustworthy
//! when the file's mtime predates the current build boundary: filesystem
//! clocks can be too coarse to distinguish a write during this build from a
//! write at build start, and trusting such a timestamp risks a false cache
//! hit that masks a real change.

use crate::error::SnapshotError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const MARKER_FILE: &str = "last-build.bin";

/// Millis since the Unix epoch for a `SystemTime`.
pub fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn now_millis() -> u64 {
    epoch_millis(SystemTime::now())
}

/// Per-cache-scope boundary timestamps.
///
/// Owned by the build session and passed by handle to collaborators; there is
/// deliberately no process-global instance.
pub struct TimestampInspector {
    scope_dir: PathBuf,
    /// End of the previous build in this scope, 0 when none.
    last_build: AtomicU64,
    /// Start of the current build.
    this_build: AtomicU64,
}

impl TimestampInspector {
    /// Open the inspector for a cache scope directory, reading the previous
    /// boundary from the scope's marker file when present.
    pub fn open(scope_dir: &Path) -> Result<Self, SnapshotError> {
        fs::create_dir_all(scope_dir).map_err(|e| SnapshotError::io(scope_dir, e))?;
        let marker = scope_dir.join(MARKER_FILE);
        let last_build = match fs::metadata(&marker) {
            Ok(meta) => meta.modified().map(epoch_millis).unwrap_or(0),
            Err(_) => 0,
        };
        Ok(TimestampInspector {
            scope_dir: scope_dir.to_path_buf(),
            last_build: AtomicU64::new(last_build),
            this_build: AtomicU64::new(now_millis()),
        })
    }

    /// Capture the current build's boundary timestamp.
    pub fn on_build_start(&self) {
        self.this_build.store(now_millis(), Ordering::SeqCst);
    }

    /// Persist the boundary: the marker file's own mtime becomes the next
    /// build's `last_build_timestamp`.
    pub fn on_build_finish(&self) -> Result<(), SnapshotError> {
        let marker = self.scope_dir.join(MARKER_FILE);
        fs::write(&marker, b"").map_err(|e| SnapshotError::io(&marker, e))?;
        let persisted = fs::metadata(&marker)
            .and_then(|m| m.modified())
            .map(epoch_millis)
            .map_err(|e| SnapshotError::io(&marker, e))?;
        self.last_build.store(persisted, Ordering::SeqCst);
        Ok(())
    }

    pub fn last_build_timestamp(&self) -> u64 {
        self.last_build.load(Ordering::SeqCst)
    }

    pub fn this_build_timestamp(&self) -> u64 {
        self.this_build.load(Ordering::SeqCst)
    }

    /// Whether `file_timestamp` is precise enough to stand in for the file's
    /// content in a cache key. False means the caller must re-hash.
    pub fn timestamp_can_be_used_to_detect_file_change(
        &self,
        path: &Path,
        file_timestamp: u64,
    ) -> bool {
        let this_build = self.this_build.load(Ordering::SeqCst);
        if file_timestamp >= this_build {
            debug!(
                path = %path.display(),
                file_timestamp,
                this_build,
                "timestamp at or after build boundary, forcing re-hash"
            );
            return false;
        }
        true
    }

    #[cfg(test)]
    pub(crate) fn set_this_build_for_test(&self, millis: u64) {
        self.this_build.store(millis, Ordering::SeqCst);
    }
}
