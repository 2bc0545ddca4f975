//! Resource and content hashers
//!
//! Pluggable hashing of individual resources: plain files on disk and entries
//! inside classpath archives. A hasher may decline to hash a resource
//! (`Ok(None)`), which excludes it from the snapshot; the ignore-filter
//! adapter uses this to drop irrelevant entries before any content is read.

pub mod ignore;

pub use ignore::IgnoreFilterResourceHasher;

use crate::archive::ArchiveEntry;
use crate::error::SnapshotError;
use crate::snapshot::{FileSnapshot, FileType};
use crate::types::{ContentHash, HashBuilder};
use std::fs;
use std::path::Path;

/// Pluggable resource digester.
pub trait ResourceHasher: Send + Sync {
    /// Hash a filesystem resource, or `None` to exclude it.
    fn hash_resource(&self, snapshot: &FileSnapshot) -> Result<Option<ContentHash>, SnapshotError>;

    /// Hash one archive entry from its bytes, or `None` to exclude it.
    fn hash_archive_entry(
        &self,
        archive_path: &Path,
        entry: &ArchiveEntry,
    ) -> Result<Option<ContentHash>, SnapshotError>;

    /// Fold this hasher's own configuration (algorithm tag, ignore rules)
    /// into a cache-key namespace. Changing the hashing policy thereby
    /// invalidates every cached result without an explicit migration.
    fn append_configuration(&self, builder: &mut HashBuilder);
}

/// Namespace hash for a hasher's configuration, used to key cached results.
pub fn configuration_hash(hasher: &dyn ResourceHasher) -> ContentHash {
    let mut builder = HashBuilder::new();
    hasher.append_configuration(&mut builder);
    builder.finish()
}

/// Runtime-classpath hasher: archive entries and files are raw bytes, no
/// interpretation of content.
pub struct RuntimeClasspathResourceHasher;

impl ResourceHasher for RuntimeClasspathResourceHasher {
    fn hash_resource(&self, snapshot: &FileSnapshot) -> Result<Option<ContentHash>, SnapshotError> {
        match snapshot.file_type {
            FileType::RegularFile => Ok(Some(snapshot.content)),
            FileType::Directory | FileType::Missing => Ok(None),
        }
    }

    fn hash_archive_entry(
        &self,
        _archive_path: &Path,
        entry: &ArchiveEntry,
    ) -> Result<Option<ContentHash>, SnapshotError> {
        Ok(Some(ContentHash::of(&entry.bytes)))
    }

    fn append_configuration(&self, builder: &mut HashBuilder) {
        builder.put_str("runtime-classpath/blake3");
    }
}

/// Coarse baseline content hasher: digests the raw file bytes directly, with
/// no archive-aware filtering. Not semantic class-file analysis.
pub struct ContentResourceHasher;

impl ResourceHasher for ContentResourceHasher {
    fn hash_resource(&self, snapshot: &FileSnapshot) -> Result<Option<ContentHash>, SnapshotError> {
        match snapshot.file_type {
            FileType::RegularFile => {
                let path = Path::new(&snapshot.absolute_path);
                let bytes = fs::read(path).map_err(|e| SnapshotError::io(path, e))?;
                Ok(Some(ContentHash::of(&bytes)))
            }
            FileType::Directory | FileType::Missing => Ok(None),
        }
    }

    fn hash_archive_entry(
        &self,
        _archive_path: &Path,
        entry: &ArchiveEntry,
    ) -> Result<Option<ContentHash>, SnapshotError> {
        Ok(Some(ContentHash::of(&entry.bytes)))
    }

    fn append_configuration(&self, builder: &mut HashBuilder) {
        builder.put_str("content/blake3");
    }
}
