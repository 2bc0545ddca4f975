//! Ignore-filter hasher adapter
//!
//! Wraps a delegate hasher with a set of path-glob ignore rules. A matching
//! resource is excluded outright; its content is never read.

use crate::archive::ArchiveEntry;
use crate::error::SnapshotError;
use crate::hashers::ResourceHasher;
use crate::snapshot::FileSnapshot;
use crate::types::{ContentHash, HashBuilder};
use glob::Pattern;
use std::path::Path;
use tracing::debug;

pub struct IgnoreFilterResourceHasher {
    patterns: Vec<Pattern>,
    delegate: Box<dyn ResourceHasher>,
}

impl IgnoreFilterResourceHasher {
    /// Build from glob sources. Invalid patterns are configuration errors.
    pub fn new(
        ignore_patterns: &[String],
        delegate: Box<dyn ResourceHasher>,
    ) -> Result<Self, SnapshotError> {
        let patterns = ignore_patterns
            .iter()
            .map(|source| {
                Pattern::new(source).map_err(|e| {
                    SnapshotError::Config(format!("invalid ignore pattern {source:?}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IgnoreFilterResourceHasher { patterns, delegate })
    }

    fn is_ignored(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(candidate))
    }
}

impl ResourceHasher for IgnoreFilterResourceHasher {
    fn hash_resource(&self, snapshot: &FileSnapshot) -> Result<Option<ContentHash>, SnapshotError> {
        if self.is_ignored(&snapshot.absolute_path) {
            debug!(path = %snapshot.absolute_path, "resource ignored by filter");
            return Ok(None);
        }
        self.delegate.hash_resource(snapshot)
    }

    fn hash_archive_entry(
        &self,
        archive_path: &Path,
        entry: &ArchiveEntry,
    ) -> Result<Option<ContentHash>, SnapshotError> {
        if self.is_ignored(&entry.name) {
            debug!(archive = %archive_path.display(), entry = %entry.name, "archive entry ignored by filter");
            return Ok(None);
        }
        self.delegate.hash_archive_entry(archive_path, entry)
    }

    fn append_configuration(&self, builder: &mut HashBuilder) {
        self.delegate.append_configuration(builder);
        builder.put_str("ignore-filter");
        for pattern in &self.patterns {
            builder.put_str(pattern.as_str());
        }
    }
}
