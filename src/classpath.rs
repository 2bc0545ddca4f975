//! Classpath snapshot builders
//!
//! Snapshot a file collection whose roots may be directories or jar/zip
//! archives. Archive roots are expanded entry-by-entry so the snapshot is
//! insensitive to container metadata (entry order, timestamps, compression)
//! while staying sensitive to actual entry content. Classpath roots are
//! addressed by content, not name, so their paths are ignored.

use crate::archive::{is_archive, ArchiveEntries};
use crate::collection::{CompareStrategy, FileCollectionSnapshot, SnapshotCollector};
use crate::error::SnapshotError;
use crate::hashers::ResourceHasher;
use crate::normalize::{NormalizationContext, NormalizedSnapshot, PathNormalization};
use crate::snapshot::{FileSystemSnapshotter, FileType};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which classpath flavor is being fingerprinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClasspathVariant {
    /// Everything counts: classes and resources, loose or inside archives.
    Runtime,
    /// Only archive entries and directory contents count; loose non-archive
    /// regular files at the classpath root are discarded.
    Compile,
}

pub struct ClasspathSnapshotBuilder<'a> {
    snapshotter: &'a FileSystemSnapshotter,
    hasher: &'a dyn ResourceHasher,
    variant: ClasspathVariant,
}

impl<'a> ClasspathSnapshotBuilder<'a> {
    pub fn new(
        snapshotter: &'a FileSystemSnapshotter,
        hasher: &'a dyn ResourceHasher,
        variant: ClasspathVariant,
    ) -> Self {
        ClasspathSnapshotBuilder {
            snapshotter,
            hasher,
            variant,
        }
    }

    /// Build the ordered collection snapshot for a sequence of classpath
    /// roots. Classpath order is behaviorally significant, so the compare
    /// strategy is always Ordered.
    pub fn snapshot(&self, roots: &[PathBuf]) -> Result<FileCollectionSnapshot, SnapshotError> {
        let mut collector = SnapshotCollector::new(CompareStrategy::Ordered);
        for root in roots {
            self.snapshot_root(root, &mut collector)?;
        }
        Ok(collector.freeze())
    }

    fn snapshot_root(
        &self,
        root: &Path,
        collector: &mut SnapshotCollector,
    ) -> Result<(), SnapshotError> {
        let tree = self.snapshotter.snapshot(root)?;
        match tree.root.file_type {
            FileType::Missing => {
                debug!(path = %root.display(), "classpath root missing, skipped");
                Ok(())
            }
            FileType::RegularFile if is_archive(root) => {
                self.snapshot_archive(root, &tree.root.absolute_path, collector)
            }
            FileType::RegularFile => {
                if self.variant == ClasspathVariant::Compile {
                    // Loose non-archive files contribute nothing at compile
                    // time; only class content in jars or directories counts.
                    debug!(path = %root.display(), "loose classpath file discarded for compile");
                    return Ok(());
                }
                if let Some(hash) = self.hasher.hash_resource(&tree.root)? {
                    collector.collect(
                        &tree.root.absolute_path,
                        Some(NormalizedSnapshot::ignored_path(hash)),
                    );
                }
                Ok(())
            }
            FileType::Directory => {
                let ctx = NormalizationContext {
                    root_is_file: false,
                    root_is_empty_dir: tree.descendants.is_empty(),
                };
                for snapshot in &tree.descendants {
                    if snapshot.file_type != FileType::RegularFile {
                        continue;
                    }
                    let Some(hash) = self.hasher.hash_resource(snapshot)? else {
                        continue;
                    };
                    // Location inside the directory still matters; only the
                    // root itself is path-ignored.
                    let normalized = PathNormalization::Relative
                        .normalize(snapshot, &ctx)
                        .map(|n| NormalizedSnapshot::new(n.normalized_key, hash));
                    collector.collect(&snapshot.absolute_path, normalized);
                }
                Ok(())
            }
        }
    }

    fn snapshot_archive(
        &self,
        root: &Path,
        root_absolute: &str,
        collector: &mut SnapshotCollector,
    ) -> Result<(), SnapshotError> {
        let mut entries = Vec::new();
        for result in ArchiveEntries::open(root)? {
            let entry = result?;
            let Some(hash) = self.hasher.hash_archive_entry(root, &entry)? else {
                continue;
            };
            entries.push((format!("{root_absolute}!/{}", entry.name), hash));
        }
        // Collected in hash order, not archive order: repacking the container
        // with reordered but byte-identical entries yields the same snapshot.
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        for (identity, hash) in entries {
            collector.collect(&identity, Some(NormalizedSnapshot::ignored_path(hash)));
        }
        Ok(())
    }
}
