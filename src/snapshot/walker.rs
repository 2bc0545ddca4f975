//! Filesystem snapshotter
//!
//! Walks one collection root into a [`SnapshotTree`], consulting the caching
//! file hasher so unchanged content is never re-read. One unreadable entry
//! becomes a Missing snapshot; it must not abort snapshotting of the rest of
//! the tree.

use crate::cache::CachingFileHasher;
use crate::error::SnapshotError;
use crate::snapshot::{FileSnapshot, SnapshotTree};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

pub struct FileSystemSnapshotter {
    hasher: CachingFileHasher,
}

impl FileSystemSnapshotter {
    pub fn new(hasher: CachingFileHasher) -> Self {
        FileSystemSnapshotter { hasher }
    }

    pub fn hasher(&self) -> &CachingFileHasher {
        &self.hasher
    }

    /// Snapshot one collection root: a single file yields a tree with no
    /// descendants; a directory is walked depth-first in stable name order;
    /// a path that cannot be observed yields a Missing root.
    pub fn snapshot(&self, root: &Path) -> Result<SnapshotTree, SnapshotError> {
        let absolute = absolute_string(root);

        let metadata = match std::fs::metadata(root) {
            Ok(meta) => meta,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %root.display(), %err, "root not observable, recording as missing");
                }
                return Ok(SnapshotTree::single(FileSnapshot::missing(
                    absolute,
                    Vec::new(),
                    true,
                )));
            }
        };

        if metadata.is_dir() {
            return Ok(self.snapshot_directory(root, absolute));
        }

        let root_snapshot = match self.hasher.hash_file(root) {
            Ok(hash) => FileSnapshot::regular_file(absolute, Vec::new(), true, hash),
            Err(err) => {
                warn!(path = %root.display(), %err, "root unreadable, recording as missing");
                FileSnapshot::missing(absolute, Vec::new(), true)
            }
        };
        Ok(SnapshotTree::single(root_snapshot))
    }

    fn snapshot_directory(&self, root: &Path, absolute: String) -> SnapshotTree {
        let mut descendants = Vec::new();
        for result in WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    // Symlink cycle or unreadable directory: record what we
                    // can and keep walking.
                    let path = err.path().unwrap_or(root);
                    warn!(path = %path.display(), %err, "walk error, recording entry as missing");
                    descendants.push(FileSnapshot::missing(
                        absolute_string(path),
                        relative_segments(root, path),
                        false,
                    ));
                    continue;
                }
            };

            let path = entry.path();
            let segments = relative_segments(root, path);
            let entry_absolute = absolute_string(path);

            if entry.file_type().is_dir() {
                descendants.push(FileSnapshot::directory(entry_absolute, segments, false));
                continue;
            }

            match self.hasher.hash_file(path) {
                Ok(hash) => {
                    descendants.push(FileSnapshot::regular_file(
                        entry_absolute,
                        segments,
                        false,
                        hash,
                    ));
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "entry unreadable, recording as missing");
                    descendants.push(FileSnapshot::missing(entry_absolute, segments, false));
                }
            }
        }

        SnapshotTree {
            root: FileSnapshot::directory(absolute, Vec::new(), true),
            descendants,
        }
    }
}

/// Absolute path with platform-normalized separators.
fn absolute_string(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    dunce::simplified(&absolute).to_string_lossy().into_owned()
}

fn relative_segments(root: &Path, path: &Path) -> Vec<String> {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
