//! File snapshots and snapshot trees
//!
//! Immutable records of file identity and content at a point in time. A
//! `SnapshotTree` captures one collection root (a single file, or a directory
//! walked recursively); the aggregate view across roots lives in
//! [`crate::collection`].

pub mod walker;

pub use walker::FileSystemSnapshotter;

use crate::types::ContentHash;
use std::path::Path;

/// Kind of filesystem entry a snapshot describes.
///
/// Missing is represented, not absent, so "file was deleted" is
/// distinguishable from "file was never observed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    RegularFile,
    Directory,
    Missing,
}

/// Immutable record of one filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// Absolute path with platform-normalized separators.
    pub absolute_path: String,
    /// Path segments relative to the collection root; empty for the root.
    pub relative_segments: Vec<String>,
    pub is_root: bool,
    pub file_type: FileType,
    /// Content digest for regular files; the well-known sentinel for
    /// directories and missing entries.
    pub content: ContentHash,
}

impl FileSnapshot {
    pub fn regular_file(
        absolute_path: String,
        relative_segments: Vec<String>,
        is_root: bool,
        content: ContentHash,
    ) -> Self {
        FileSnapshot {
            absolute_path,
            relative_segments,
            is_root,
            file_type: FileType::RegularFile,
            content,
        }
    }

    pub fn directory(absolute_path: String, relative_segments: Vec<String>, is_root: bool) -> Self {
        FileSnapshot {
            absolute_path,
            relative_segments,
            is_root,
            file_type: FileType::Directory,
            content: ContentHash::DIRECTORY,
        }
    }

    pub fn missing(absolute_path: String, relative_segments: Vec<String>, is_root: bool) -> Self {
        FileSnapshot {
            absolute_path,
            relative_segments,
            is_root,
            file_type: FileType::Missing,
            content: ContentHash::MISSING,
        }
    }

    /// Bare file name of this entry.
    pub fn name(&self) -> &str {
        if let Some(last) = self.relative_segments.last() {
            return last;
        }
        Path::new(&self.absolute_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.absolute_path)
    }

    /// Relative path joined with `/`, empty for a root.
    pub fn relative_path(&self) -> String {
        self.relative_segments.join("/")
    }
}

/// One collection root and its direct + indirect children in depth-first
/// order (root excluded from `descendants`). Discarded once the aggregate
/// collection snapshot has been built.
#[derive(Debug, Clone)]
pub struct SnapshotTree {
    pub root: FileSnapshot,
    pub descendants: Vec<FileSnapshot>,
}

impl SnapshotTree {
    pub fn single(root: FileSnapshot) -> Self {
        SnapshotTree {
            root,
            descendants: Vec::new(),
        }
    }

    /// Root plus descendants, root first.
    pub fn iter(&self) -> impl Iterator<Item = &FileSnapshot> {
        std::iter::once(&self.root).chain(self.descendants.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_snapshots_compare_equal_across_paths_by_content() {
        let a = FileSnapshot::missing("/a/gone.txt".to_string(), vec![], true);
        let b = FileSnapshot::missing("/b/gone.txt".to_string(), vec![], true);
        assert_eq!(a.content, b.content);
        assert_eq!(a.file_type, b.file_type);
    }

    #[test]
    fn test_missing_never_equals_regular_content() {
        let missing = FileSnapshot::missing("/x".to_string(), vec![], true);
        let file = FileSnapshot::regular_file(
            "/x".to_string(),
            vec![],
            true,
            ContentHash::of(b""),
        );
        assert_ne!(missing.content, file.content);
    }

    #[test]
    fn test_name_falls_back_to_absolute_path() {
        let root = FileSnapshot::regular_file(
            "/work/build.jar".to_string(),
            vec![],
            true,
            ContentHash::of(b"jar"),
        );
        assert_eq!(root.name(), "build.jar");
        let child = FileSnapshot::regular_file(
            "/work/src/main.rs".to_string(),
            vec!["src".to_string(), "main.rs".to_string()],
            false,
            ContentHash::of(b"fn"),
        );
        assert_eq!(child.name(), "main.rs");
        assert_eq!(child.relative_path(), "src/main.rs");
    }
}
