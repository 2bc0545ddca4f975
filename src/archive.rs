//! Archive entry streaming
//!
//! Lazy enumeration of the regular entries of a zip-format archive (jars
//! included). The sequence is finite, ordered by the archive's central
//! directory, and terminates with a single explicit error value when
//! iteration fails partway.

use crate::error::SnapshotError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// One regular archive entry, fully read.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Entry path inside the archive, as stored.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Iterator over an archive's regular entries. Directory entries are
/// skipped. After the first error the iterator is exhausted.
pub struct ArchiveEntries {
    archive: ZipArchive<File>,
    path: PathBuf,
    next_index: usize,
    failed: bool,
}

impl ArchiveEntries {
    pub fn open(path: &Path) -> Result<Self, SnapshotError> {
        let file = File::open(path).map_err(|e| SnapshotError::io(path, e))?;
        let archive = ZipArchive::new(file).map_err(|e| SnapshotError::Archive {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(ArchiveEntries {
            archive,
            path: path.to_path_buf(),
            next_index: 0,
            failed: false,
        })
    }
}

impl Iterator for ArchiveEntries {
    type Item = Result<ArchiveEntry, SnapshotError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed || self.next_index >= self.archive.len() {
                return None;
            }
            let index = self.next_index;
            self.next_index += 1;
            let mut entry = match self.archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(SnapshotError::Archive {
                        path: self.path.clone(),
                        source: e,
                    }));
                }
            };
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            if let Err(e) = entry.read_to_end(&mut bytes) {
                self.failed = true;
                return Some(Err(SnapshotError::io(self.path.join(&name), e)));
            }
            return Some(Ok(ArchiveEntry { name, bytes }));
        }
    }
}

/// Whether a path looks like a classpath archive.
pub fn is_archive(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip")
    )
}
