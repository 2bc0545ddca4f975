//! Path normalization strategies
//!
//! Pure policies mapping a raw file snapshot (absolute path + content hash)
//! to the key it is compared under. Choosing a strategy decides how much of a
//! file's location is significant: everything (Absolute), nothing (None), or
//! something in between.

use crate::snapshot::{FileSnapshot, FileType};
use crate::types::ContentHash;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Snapshot reduced to its comparison identity.
///
/// Equality of (key, hash) pairs is the unit of change detection: two entries
/// are "the same" exactly when both match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedSnapshot {
    /// Comparison key; empty for path-insensitive strategies.
    pub normalized_key: String,
    pub hash: ContentHash,
}

impl NormalizedSnapshot {
    pub fn new(normalized_key: impl Into<String>, hash: ContentHash) -> Self {
        NormalizedSnapshot {
            normalized_key: normalized_key.into(),
            hash,
        }
    }

    /// Path-ignored entry: only content participates in comparison.
    pub fn ignored_path(hash: ContentHash) -> Self {
        NormalizedSnapshot {
            normalized_key: String::new(),
            hash,
        }
    }

    pub fn has_key(&self) -> bool {
        !self.normalized_key.is_empty()
    }
}

impl Ord for NormalizedSnapshot {
    /// Path-insensitive entries order by hash; keyed entries order by key,
    /// then hash. Keeps serialized aggregates deterministic.
    fn cmp(&self, other: &Self) -> Ordering {
        if self.normalized_key.is_empty() && other.normalized_key.is_empty() {
            return self.hash.cmp(&other.hash);
        }
        self.normalized_key
            .cmp(&other.normalized_key)
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for NormalizedSnapshot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Context a strategy needs beyond the snapshot itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizationContext {
    /// Whether the collection root this entry belongs to is a regular file.
    pub root_is_file: bool,
    /// Whether the root is a directory with no descendants.
    pub root_is_empty_dir: bool,
}

/// Path sensitivity policy. Closed set; unknown names are a configuration
/// error at load time, never deferred to snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathNormalization {
    /// Key = absolute path. Applies to every entry, Missing included.
    Absolute,
    /// Like Absolute, but drops Missing entries and empty root directories;
    /// output comparison must ignore files that vanished or directories that
    /// never held content.
    Output,
    /// Key = path relative to the collection root, so a tree can move without
    /// invalidating its snapshot. A root collapses to its file name when the
    /// root is itself a file.
    Relative,
    /// Key = bare file name; directory structure is irrelevant.
    NameOnly,
    /// Key = empty; only content matters.
    None,
}

impl PathNormalization {
    /// Map a snapshot to its comparison identity, or `None` to exclude it
    /// from the collection snapshot entirely.
    pub fn normalize(
        &self,
        snapshot: &FileSnapshot,
        ctx: &NormalizationContext,
    ) -> Option<NormalizedSnapshot> {
        match self {
            PathNormalization::Absolute => Some(NormalizedSnapshot::new(
                snapshot.absolute_path.clone(),
                snapshot.content,
            )),
            PathNormalization::Output => {
                if snapshot.file_type == FileType::Missing {
                    return None;
                }
                if snapshot.is_root
                    && snapshot.file_type == FileType::Directory
                    && ctx.root_is_empty_dir
                {
                    return None;
                }
                Some(NormalizedSnapshot::new(
                    snapshot.absolute_path.clone(),
                    snapshot.content,
                ))
            }
            PathNormalization::Relative => {
                let key = if snapshot.is_root {
                    if ctx.root_is_file {
                        snapshot.name().to_string()
                    } else {
                        snapshot.relative_path()
                    }
                } else {
                    snapshot.relative_path()
                };
                Some(NormalizedSnapshot::new(key, snapshot.content))
            }
            PathNormalization::NameOnly => Some(NormalizedSnapshot::new(
                snapshot.name().to_string(),
                snapshot.content,
            )),
            PathNormalization::None => Some(NormalizedSnapshot::ignored_path(snapshot.content)),
        }
    }
}

impl FromStr for PathNormalization {
    type Err = crate::error::SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(PathNormalization::Absolute),
            "output" => Ok(PathNormalization::Output),
            "relative" => Ok(PathNormalization::Relative),
            "name_only" => Ok(PathNormalization::NameOnly),
            "none" => Ok(PathNormalization::None),
            other => Err(crate::error::SnapshotError::Config(format!(
                "unknown path normalization policy: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn file(abs: &str, rel: &[&str], is_root: bool, content: &[u8]) -> FileSnapshot {
        FileSnapshot::regular_file(
            abs.to_string(),
            rel.iter().map(|s| s.to_string()).collect(),
            is_root,
            ContentHash::of(content),
        )
    }

    #[test]
    fn test_relative_and_name_only_ignore_absolute_location() {
        let ctx = NormalizationContext::default();
        let a = file("/one/src/a.txt", &["src", "a.txt"], false, b"x");
        let b = file("/two/src/a.txt", &["src", "a.txt"], false, b"x");
        for strategy in [
            PathNormalization::Relative,
            PathNormalization::NameOnly,
            PathNormalization::None,
        ] {
            assert_eq!(
                strategy.normalize(&a, &ctx),
                strategy.normalize(&b, &ctx),
                "{strategy:?} must not see absolute paths"
            );
        }
        assert_ne!(
            PathNormalization::Absolute.normalize(&a, &ctx),
            PathNormalization::Absolute.normalize(&b, &ctx)
        );
    }

    #[test]
    fn test_absolute_keeps_missing_entries() {
        let ctx = NormalizationContext::default();
        let missing = FileSnapshot::missing("/gone".to_string(), vec![], true);
        assert!(PathNormalization::Absolute.normalize(&missing, &ctx).is_some());
        assert!(PathNormalization::Output.normalize(&missing, &ctx).is_none());
    }

    #[test]
    fn test_output_drops_empty_root_directory() {
        let empty_root = FileSnapshot::directory("/out".to_string(), vec![], true);
        let ctx = NormalizationContext {
            root_is_file: false,
            root_is_empty_dir: true,
        };
        assert!(PathNormalization::Output.normalize(&empty_root, &ctx).is_none());
        let populated = NormalizationContext::default();
        assert!(PathNormalization::Output
            .normalize(&empty_root, &populated)
            .is_some());
    }

    #[test]
    fn test_relative_root_file_collapses_to_name() {
        let root = file("/work/input.txt", &[], true, b"x");
        let ctx = NormalizationContext {
            root_is_file: true,
            root_is_empty_dir: false,
        };
        let normalized = PathNormalization::Relative.normalize(&root, &ctx).unwrap();
        assert_eq!(normalized.normalized_key, "input.txt");
    }

    #[test]
    fn test_relative_root_directory_has_empty_key() {
        let root = FileSnapshot::directory("/work".to_string(), vec![], true);
        let ctx = NormalizationContext::default();
        let normalized = PathNormalization::Relative.normalize(&root, &ctx).unwrap();
        assert_eq!(normalized.normalized_key, "");
    }

    #[test]
    fn test_unknown_policy_name_fails_fast() {
        assert!("classpathy".parse::<PathNormalization>().is_err());
        assert_eq!(
            "name_only".parse::<PathNormalization>().unwrap(),
            PathNormalization::NameOnly
        );
    }

    proptest! {
        #[test]
        fn prop_empty_key_entries_order_by_hash(a in any::<[u8; 8]>(), b in any::<[u8; 8]>()) {
            let x = NormalizedSnapshot::ignored_path(ContentHash::of(&a));
            let y = NormalizedSnapshot::ignored_path(ContentHash::of(&b));
            prop_assert_eq!(x.cmp(&y), x.hash.cmp(&y.hash));
        }

        #[test]
        fn prop_keyed_entries_order_by_key_first(k1 in "[a-z]{1,8}", k2 in "[a-z]{1,8}") {
            let x = NormalizedSnapshot::new(k1.clone(), ContentHash::of(b"1"));
            let y = NormalizedSnapshot::new(k2.clone(), ContentHash::of(b"2"));
            if k1 != k2 {
                prop_assert_eq!(x.cmp(&y), k1.cmp(&k2));
            }
        }
    }
}
