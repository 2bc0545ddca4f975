//! File collection snapshots and change detection
//!
//! The aggregate, insertion-ordered map of normalized snapshots for one file
//! collection. Comparing two of these yields the minimal change set between
//! builds; appending one to a hash builder yields a deterministic cache key
//! independent of filesystem iteration order.

use crate::normalize::{NormalizationContext, NormalizedSnapshot, PathNormalization};
use crate::snapshot::{FileType, SnapshotTree};
use crate::types::{ContentHash, HashBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Whether entry order is behaviorally significant for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareStrategy {
    Ordered,
    Unordered,
}

/// One detected difference between two collection snapshots. The label is
/// the normalized key, or the content hash in hex for path-ignored entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(String),
    Removed(String),
    Modified(String),
}

fn label(snapshot: &NormalizedSnapshot) -> String {
    if snapshot.has_key() {
        snapshot.normalized_key.clone()
    } else {
        snapshot.hash.to_hex()
    }
}

/// Immutable aggregate snapshot of a file collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCollectionSnapshot {
    /// (absolute path, normalized snapshot), insertion order preserved.
    entries: Vec<(String, NormalizedSnapshot)>,
    strategy: CompareStrategy,
    paths_are_absolute: bool,
}

impl FileCollectionSnapshot {
    pub fn empty(strategy: CompareStrategy) -> Self {
        FileCollectionSnapshot {
            entries: Vec::new(),
            strategy,
            paths_are_absolute: true,
        }
    }

    pub fn strategy(&self) -> CompareStrategy {
        self.strategy
    }

    pub fn paths_are_absolute(&self) -> bool {
        self.paths_are_absolute
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, NormalizedSnapshot)> {
        self.entries.iter()
    }

    /// Change set relative to an older snapshot of the same collection.
    pub fn iterate_content_changes_since(&self, old: &FileCollectionSnapshot) -> Vec<Change> {
        match self.strategy {
            CompareStrategy::Unordered => unordered_changes(old, self),
            CompareStrategy::Ordered => ordered_changes(old, self),
        }
    }

    /// Feed this snapshot into a cumulative cache key. Unordered collections
    /// are fed in normalized sort order; ordered collections in insertion
    /// order. Path-ignored entries contribute content only.
    pub fn append_to_hash(&self, builder: &mut HashBuilder) {
        let mut snapshots: Vec<&NormalizedSnapshot> =
            self.entries.iter().map(|(_, s)| s).collect();
        if self.strategy == CompareStrategy::Unordered {
            snapshots.sort();
        }
        for snapshot in snapshots {
            if snapshot.has_key() {
                builder.put_str(&snapshot.normalized_key);
            }
            builder.put_hash(&snapshot.hash);
        }
    }

    /// Convenience aggregate hash.
    pub fn hash(&self) -> ContentHash {
        let mut builder = HashBuilder::new();
        self.append_to_hash(&mut builder);
        builder.finish()
    }
}

fn unordered_changes(
    old: &FileCollectionSnapshot,
    new: &FileCollectionSnapshot,
) -> Vec<Change> {
    // Multiset symmetric difference over normalized snapshots.
    let mut counts: HashMap<&NormalizedSnapshot, i64> = HashMap::new();
    for (_, snapshot) in &new.entries {
        *counts.entry(snapshot).or_default() += 1;
    }
    for (_, snapshot) in &old.entries {
        *counts.entry(snapshot).or_default() -= 1;
    }

    let mut added: Vec<&NormalizedSnapshot> = Vec::new();
    let mut removed: Vec<&NormalizedSnapshot> = Vec::new();
    for (snapshot, count) in counts {
        for _ in 0..count.unsigned_abs() {
            if count > 0 {
                added.push(snapshot);
            } else if count < 0 {
                removed.push(snapshot);
            }
        }
    }
    added.sort();
    removed.sort();

    // A key on both sides with a different hash is one modification, not an
    // add/remove pair. Path-ignored entries have no key identity and stay
    // added/removed. Keys may repeat (NameOnly), so pairing is counted.
    let mut removable: HashMap<&str, usize> = HashMap::new();
    for snapshot in removed.iter().filter(|s| s.has_key()) {
        *removable.entry(snapshot.normalized_key.as_str()).or_default() += 1;
    }
    let mut changes = Vec::new();
    let mut paired: HashMap<&str, usize> = HashMap::new();
    for snapshot in &added {
        let key = snapshot.normalized_key.as_str();
        if snapshot.has_key() && removable.get(key).copied().unwrap_or(0) > 0 {
            *removable.get_mut(key).unwrap() -= 1;
            *paired.entry(key).or_default() += 1;
            changes.push(Change::Modified(snapshot.normalized_key.clone()));
        } else {
            changes.push(Change::Added(label(snapshot)));
        }
    }
    for snapshot in &removed {
        let key = snapshot.normalized_key.as_str();
        if snapshot.has_key() && paired.get(key).copied().unwrap_or(0) > 0 {
            *paired.get_mut(key).unwrap() -= 1;
            continue;
        }
        changes.push(Change::Removed(label(snapshot)));
    }
    changes
}

fn ordered_changes(old: &FileCollectionSnapshot, new: &FileCollectionSnapshot) -> Vec<Change> {
    // Positional walk with remaining-occurrence lookahead: relative position
    // matters, so reordering otherwise-identical entries is itself a change.
    let mut old_rest: HashMap<&NormalizedSnapshot, i64> = HashMap::new();
    for (_, snapshot) in &old.entries {
        *old_rest.entry(snapshot).or_default() += 1;
    }
    let mut new_rest: HashMap<&NormalizedSnapshot, i64> = HashMap::new();
    for (_, snapshot) in &new.entries {
        *new_rest.entry(snapshot).or_default() += 1;
    }

    let consume = |rest: &mut HashMap<&NormalizedSnapshot, i64>, s: &NormalizedSnapshot| {
        if let Some(count) = rest.get_mut(s) {
            *count -= 1;
        }
    };
    let remaining =
        |rest: &HashMap<&NormalizedSnapshot, i64>, s: &NormalizedSnapshot| -> bool {
            rest.get(s).copied().unwrap_or(0) > 0
        };

    let mut changes = Vec::new();
    let mut i = 0;
    let mut j = 0;
    while i < old.entries.len() && j < new.entries.len() {
        let o = &old.entries[i].1;
        let n = &new.entries[j].1;
        if o == n {
            consume(&mut old_rest, o);
            consume(&mut new_rest, n);
            i += 1;
            j += 1;
        } else if o.has_key() && o.normalized_key == n.normalized_key {
            changes.push(Change::Modified(n.normalized_key.clone()));
            consume(&mut old_rest, o);
            consume(&mut new_rest, n);
            i += 1;
            j += 1;
        } else if !remaining(&new_rest, o) {
            changes.push(Change::Removed(label(o)));
            consume(&mut old_rest, o);
            i += 1;
        } else if !remaining(&old_rest, n) {
            changes.push(Change::Added(label(n)));
            consume(&mut new_rest, n);
            j += 1;
        } else {
            // Both entries exist on the other side: a reordering. Report it
            // from the new side's perspective.
            changes.push(Change::Removed(label(o)));
            changes.push(Change::Added(label(n)));
            consume(&mut old_rest, o);
            consume(&mut new_rest, n);
            i += 1;
            j += 1;
        }
    }
    while i < old.entries.len() {
        changes.push(Change::Removed(label(&old.entries[i].1)));
        i += 1;
    }
    while j < new.entries.len() {
        changes.push(Change::Added(label(&new.entries[j].1)));
        j += 1;
    }
    changes
}

/// Accumulates normalized snapshots into a frozen collection snapshot.
///
/// De-duplicates by absolute path, first occurrence winning, mirroring root
/// precedence in a file collection; entries a strategy declines to emit are
/// skipped.
pub struct SnapshotCollector {
    entries: Vec<(String, NormalizedSnapshot)>,
    seen: HashSet<String>,
    strategy: CompareStrategy,
}

impl SnapshotCollector {
    pub fn new(strategy: CompareStrategy) -> Self {
        SnapshotCollector {
            entries: Vec::new(),
            seen: HashSet::new(),
            strategy,
        }
    }

    /// Add one normalized entry keyed by absolute path. `None` snapshots and
    /// duplicate paths are discarded.
    pub fn collect(&mut self, absolute_path: &str, snapshot: Option<NormalizedSnapshot>) {
        let Some(snapshot) = snapshot else { return };
        if !self.seen.insert(absolute_path.to_string()) {
            return;
        }
        self.entries.push((absolute_path.to_string(), snapshot));
    }

    /// Normalize and collect every snapshot in a tree.
    pub fn collect_tree(&mut self, tree: &SnapshotTree, normalization: PathNormalization) {
        let ctx = NormalizationContext {
            root_is_file: tree.root.file_type == FileType::RegularFile,
            root_is_empty_dir: tree.root.file_type == FileType::Directory
                && tree.descendants.is_empty(),
        };
        for snapshot in tree.iter() {
            self.collect(&snapshot.absolute_path, normalization.normalize(snapshot, &ctx));
        }
    }

    pub fn freeze(self) -> FileCollectionSnapshot {
        FileCollectionSnapshot {
            entries: self.entries,
            strategy: self.strategy,
            paths_are_absolute: true,
        }
    }
}
