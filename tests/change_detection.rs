//! End-to-end change detection scenarios across simulated builds.

use imprint::collection::{Change, CompareStrategy, SnapshotCollector};
use imprint::config::ImprintConfig;
use imprint::hashers::{configuration_hash, RuntimeClasspathResourceHasher};
use imprint::normalize::PathNormalization;
use imprint::session::BuildSession;
use imprint::snapshot::FileSystemSnapshotter;
use imprint::store::InMemoryStore;
use imprint::types::ContentHash;
use imprint::FileCollectionSnapshot;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn build_stack(scope: &Path) -> (BuildSession, FileSystemSnapshotter) {
    let store = Arc::new(InMemoryStore::new());
    let session = BuildSession::new(scope, store, true).unwrap();
    let config = ImprintConfig::default();
    let namespace = configuration_hash(&RuntimeClasspathResourceHasher);
    let hasher = session.standard_file_hasher(&config, namespace);
    let snapshotter = FileSystemSnapshotter::new(hasher);
    (session, snapshotter)
}

fn snapshot_relative(
    snapshotter: &FileSystemSnapshotter,
    root: &Path,
) -> FileCollectionSnapshot {
    let tree = snapshotter.snapshot(root).unwrap();
    let mut collector = SnapshotCollector::new(CompareStrategy::Unordered);
    collector.collect_tree(&tree, PathNormalization::Relative);
    collector.freeze()
}

#[test]
fn delete_and_add_are_reported_as_such() {
    let dir = TempDir::new().unwrap();
    let scope = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), b"x").unwrap();
    fs::write(dir.path().join("b.txt"), b"y").unwrap();

    let (session, snapshotter) = build_stack(scope.path());
    session.on_build_start();
    let before = snapshot_relative(&snapshotter, dir.path());
    session.on_build_finish().unwrap();

    // Next build: delete b.txt, add c.txt carrying b's old bytes.
    fs::remove_file(dir.path().join("b.txt")).unwrap();
    fs::write(dir.path().join("c.txt"), b"y").unwrap();

    session.on_build_start();
    let after = snapshot_relative(&snapshotter, dir.path());
    session.on_build_finish().unwrap();

    let changes = after.iterate_content_changes_since(&before);
    assert_eq!(changes.len(), 2);
    assert!(changes.contains(&Change::Removed("b.txt".to_string())));
    assert!(changes.contains(&Change::Added("c.txt".to_string())));
    // Never a "changed a.txt".
    assert!(!changes.iter().any(|c| matches!(c, Change::Modified(_))));
}

#[test]
fn unchanged_collection_compares_empty_across_builds() {
    let dir = TempDir::new().unwrap();
    let scope = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/data.bin"), b"payload").unwrap();

    let (session, snapshotter) = build_stack(scope.path());
    session.on_build_start();
    let first = snapshot_relative(&snapshotter, dir.path());
    session.on_build_finish().unwrap();

    session.on_build_start();
    let second = snapshot_relative(&snapshotter, dir.path());
    session.on_build_finish().unwrap();

    assert!(second.iterate_content_changes_since(&first).is_empty());
    assert_eq!(first.hash(), second.hash());
}

#[test]
fn moved_tree_is_unchanged_under_relative_normalization() {
    let scope = TempDir::new().unwrap();
    let one = TempDir::new().unwrap();
    let two = TempDir::new().unwrap();
    for root in [one.path(), two.path()] {
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/lib.rs"), b"pub fn f() {}").unwrap();
    }

    let (_, snapshotter) = build_stack(scope.path());
    let here = snapshot_relative(&snapshotter, one.path());
    let there = snapshot_relative(&snapshotter, two.path());
    assert!(there.iterate_content_changes_since(&here).is_empty());
    assert_eq!(here.hash(), there.hash());
}

#[test]
fn content_edit_is_a_modification() {
    let dir = TempDir::new().unwrap();
    let scope = TempDir::new().unwrap();
    fs::write(dir.path().join("main.rs"), b"fn main() {}").unwrap();

    let (session, snapshotter) = build_stack(scope.path());
    session.on_build_start();
    let before = snapshot_relative(&snapshotter, dir.path());
    session.on_build_finish().unwrap();

    fs::write(dir.path().join("main.rs"), b"fn main() { run() }").unwrap();
    session.on_build_start();
    let after = snapshot_relative(&snapshotter, dir.path());

    assert_eq!(
        after.iterate_content_changes_since(&before),
        vec![Change::Modified("main.rs".to_string())]
    );
}

#[test]
fn missing_root_round_trips_as_missing() {
    let dir = TempDir::new().unwrap();
    let scope = TempDir::new().unwrap();
    let (_, snapshotter) = build_stack(scope.path());

    let tree = snapshotter.snapshot(&dir.path().join("ghost")).unwrap();
    assert_eq!(tree.root.content, ContentHash::MISSING);

    // Absolute keeps the missing entry; Output drops it.
    let mut absolute = SnapshotCollector::new(CompareStrategy::Unordered);
    absolute.collect_tree(&tree, PathNormalization::Absolute);
    assert_eq!(absolute.freeze().len(), 1);

    let mut output = SnapshotCollector::new(CompareStrategy::Unordered);
    output.collect_tree(&tree, PathNormalization::Output);
    assert!(output.freeze().is_empty());
}
