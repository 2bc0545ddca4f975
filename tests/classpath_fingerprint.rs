//! Classpath fingerprinting scenarios: archives, ignore rules, determinism.

use imprint::classpath::{ClasspathSnapshotBuilder, ClasspathVariant};
use imprint::config::ImprintConfig;
use imprint::hashers::{
    configuration_hash, IgnoreFilterResourceHasher, ResourceHasher,
    RuntimeClasspathResourceHasher,
};
use imprint::session::BuildSession;
use imprint::snapshot::FileSystemSnapshotter;
use imprint::store::InMemoryStore;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, bytes) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
}

fn snapshotter(scope: &Path, hasher: &dyn ResourceHasher) -> FileSystemSnapshotter {
    let session = BuildSession::new(scope, Arc::new(InMemoryStore::new()), false).unwrap();
    let file_hasher =
        session.standard_file_hasher(&ImprintConfig::default(), configuration_hash(hasher));
    FileSystemSnapshotter::new(file_hasher)
}

#[test]
fn manifest_changes_are_invisible_with_ignore_rules() {
    let dir = TempDir::new().unwrap();
    let scope = TempDir::new().unwrap();
    let v1 = dir.path().join("v1.jar");
    let v2 = dir.path().join("v2.jar");
    write_jar(
        &v1,
        &[
            ("META-INF/MANIFEST.MF", b"Built-By: alice"),
            ("pkg/A.class", b"cafebabe"),
        ],
    );
    write_jar(
        &v2,
        &[
            ("META-INF/MANIFEST.MF", b"Built-By: bob"),
            ("pkg/A.class", b"cafebabe"),
        ],
    );

    let hasher = IgnoreFilterResourceHasher::new(
        &["META-INF/**".to_string()],
        Box::new(RuntimeClasspathResourceHasher),
    )
    .unwrap();
    let snapshotter = snapshotter(scope.path(), &hasher);
    let builder = ClasspathSnapshotBuilder::new(&snapshotter, &hasher, ClasspathVariant::Runtime);

    let before = builder.snapshot(&[v1]).unwrap();
    let after = builder.snapshot(&[v2]).unwrap();
    assert!(after.iterate_content_changes_since(&before).is_empty());
    assert_eq!(before.hash(), after.hash());
}

#[test]
fn class_change_is_visible_through_ignore_rules() {
    let dir = TempDir::new().unwrap();
    let scope = TempDir::new().unwrap();
    let v1 = dir.path().join("v1.jar");
    let v2 = dir.path().join("v2.jar");
    write_jar(&v1, &[("pkg/A.class", b"version-one")]);
    write_jar(&v2, &[("pkg/A.class", b"version-two")]);

    let hasher = IgnoreFilterResourceHasher::new(
        &["META-INF/**".to_string()],
        Box::new(RuntimeClasspathResourceHasher),
    )
    .unwrap();
    let snapshotter = snapshotter(scope.path(), &hasher);
    let builder = ClasspathSnapshotBuilder::new(&snapshotter, &hasher, ClasspathVariant::Runtime);

    let before = builder.snapshot(&[v1]).unwrap();
    let after = builder.snapshot(&[v2]).unwrap();
    assert!(!after.iterate_content_changes_since(&before).is_empty());
}

#[test]
fn classpath_root_order_is_significant() {
    let dir = TempDir::new().unwrap();
    let scope = TempDir::new().unwrap();
    let a = dir.path().join("a.jar");
    let b = dir.path().join("b.jar");
    write_jar(&a, &[("A.class", b"aa")]);
    write_jar(&b, &[("B.class", b"bb")]);

    let hasher = RuntimeClasspathResourceHasher;
    let snapshotter = snapshotter(scope.path(), &hasher);
    let builder = ClasspathSnapshotBuilder::new(&snapshotter, &hasher, ClasspathVariant::Compile);

    let forward = builder.snapshot(&[a.clone(), b.clone()]).unwrap();
    let backward = builder.snapshot(&[b, a]).unwrap();
    assert_ne!(forward.hash(), backward.hash());
    assert!(!backward.iterate_content_changes_since(&forward).is_empty());
}

#[test]
fn mixed_directory_and_archive_classpath() {
    let dir = TempDir::new().unwrap();
    let scope = TempDir::new().unwrap();
    let classes = dir.path().join("classes");
    std::fs::create_dir_all(classes.join("pkg")).unwrap();
    std::fs::write(classes.join("pkg/Main.class"), b"main").unwrap();
    let lib = dir.path().join("lib.jar");
    write_jar(&lib, &[("dep/Util.class", b"util")]);

    let hasher = RuntimeClasspathResourceHasher;
    let snapshotter = snapshotter(scope.path(), &hasher);
    let builder = ClasspathSnapshotBuilder::new(&snapshotter, &hasher, ClasspathVariant::Runtime);

    let snapshot = builder.snapshot(&[classes, lib]).unwrap();
    assert_eq!(snapshot.len(), 2);
    // Directory contents keep their relative identity; jar entries do not.
    let keys: Vec<&str> = snapshot
        .iter()
        .map(|(_, s)| s.normalized_key.as_str())
        .collect();
    assert_eq!(keys, vec!["pkg/Main.class", ""]);
}
