//! Imprint: Incremental-Build Fingerprinting
//!
//! Determines, cheaply and correctly, whether a set of files or directories
//! has changed since a prior build, without re-reading unchanged content.
//! Content-addressed snapshots, path-normalization policies, snapshot
//! comparison, and a tiered, heap-proportional file-hash cache.

pub mod archive;
pub mod cache;
pub mod classpath;
pub mod collection;
pub mod config;
pub mod error;
pub mod hashers;
pub mod logging;
pub mod normalize;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod timestamp;
pub mod types;

pub use cache::{CacheCapSizer, CachingFileHasher, FileHashCache};
pub use collection::{Change, CompareStrategy, FileCollectionSnapshot, SnapshotCollector};
pub use error::SnapshotError;
pub use normalize::{NormalizedSnapshot, PathNormalization};
pub use session::BuildSession;
pub use snapshot::{FileSnapshot, FileSystemSnapshotter, FileType, SnapshotTree};
pub use types::ContentHash;
