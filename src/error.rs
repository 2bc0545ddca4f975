//! Error taxonomy for snapshotting and caching
//!
//! Errors never silently degrade into "assume changed" or "assume unchanged";
//! anything ambiguous propagates to the caller of the snapshot operation.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the persistent key/value collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),

    #[error("store i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Failures raised while building, caching, or comparing snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("i/o failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// A cached value could not be decoded. The offending key is reported so
    /// the corruption is visible instead of being dropped.
    #[error("failed to decode cached value for key {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SnapshotError {
    /// Wrap an `io::Error` with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::Io {
            path: path.into(),
            source,
        }
    }
}
