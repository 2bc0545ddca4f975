//! Configuration
//!
//! Layered configuration for the fingerprinting core: built-in defaults,
//! optionally overridden by a TOML file, optionally overridden by
//! `IMPRINT_*` environment variables. Policy names are validated here, at
//! load, never at snapshot time.

use crate::collection::CompareStrategy;
use crate::error::SnapshotError;
use crate::normalize::PathNormalization;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "IMPRINT";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprintConfig {
    /// Heap the process is allowed to use, in MiB; drives cache capacities.
    pub max_heap_mb: u64,
    /// Constrained execution mode: caches sized at roughly half.
    pub short_lived_process: bool,
    /// Whether this process may serve multiple unrelated builds, in which
    /// case front caches are dropped at build completion.
    pub drop_caches_on_build_finish: bool,
    /// Subtrees whose content never mutates after creation, e.g. the
    /// resolved dependency artifact store.
    pub immutable_roots: Vec<PathBuf>,
    /// Glob patterns for resources excluded from hashing.
    pub ignore_patterns: Vec<String>,
    /// Cache scope directory (boundary marker file, persistent store).
    pub cache_dir: PathBuf,
    /// Default path sensitivity for plain file collections.
    pub normalization: PathNormalization,
    /// Default compare semantics for plain file collections.
    pub compare: CompareStrategy,
}

impl Default for ImprintConfig {
    fn default() -> Self {
        ImprintConfig {
            max_heap_mb: 512,
            short_lived_process: false,
            drop_caches_on_build_finish: false,
            immutable_roots: Vec::new(),
            ignore_patterns: Vec::new(),
            cache_dir: PathBuf::from(".imprint"),
            normalization: PathNormalization::Absolute,
            compare: CompareStrategy::Unordered,
        }
    }
}

impl ImprintConfig {
    /// Load with defaults < optional file < environment.
    pub fn load(file: Option<&Path>) -> Result<Self, SnapshotError> {
        let defaults = ImprintConfig::default();
        let mut builder = Config::builder()
            .set_default("max_heap_mb", defaults.max_heap_mb)
            .and_then(|b| b.set_default("short_lived_process", defaults.short_lived_process))
            .and_then(|b| {
                b.set_default(
                    "drop_caches_on_build_finish",
                    defaults.drop_caches_on_build_finish,
                )
            })
            .and_then(|b| b.set_default("immutable_roots", Vec::<String>::new()))
            .and_then(|b| b.set_default("ignore_patterns", Vec::<String>::new()))
            .and_then(|b| b.set_default("cache_dir", ".imprint"))
            .and_then(|b| b.set_default("normalization", "absolute"))
            .and_then(|b| b.set_default("compare", "unordered"))
            .map_err(|e| SnapshotError::Config(e.to_string()))?;
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));
        let config = builder
            .build()
            .map_err(|e| SnapshotError::Config(e.to_string()))?;
        config
            .try_deserialize()
            .map_err(|e| SnapshotError::Config(e.to_string()))
    }
}
