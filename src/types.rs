//! Core hash types for content-addressed snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ContentHash: fixed-size content digest with byte-wise equality and a total
/// ordering, so aggregate hashes can be serialized deterministically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Sentinel digest for directories. Two directories always hash alike;
    /// directory membership is captured at the collection level instead.
    pub const DIRECTORY: ContentHash = ContentHash([0x5d; 32]);

    /// Sentinel digest for missing files, so a deleted file is representable
    /// and two independently observed missing files compare equal.
    pub const MISSING: ContentHash = ContentHash([0x90; 32]);

    /// Digest a byte slice.
    pub fn of(bytes: &[u8]) -> Self {
        ContentHash(*blake3::hash(bytes).as_bytes())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ContentHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

/// Incremental hash accumulator shared by cache-key construction and
/// hasher-configuration fingerprinting.
///
/// Strings are length-prefixed so concatenation boundaries cannot collide.
pub struct HashBuilder {
    inner: blake3::Hasher,
}

impl HashBuilder {
    pub fn new() -> Self {
        HashBuilder {
            inner: blake3::Hasher::new(),
        }
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn put_str(&mut self, s: &str) {
        self.put_u64(s.len() as u64);
        self.inner.update(s.as_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.inner.update(&value.to_le_bytes());
    }

    pub fn put_hash(&mut self, hash: &ContentHash) {
        self.inner.update(hash.as_bytes());
    }

    pub fn finish(self) -> ContentHash {
        ContentHash(*self.inner.finalize().as_bytes())
    }
}

impl Default for HashBuilder {
    fn default() -> Self {
        Self::new()
    }
}
