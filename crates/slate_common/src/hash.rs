//! Content hashing for render-cache identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content hash computed using XXH3.
///
/// Two inputs with the same `ContentHash` are assumed to be identical. The
/// hex form doubles as a stable file name, so the byte order is fixed
/// (little-endian) regardless of host.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental XXH3-128 hasher.
///
/// Feeding the same byte sequence in any chunking yields the same
/// [`ContentHash`].
#[derive(Clone, Default)]
pub struct ContentHasher {
    state: Xxh3,
    written: usize,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes to the hashed stream.
    pub fn update(&mut self, bytes: &[u8]) {
        self.state.update(bytes);
        self.written += bytes.len();
    }

    /// Returns `true` if nothing has been fed yet.
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Finishes the stream and returns its hash.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}
