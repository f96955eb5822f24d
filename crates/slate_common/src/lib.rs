//! Shared foundational types used across the Slate rendering toolchain.
//!
//! Currently this is the content hash that backs element fingerprints and
//! blob names in the render cache.

#![warn(missing_docs)]

pub mod hash;

pub use hash::{ContentHash, ContentHasher};
