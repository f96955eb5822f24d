//! Render cache for the Slate slide pipeline.
//!
//! Memoizes per-element rendered output (SVG, HTML, JavaScript) across runs so
//! unchanged elements are not re-rendered. Elements are identified by a
//! [`Fingerprint`] built from a configurable set of facets; entries are kept in
//! a single compressed data file and each output blob lives in its own
//! compressed file next to it.

#![warn(missing_docs)]

pub mod blob;
pub mod cache;
pub mod data;
pub mod document;
pub mod element;
pub mod error;
pub mod fingerprint;

pub use cache::RenderCache;
pub use data::{CacheData, CacheEntry, SourceStamp};
pub use document::{Document, Slide};
pub use element::{Element, ElementKind, OutputKind, Renderable};
pub use error::CacheError;
pub use fingerprint::{fingerprint, Fingerprint, FingerprintOptions};
