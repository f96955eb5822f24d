//! Element fingerprinting.
//!
//! A fingerprint is an XXH3-128 digest over a selection of an element's facets
//! (slide, arguments, render routine, content, declared size, position, extra
//! attributes). Every facet is written as a one-byte tag followed by
//! length-prefixed fields, so two different facet combinations never feed the
//! hasher the same byte stream.

use std::fmt;

use serde::{Deserialize, Serialize};
use slate_common::{ContentHash, ContentHasher};

use crate::document::Document;
use crate::element::Renderable;
use crate::error::CacheError;

/// Placeholder used for a declared width or height that is absent.
const MISSING_SIZE: &str = "None";

/// Stable identity of a renderable element.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(ContentHash);

impl Fingerprint {
    /// Returns the underlying content hash.
    pub fn content_hash(&self) -> ContentHash {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

/// Which facets are folded into a fingerprint.
///
/// Extra attributes listed by [`Renderable::cache_attributes`] are always
/// included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintOptions {
    /// The slide id.
    pub slide: bool,
    /// Every declared argument.
    pub args: bool,
    /// The render routine name.
    pub render: bool,
    /// The raw content.
    pub content: bool,
    /// Declared `width`/`height` arguments.
    pub size: bool,
    /// Number of elements already registered on the slide.
    pub position: bool,
}

impl FingerprintOptions {
    /// Facets used by cache lookups and records.
    ///
    /// Leaves out everything that depends on where the element sits, so the
    /// same content rendered by the same routine is recognized on any slide.
    pub const ELEMENT_EQUALITY: FingerprintOptions = FingerprintOptions {
        slide: false,
        args: false,
        render: true,
        content: true,
        size: false,
        position: false,
    };
}

impl Default for FingerprintOptions {
    /// Facets for general element id generation.
    fn default() -> Self {
        Self {
            slide: true,
            args: true,
            render: true,
            content: true,
            size: false,
            position: true,
        }
    }
}

/// Feeds tagged, length-prefixed facets into a hasher.
struct FacetWriter {
    hasher: ContentHasher,
}

impl FacetWriter {
    fn new() -> Self {
        Self {
            hasher: ContentHasher::new(),
        }
    }

    fn facet(&mut self, tag: u8, fields: &[&str]) {
        self.hasher.update(&[tag]);
        self.hasher.update(&(fields.len() as u64).to_le_bytes());
        for field in fields {
            self.field(field);
        }
    }

    fn field(&mut self, value: &str) {
        self.hasher.update(&(value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
    }

    fn finish(self) -> Option<Fingerprint> {
        if self.hasher.is_empty() {
            None
        } else {
            Some(Fingerprint(self.hasher.finish()))
        }
    }
}

/// Computes the fingerprint of `element` on slide `slide_id`.
///
/// Returns `Ok(None)` when no selected facet contributed anything; such an
/// element is never cached. Returns [`CacheError::FingerprintCollision`] when
/// the digest is already a registered element id on the slide.
pub fn fingerprint<R: Renderable + ?Sized>(
    doc: &Document,
    slide_id: &str,
    element: &R,
    options: FingerprintOptions,
) -> Result<Option<Fingerprint>, CacheError> {
    let mut writer = FacetWriter::new();

    if options.slide {
        writer.facet(b's', &[slide_id]);
    }

    if options.args && !element.args().is_empty() {
        let fields: Vec<&str> = element
            .args()
            .iter()
            .flat_map(|(k, v)| [k.as_str(), v.as_str()])
            .collect();
        writer.facet(b'a', &fields);
    }

    if options.render {
        if let Some(name) = element.name() {
            writer.facet(b'r', &[name]);
        }
    }

    if options.content {
        if let Some(content) = element.content() {
            writer.facet(b'c', &[content]);
        }
    }

    if options.size {
        let args = element.args();
        let width = args.get("width").map_or(MISSING_SIZE, String::as_str);
        let height = args.get("height").map_or(MISSING_SIZE, String::as_str);
        writer.facet(b'z', &[width, height]);
    }

    if options.position {
        let position = doc.element_count(slide_id).to_string();
        writer.facet(b'p', &[position.as_str()]);
    }

    for attr in element.cache_attributes() {
        match element.attribute(attr) {
            Some(value) => writer.facet(b'x', &[attr.as_str(), value.as_str()]),
            None => tracing::warn!(
                attribute = %attr,
                element = element.name().unwrap_or(element.kind().name()),
                "no such attribute for cache id, skipping"
            ),
        }
    }

    let Some(fp) = writer.finish() else {
        return Ok(None);
    };

    let id = fp.to_string();
    if doc.is_registered(slide_id, &id) {
        return Err(CacheError::FingerprintCollision {
            fingerprint: id,
            slide: slide_id.to_string(),
        });
    }

    Ok(Some(fp))
}
