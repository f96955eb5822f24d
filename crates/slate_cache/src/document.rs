//! The document-side state the cache reads and writes.

use std::collections::{BTreeMap, BTreeSet};

use slate_config::SlateConfig;

/// Key under which glyph definitions are shared in [`Document::global_store`].
pub const GLYPHS_KEY: &str = "glyphs";

/// Element ids registered on one slide.
#[derive(Debug, Clone, Default)]
pub struct Slide {
    /// Ids of the elements already placed on this slide.
    pub element_keys: BTreeSet<String>,
}

/// The document being rendered.
///
/// The cache never holds on to a `Document`; every operation receives the
/// one it needs, together with the slide it concerns.
#[derive(Debug, Clone)]
pub struct Document {
    /// Version token of the producing toolchain.
    pub version: String,
    /// Whether SVG output is optimized.
    pub optimize_svg: bool,
    /// Data shared across all slides, such as glyph definitions.
    pub global_store: BTreeMap<String, Vec<u8>>,
    /// Slides keyed by id.
    pub slides: BTreeMap<String, Slide>,
}

impl Document {
    /// Creates an empty document.
    pub fn new(version: impl Into<String>, optimize_svg: bool) -> Self {
        Self {
            version: version.into(),
            optimize_svg,
            global_store: BTreeMap::new(),
            slides: BTreeMap::new(),
        }
    }

    /// Creates an empty document whose render settings come from `slate.toml`.
    pub fn from_config(version: impl Into<String>, config: &SlateConfig) -> Self {
        Self::new(version, config.render.optimize_svg)
    }

    /// Registers an element id on a slide, creating the slide if needed.
    ///
    /// Returns `false` if the id was already registered.
    pub fn register_element(&mut self, slide_id: &str, element_id: impl Into<String>) -> bool {
        self.slides
            .entry(slide_id.to_string())
            .or_default()
            .element_keys
            .insert(element_id.into())
    }

    /// Returns `true` if `element_id` is registered on `slide_id`.
    pub fn is_registered(&self, slide_id: &str, element_id: &str) -> bool {
        self.slides
            .get(slide_id)
            .is_some_and(|s| s.element_keys.contains(element_id))
    }

    /// Number of elements registered on a slide; zero for unknown slides.
    pub fn element_count(&self, slide_id: &str) -> usize {
        self.slides
            .get(slide_id)
            .map_or(0, |s| s.element_keys.len())
    }
}
