//! The renderable-element contract the cache memoizes output for.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Kind of rendered output an element can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputKind {
    /// Vector graphics markup.
    Svg,
    /// HTML markup.
    Html,
    /// JavaScript fragment.
    Js,
}

impl OutputKind {
    /// Every output kind, in the order the cache records them.
    pub const ALL: [OutputKind; 3] = [OutputKind::Svg, OutputKind::Html, OutputKind::Js];

    /// Short suffix used in blob names.
    pub fn suffix(self) -> &'static str {
        match self {
            OutputKind::Svg => "svg",
            OutputKind::Html => "html",
            OutputKind::Js => "js",
        }
    }
}

/// The render routine an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Text rendered through LaTeX.
    Text,
    /// Raw SVG included as-is.
    Svg,
    /// Raster or vector image loaded from a file.
    Image,
    /// TikZ picture.
    Tikz,
    /// Embedded video.
    Video,
    /// Plot or figure produced by an external tool.
    Figure,
    /// Container of other elements. Never cached: its output is assembled
    /// from its children on every run.
    Group,
}

impl ElementKind {
    /// Name of the render routine.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Svg => "svg",
            ElementKind::Image => "image",
            ElementKind::Tikz => "tikz",
            ElementKind::Video => "video",
            ElementKind::Figure => "figure",
            ElementKind::Group => "group",
        }
    }

    /// Returns `true` for the composite kind the cache skips.
    pub fn is_group(self) -> bool {
        self == ElementKind::Group
    }
}

/// Capabilities the cache needs from a renderable element.
pub trait Renderable {
    /// The element's kind.
    fn kind(&self) -> ElementKind;

    /// Name of the element's render routine, if it has one.
    fn name(&self) -> Option<&str>;

    /// Whether the renderer has produced output for this element.
    fn is_rendered(&self) -> bool;

    /// Raw content: inline source text or a path to a source file.
    fn content(&self) -> Option<&str>;

    /// Declared arguments, in a deterministic order.
    fn args(&self) -> &BTreeMap<String, String>;

    /// Rendered output of the given kind.
    fn output(&self, kind: OutputKind) -> Option<&[u8]>;

    /// Replaces rendered output of the given kind.
    fn set_output(&mut self, kind: OutputKind, bytes: Vec<u8>);

    /// Extra attribute names folded into the element's fingerprint.
    fn cache_attributes(&self) -> &[String];

    /// Current string value of an attribute, or `None` if it cannot be read.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Laid-out `(width, height)`.
    fn layout_size(&self) -> (f64, f64);

    /// Updates the laid-out size.
    fn update_size(&mut self, width: f64, height: f64);

    /// Content interpreted as a source file path.
    fn source_path(&self) -> Option<&Path> {
        self.content().map(Path::new)
    }
}

/// A concrete slide element.
#[derive(Debug, Clone)]
pub struct Element {
    kind: ElementKind,
    name: Option<String>,
    rendered: bool,
    content: Option<String>,
    args: BTreeMap<String, String>,
    outputs: BTreeMap<OutputKind, Vec<u8>>,
    cache_attributes: Vec<String>,
    attributes: BTreeMap<String, String>,
    width: f64,
    height: f64,
}

impl Element {
    /// Creates an unrendered element named after its kind.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            name: Some(kind.name().to_string()),
            rendered: false,
            content: None,
            args: BTreeMap::new(),
            outputs: BTreeMap::new(),
            cache_attributes: Vec::new(),
            attributes: BTreeMap::new(),
            width: 0.0,
            height: 0.0,
        }
    }

    /// Sets the raw content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Overrides the render routine name; `None` drops it from the fingerprint.
    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_string);
        self
    }

    /// Adds a declared argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Sets an attribute value.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Adds an attribute name to the fingerprint extension list.
    pub fn with_cache_attribute(mut self, name: impl Into<String>) -> Self {
        self.cache_attributes.push(name.into());
        self
    }

    /// Records renderer output and marks the element as rendered.
    pub fn render(
        &mut self,
        outputs: impl IntoIterator<Item = (OutputKind, Vec<u8>)>,
        width: f64,
        height: f64,
    ) {
        self.outputs.extend(outputs);
        self.width = width;
        self.height = height;
        self.rendered = true;
    }
}

impl Renderable for Element {
    fn kind(&self) -> ElementKind {
        self.kind
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn is_rendered(&self) -> bool {
        self.rendered
    }

    fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    fn args(&self) -> &BTreeMap<String, String> {
        &self.args
    }

    fn output(&self, kind: OutputKind) -> Option<&[u8]> {
        self.outputs.get(&kind).map(Vec::as_slice)
    }

    fn set_output(&mut self, kind: OutputKind, bytes: Vec<u8>) {
        self.outputs.insert(kind, bytes);
    }

    fn cache_attributes(&self) -> &[String] {
        &self.cache_attributes
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn layout_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn update_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }
}
