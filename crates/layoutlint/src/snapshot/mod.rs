//! Layout snapshots.
//!
//! A [`LayoutSnapshot`] is everything a detector may look at: the element
//! tree of the rendered document with box geometry, resolved style, direct
//! text measurements and hit-test samples. The page produces a fresh one at
//! the start of every rule run; nothing in it is reused across runs.

mod builder;
mod style;

pub use builder::{hit_sample_points, ElementSpec, SnapshotBuilder, HIT_SAMPLE_GRID};
pub use style::{
    color_alpha, parse_px, ComputedStyleView, Corner, Overflow, Position, COLLECTED_PROPERTIES,
};

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Opaque handle to a live element, assigned by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// HTML element
    #[default]
    Html,
    /// SVG element
    Svg,
    /// Anything else (MathML, custom XML)
    Other,
}

/// Viewport size and scroll offset at snapshot time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// `innerWidth`
    pub width: f64,
    /// `innerHeight`
    pub height: f64,
    /// `scrollX`
    #[serde(default)]
    pub scroll_x: f64,
    /// `scrollY`
    #[serde(default)]
    pub scroll_y: f64,
}

impl Viewport {
    /// Create a viewport scrolled to the origin
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// The visible viewport rectangle `[0, 0, innerWidth, innerHeight]`
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_xywh(0.0, 0.0, self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// A direct text-node child with its per-line range rects
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextRun {
    /// Text content
    pub text: String,
    /// Client rects of a range spanning the text node
    #[serde(default)]
    pub rects: Vec<Rect>,
}

/// Result of `elementFromPoint` at one sample point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitSample {
    /// Viewport x
    pub x: f64,
    /// Viewport y
    pub y: f64,
    /// Topmost element at the point, `None` when the point hit nothing
    pub top: Option<ElementId>,
}

/// One element of the rendered document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    /// Page handle
    pub id: ElementId,
    /// Lowercase tag name
    pub tag: String,
    /// Namespace
    #[serde(default)]
    pub namespace: Namespace,
    /// Parent element (`None` for `documentElement`)
    #[serde(default)]
    pub parent: Option<ElementId>,
    /// Element children in document order
    #[serde(default)]
    pub children: Vec<ElementId>,
    /// Attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Border box (`getBoundingClientRect`)
    pub rect: Rect,
    /// Fragment boxes (`getClientRects`)
    #[serde(default)]
    pub client_rects: Vec<Rect>,
    /// Resolved style
    #[serde(default)]
    pub style: ComputedStyleView,
    /// `scrollWidth`
    #[serde(default)]
    pub scroll_width: f64,
    /// `scrollHeight`
    #[serde(default)]
    pub scroll_height: f64,
    /// Direct text-node children
    #[serde(default)]
    pub text: Vec<TextRun>,
    /// Width is set by an author rule or inline style rather than content
    #[serde(default)]
    pub explicit_width: bool,
    /// Height is set by an author rule or inline style rather than content
    #[serde(default)]
    pub explicit_height: bool,
    /// A click listener is attached through the `onclick` property
    #[serde(default)]
    pub has_click_handler: bool,
    /// Hit-test samples (interactive elements only)
    #[serde(default)]
    pub hit_samples: Vec<HitSample>,
}

impl ElementNode {
    /// Attribute value
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the attribute is present
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Tag name comparison
    #[must_use]
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// `id` attribute, if non-empty
    #[must_use]
    pub fn dom_id(&self) -> Option<&str> {
        self.attr("id").filter(|v| !v.is_empty())
    }

    /// Classes from the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// HTML or SVG element
    #[must_use]
    pub fn is_html_or_svg(&self) -> bool {
        matches!(self.namespace, Namespace::Html | Namespace::Svg)
    }

    /// Has at least one direct text node with visible characters
    #[must_use]
    pub fn has_direct_text(&self) -> bool {
        self.text.iter().any(|t| !t.text.trim().is_empty())
    }

    /// Concatenated direct text, whitespace-collapsed
    #[must_use]
    pub fn direct_text(&self) -> String {
        self.text
            .iter()
            .flat_map(|t| t.text.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The rendered document, as seen by one rule run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotRepr", into = "SnapshotRepr")]
pub struct LayoutSnapshot {
    /// Page URL
    pub url: String,
    /// Viewport at capture time
    pub viewport: Viewport,
    /// `documentElement`
    pub root: ElementId,
    /// Elements the detectors scan, in document order
    pub scope: Vec<ElementId>,
    elements: Vec<ElementNode>,
    index: HashMap<ElementId, usize>,
}

impl LayoutSnapshot {
    /// Assemble a snapshot from its parts
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        viewport: Viewport,
        root: ElementId,
        scope: Vec<ElementId>,
        elements: Vec<ElementNode>,
    ) -> Self {
        let index = elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
        Self {
            url: url.into(),
            viewport,
            root,
            scope,
            elements,
            index,
        }
    }

    /// Element by handle
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&ElementNode> {
        self.index.get(&id).map(|&i| &self.elements[i])
    }

    /// Mutable element by handle
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        let i = *self.index.get(&id)?;
        self.elements.get_mut(i)
    }

    /// All elements in document order
    #[must_use]
    pub fn elements(&self) -> &[ElementNode] {
        &self.elements
    }

    /// Number of elements in the document
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in scope (`scope.queryAll("*")`)
    pub fn scope_elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.scope.iter().filter_map(|id| self.element(*id))
    }

    /// Parent element
    #[must_use]
    pub fn parent(&self, el: &ElementNode) -> Option<&ElementNode> {
        el.parent.and_then(|p| self.element(p))
    }

    /// Element children in document order
    pub fn children<'a>(&'a self, el: &'a ElementNode) -> impl Iterator<Item = &'a ElementNode> {
        el.children.iter().filter_map(|c| self.element(*c))
    }

    /// Ancestors, nearest first, up to and including `documentElement`
    pub fn ancestors<'a>(&'a self, el: &'a ElementNode) -> Ancestors<'a> {
        Ancestors {
            snapshot: self,
            next: el.parent,
        }
    }

    /// Whether `ancestor` is `descendant` or one of its ancestors
    #[must_use]
    pub fn contains(&self, ancestor: ElementId, descendant: ElementId) -> bool {
        if ancestor == descendant {
            return true;
        }
        self.element(descendant)
            .is_some_and(|d| self.ancestors(d).any(|a| a.id == ancestor))
    }

    /// Whether the element is `<html>` or `<body>`
    #[must_use]
    pub fn is_document_level(&self, el: &ElementNode) -> bool {
        el.id == self.root || el.is("body") || el.is("html")
    }

    /// Descendants of `roots` (exclusive), in document order
    #[must_use]
    pub fn descendants_of(&self, roots: &[ElementId]) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| {
                roots
                    .iter()
                    .any(|r| *r != e.id && self.contains(*r, e.id))
            })
            .map(|e| e.id)
            .collect()
    }

    /// Replace the scanned element set
    #[must_use]
    pub fn with_scope(mut self, scope: Vec<ElementId>) -> Self {
        self.scope = scope;
        self
    }
}

/// Iterator over an element's ancestors
#[derive(Debug)]
pub struct Ancestors<'a> {
    snapshot: &'a LayoutSnapshot,
    next: Option<ElementId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ElementNode;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.snapshot.element(self.next?)?;
        self.next = el.parent;
        Some(el)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRepr {
    url: String,
    viewport: Viewport,
    root: ElementId,
    #[serde(default)]
    scope: Option<Vec<ElementId>>,
    elements: Vec<ElementNode>,
}

impl From<SnapshotRepr> for LayoutSnapshot {
    fn from(repr: SnapshotRepr) -> Self {
        let scope = repr
            .scope
            .unwrap_or_else(|| repr.elements.iter().map(|e| e.id).collect());
        Self::new(repr.url, repr.viewport, repr.root, scope, repr.elements)
    }
}

impl From<LayoutSnapshot> for SnapshotRepr {
    fn from(snapshot: LayoutSnapshot) -> Self {
        Self {
            url: snapshot.url,
            viewport: snapshot.viewport,
            root: snapshot.root,
            scope: Some(snapshot.scope),
            elements: snapshot.elements,
        }
    }
}
