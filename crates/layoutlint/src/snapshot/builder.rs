//! Synthetic layouts.
//!
//! ```
//! use layoutlint::{Rect, SnapshotBuilder, ElementSpec, Viewport};
//!
//! let mut doc = SnapshotBuilder::new(Viewport::new(800.0, 600.0));
//! let body = doc.body();
//! let card = doc.push(
//!     body,
//!     ElementSpec::new("div")
//!         .rect(Rect::from_xywh(10.0, 10.0, 200.0, 100.0))
//!         .style("border-top-left-radius", "12px"),
//! );
//! let snapshot = doc.build();
//! assert!(snapshot.element(card).is_some());
//! ```

use super::{
    ComputedStyleView, ElementId, ElementNode, HitSample, LayoutSnapshot, Namespace, TextRun,
    Viewport,
};
use crate::geometry::Rect;
use std::collections::{BTreeMap, HashMap};

/// Side length of the `elementFromPoint` sampling grid
pub const HIT_SAMPLE_GRID: usize = 5;

/// Sample points over `rect`: cell centres of a `HIT_SAMPLE_GRID` square grid
#[must_use]
pub fn hit_sample_points(rect: &Rect) -> Vec<(f64, f64)> {
    let n = HIT_SAMPLE_GRID as f64;
    let mut points = Vec::with_capacity(HIT_SAMPLE_GRID * HIT_SAMPLE_GRID);
    for row in 0..HIT_SAMPLE_GRID {
        for col in 0..HIT_SAMPLE_GRID {
            points.push((
                rect.left + (col as f64 + 0.5) * rect.width / n,
                rect.top + (row as f64 + 0.5) * rect.height / n,
            ));
        }
    }
    points
}

/// Description of one element to add to a [`SnapshotBuilder`]
#[derive(Debug, Clone)]
pub struct ElementSpec {
    tag: String,
    namespace: Namespace,
    attributes: BTreeMap<String, String>,
    rect: Rect,
    client_rects: Option<Vec<Rect>>,
    style: ComputedStyleView,
    scroll_size: Option<(f64, f64)>,
    text: Vec<TextRun>,
    explicit_width: bool,
    explicit_height: bool,
    has_click_handler: bool,
    sample_hits: bool,
}

impl ElementSpec {
    /// A `display: block` element with an empty box
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        let mut style = ComputedStyleView::new();
        style.set("display", "block");
        Self {
            tag: tag.into(),
            namespace: Namespace::Html,
            attributes: BTreeMap::new(),
            rect: Rect::default(),
            client_rects: None,
            style,
            scroll_size: None,
            text: Vec::new(),
            explicit_width: false,
            explicit_height: false,
            has_click_handler: false,
            sample_hits: false,
        }
    }

    /// Border box
    #[must_use]
    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Border box from origin and size
    #[must_use]
    pub fn xywh(self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect(Rect::from_xywh(x, y, width, height))
    }

    /// Fragment boxes (defaults to the border box alone)
    #[must_use]
    pub fn client_rects(mut self, rects: Vec<Rect>) -> Self {
        self.client_rects = Some(rects);
        self
    }

    /// Set a computed style property
    #[must_use]
    pub fn style(mut self, name: &str, value: &str) -> Self {
        self.style.set(name, value);
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Set the `class` attribute
    #[must_use]
    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    /// Append a direct text node measured as `rects`
    #[must_use]
    pub fn text(mut self, text: &str, rects: Vec<Rect>) -> Self {
        self.text.push(TextRun {
            text: text.to_string(),
            rects,
        });
        self
    }

    /// `scrollWidth`/`scrollHeight` (defaults to the content extent)
    #[must_use]
    pub fn scroll_size(mut self, width: f64, height: f64) -> Self {
        self.scroll_size = Some((width, height));
        self
    }

    /// Mark width and height as author-specified
    #[must_use]
    pub fn explicit_size(mut self, width: bool, height: bool) -> Self {
        self.explicit_width = width;
        self.explicit_height = height;
        self
    }

    /// Attach an `onclick` handler
    #[must_use]
    pub fn click_handler(mut self) -> Self {
        self.has_click_handler = true;
        self
    }

    /// Make this an SVG element
    #[must_use]
    pub fn svg(mut self) -> Self {
        self.namespace = Namespace::Svg;
        self
    }

    /// Record hit-test samples over this element when the snapshot is built
    #[must_use]
    pub fn sample_hits(mut self) -> Self {
        self.sample_hits = true;
        self
    }
}

/// Builds a [`LayoutSnapshot`] element by element.
///
/// `<html>` and `<body>` are created up front and cover the viewport. At
/// [`build`](Self::build) time elements are put in document order, scroll
/// sizes default to the extent of an element's content, and hit samples
/// are computed with later-in-document-order painting on top.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    url: String,
    viewport: Viewport,
    nodes: Vec<ElementNode>,
    explicit_scroll: Vec<bool>,
    sample_hits: Vec<bool>,
    index: HashMap<ElementId, usize>,
    next_id: u32,
}

impl SnapshotBuilder {
    /// Start a document for `viewport`
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        let mut builder = Self {
            url: "about:blank".to_string(),
            viewport,
            nodes: Vec::new(),
            explicit_scroll: Vec::new(),
            sample_hits: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
        };
        let page = viewport.rect();
        let html = builder.insert(None, ElementSpec::new("html").rect(page));
        builder.insert(Some(html), ElementSpec::new("body").rect(page));
        builder
    }

    /// Set the document URL
    pub fn url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = url.into();
        self
    }

    /// `documentElement`
    #[must_use]
    pub fn root(&self) -> ElementId {
        ElementId(1)
    }

    /// `<body>`
    #[must_use]
    pub fn body(&self) -> ElementId {
        ElementId(2)
    }

    /// Append `spec` as the last child of `parent`
    pub fn push(&mut self, parent: ElementId, spec: ElementSpec) -> ElementId {
        self.insert(Some(parent), spec)
    }

    /// Mutable access to an element already added
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        let i = *self.index.get(&id)?;
        self.nodes.get_mut(i)
    }

    fn insert(&mut self, parent: Option<ElementId>, spec: ElementSpec) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        let client_rects = spec.client_rects.unwrap_or_else(|| vec![spec.rect]);
        let (scroll_width, scroll_height) = spec.scroll_size.unwrap_or((0.0, 0.0));
        self.explicit_scroll.push(spec.scroll_size.is_some());
        self.sample_hits.push(spec.sample_hits);
        self.nodes.push(ElementNode {
            id,
            tag: spec.tag.to_ascii_lowercase(),
            namespace: spec.namespace,
            parent,
            children: Vec::new(),
            attributes: spec.attributes,
            rect: spec.rect,
            client_rects,
            style: spec.style,
            scroll_width,
            scroll_height,
            text: spec.text,
            explicit_width: spec.explicit_width,
            explicit_height: spec.explicit_height,
            has_click_handler: spec.has_click_handler,
            hit_samples: Vec::new(),
        });
        self.index.insert(id, self.nodes.len() - 1);
        if let Some(p) = parent.and_then(|p| self.index.get(&p).copied()) {
            self.nodes[p].children.push(id);
        }
        id
    }

    /// Finish the document; every element is in scope
    #[must_use]
    pub fn build(mut self) -> LayoutSnapshot {
        for i in 0..self.nodes.len() {
            if !self.explicit_scroll[i] {
                let (w, h) = self.content_extent(i);
                self.nodes[i].scroll_width = w;
                self.nodes[i].scroll_height = h;
            }
        }

        let order = self.document_order();
        for &i in &order {
            if self.sample_hits[i] {
                let samples = self.hit_samples(i, &order);
                self.nodes[i].hit_samples = samples;
            }
        }

        let mut slots: Vec<Option<ElementNode>> = self.nodes.into_iter().map(Some).collect();
        let elements: Vec<ElementNode> = order.iter().filter_map(|&i| slots[i].take()).collect();
        let scope = elements.iter().map(|e| e.id).collect();
        LayoutSnapshot::new(self.url, self.viewport, ElementId(1), scope, elements)
    }

    fn node(&self, id: ElementId) -> Option<&ElementNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Padding-box-relative extent of children and text, at least the
    /// padding box itself
    fn content_extent(&self, i: usize) -> (f64, f64) {
        let el = &self.nodes[i];
        let padding_box = el.rect.inset(el.style.border_widths());
        let content = el
            .children
            .iter()
            .filter_map(|c| self.node(*c))
            .filter(|c| !c.style.position().is_layout_root())
            .map(|c| c.rect)
            .chain(el.text.iter().flat_map(|t| t.rects.iter().copied()));
        let (mut right, mut bottom) = (padding_box.right, padding_box.bottom);
        for r in content {
            right = right.max(r.right);
            bottom = bottom.max(r.bottom);
        }
        (right - padding_box.left, bottom - padding_box.top)
    }

    fn document_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ElementId(1)];
        while let Some(id) = stack.pop() {
            let Some(&i) = self.index.get(&id) else {
                continue;
            };
            order.push(i);
            stack.extend(self.nodes[i].children.iter().rev().copied());
        }
        order
    }

    fn hit_samples(&self, target: usize, order: &[usize]) -> Vec<HitSample> {
        let viewport = self.viewport.rect();
        let Some(visible) = self.nodes[target].rect.intersection(&viewport) else {
            return Vec::new();
        };
        hit_sample_points(&visible)
            .into_iter()
            .map(|(x, y)| HitSample {
                x,
                y,
                top: order
                    .iter()
                    .rev()
                    .map(|&i| &self.nodes[i])
                    .find(|n| self.hittable(n) && n.rect.contains_point(x, y))
                    .map(|n| n.id),
            })
            .collect()
    }

    fn hittable(&self, node: &ElementNode) -> bool {
        if node.style.ignores_pointer() || node.style.is_visibility_hidden() {
            return false;
        }
        let mut current = Some(node);
        while let Some(n) = current {
            if n.style.is_display_none() {
                return false;
            }
            current = n.parent.and_then(|p| self.node(p));
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_document_order_follows_tree() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let a = doc.push(body, ElementSpec::new("div"));
        let b = doc.push(body, ElementSpec::new("div"));
        let a1 = doc.push(a, ElementSpec::new("span"));
        let snap = doc.build();
        let ids: Vec<_> = snap.elements().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![ElementId(1), ElementId(2), a, a1, b]);
    }

    #[test]
    fn test_scroll_size_defaults_to_content_extent() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let c = doc.push(
            body,
            ElementSpec::new("div")
                .xywh(0.0, 0.0, 100.0, 20.0)
                .text("long", vec![Rect::from_xywh(0.0, 0.0, 400.0, 18.0)]),
        );
        let snap = doc.build();
        let el = snap.element(c).unwrap();
        assert_eq!(el.scroll_width, 400.0);
        assert_eq!(el.scroll_height, 20.0);
    }

    #[test]
    fn test_hit_samples_prefer_later_elements() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let button = doc.push(
            body,
            ElementSpec::new("button")
                .xywh(0.0, 0.0, 100.0, 40.0)
                .sample_hits(),
        );
        let cover = doc.push(body, ElementSpec::new("div").xywh(0.0, 0.0, 100.0, 16.0));
        let snap = doc.build();
        let samples = &snap.element(button).unwrap().hit_samples;
        assert_eq!(samples.len(), 25);
        let covered = samples.iter().filter(|s| s.top == Some(cover)).count();
        assert_eq!(covered, 10);
    }

    #[test]
    fn test_sample_points_are_cell_centres() {
        let points = hit_sample_points(&Rect::from_xywh(0.0, 0.0, 50.0, 50.0));
        assert_eq!(points[0], (5.0, 5.0));
        assert_eq!(points[24], (45.0, 45.0));
    }
}
