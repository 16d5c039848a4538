//! Geometry and visibility primitives shared by every detector.
//!
//! [`Geometry`] borrows one [`LayoutSnapshot`] and answers box-model
//! questions about its elements. All helpers are pure: the same snapshot
//! always produces the same answers, and nothing is cached between rule
//! runs because each run gets a fresh snapshot.
//!
//! | Concern | Helpers |
//! |---------|---------|
//! | Visibility | [`Geometry::is_visible`], [`Geometry::is_visible_in_viewport`] |
//! | Box model | [`Geometry::padding_rect`], [`Geometry::padding_box_size`] |
//! | Clipping | [`Geometry::clipping_ancestors`], [`clip_rect_by_ancestors`] |
//! | Intentional clipping | [`Geometry::is_intentionally_clipped`] |
//! | Text | [`Geometry::text_rects`], [`Geometry::text_bounds`] |
//! | Interaction | [`Geometry::is_interactive`], [`Geometry::are_label_associated`] |

mod box_model;
mod clipping;
mod interactive;
mod text;
mod visibility;

pub use clipping::{clip_rect_by_ancestors, ClippingAncestor, INTENTIONAL_CLIP_ATTRIBUTE};
pub use interactive::{interactive_selector, INTERACTIVE_ROLES};
pub use text::MIN_TEXT_LENGTH;

use crate::snapshot::{ElementId, ElementNode, LayoutSnapshot, Viewport};

/// Read-only geometry over one snapshot
#[derive(Debug, Clone, Copy)]
pub struct Geometry<'a> {
    snapshot: &'a LayoutSnapshot,
}

impl<'a> Geometry<'a> {
    /// Borrow a snapshot
    #[must_use]
    pub const fn new(snapshot: &'a LayoutSnapshot) -> Self {
        Self { snapshot }
    }

    /// Underlying snapshot
    #[must_use]
    pub const fn snapshot(&self) -> &'a LayoutSnapshot {
        self.snapshot
    }

    /// Viewport at capture time
    #[must_use]
    pub const fn viewport(&self) -> &'a Viewport {
        &self.snapshot.viewport
    }

    /// Element by handle
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&'a ElementNode> {
        self.snapshot.element(id)
    }

    /// Parent element
    #[must_use]
    pub fn parent(&self, el: &ElementNode) -> Option<&'a ElementNode> {
        el.parent.and_then(|p| self.snapshot.element(p))
    }

    /// Element children
    pub fn children(&self, el: &'a ElementNode) -> impl Iterator<Item = &'a ElementNode> + 'a {
        self.snapshot.children(el)
    }

    /// Ancestors, nearest first
    pub fn ancestors(&self, el: &'a ElementNode) -> impl Iterator<Item = &'a ElementNode> + 'a {
        self.snapshot.ancestors(el)
    }

    /// Visible children with a non-empty box
    pub fn visible_children(
        &self,
        el: &'a ElementNode,
    ) -> impl Iterator<Item = &'a ElementNode> + 'a {
        let geo = *self;
        self.children(el)
            .filter(move |&c| !c.rect.is_empty() && geo.is_visible(c))
    }

    /// The elements every detector starts from: in-scope HTML/SVG
    /// elements that are visible and have a non-zero box
    pub fn candidates(&self) -> impl Iterator<Item = &'a ElementNode> + 'a {
        let geo = *self;
        self.snapshot
            .scope_elements()
            .filter(move |&el| el.is_html_or_svg() && !el.rect.is_empty() && geo.is_visible(el))
    }

    /// Nearest ancestor positioned `absolute` or `fixed`
    #[must_use]
    pub fn layout_root(&self, el: &'a ElementNode) -> Option<ElementId> {
        self.ancestors(el)
            .find(|a| a.style.position().is_layout_root())
            .map(|a| a.id)
    }

    /// Whether `ancestor` contains `descendant` (or is it)
    #[must_use]
    pub fn contains(&self, ancestor: ElementId, descendant: ElementId) -> bool {
        self.snapshot.contains(ancestor, descendant)
    }
}
