//! Viewport-space rectangles.
//!
//! Every rect in Layoutlint is in CSS pixels relative to the viewport, the
//! same space `getBoundingClientRect()` reports in. Width and height are
//! always derived from the edges and never negative.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RectRepr", into = "RectRepr")]
pub struct Rect {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge
    pub bottom: f64,
    /// `right - left`, clamped at 0
    pub width: f64,
    /// `bottom - top`, clamped at 0
    pub height: f64,
}

impl Rect {
    /// Create a rect from its edges
    #[must_use]
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            width: (right - left).max(0.0),
            height: (bottom - top).max(0.0),
        }
    }

    /// Create a rect from origin and size
    #[must_use]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_edges(x, y, x + width.max(0.0), y + height.max(0.0))
    }

    /// Area in square pixels
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Whether the rect has no area
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Horizontal center
    #[must_use]
    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// Vertical center
    #[must_use]
    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Intersection of two rects, `None` when they do not overlap with
    /// positive area
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if right - left <= 0.0 || bottom - top <= 0.0 {
            return None;
        }
        Some(Self::from_edges(left, top, right, bottom))
    }

    /// Whether the rects overlap with positive area
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.intersection(other).is_some()
    }

    /// Smallest rect containing both
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::from_edges(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Bounding box of a set of rects, `None` for an empty set
    pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        rects
            .into_iter()
            .fold(None, |acc: Option<Self>, r| Some(acc.map_or(*r, |a| a.union(r))))
    }

    /// Whether `other` lies inside this rect, allowing `tolerance` px on
    /// every side
    #[must_use]
    pub fn contains_rect(&self, other: &Self, tolerance: f64) -> bool {
        other.left >= self.left - tolerance
            && other.top >= self.top - tolerance
            && other.right <= self.right + tolerance
            && other.bottom <= self.bottom + tolerance
    }

    /// Whether a point lies inside the rect (edges inclusive)
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// Shrink every side by the given insets, clamping the size at 0
    #[must_use]
    pub fn inset(&self, edges: Edges) -> Self {
        let left = self.left + edges.left;
        let top = self.top + edges.top;
        let right = (self.right - edges.right).max(left);
        let bottom = (self.bottom - edges.bottom).max(top);
        Self::from_edges(left, top, right, bottom)
    }
}

/// Per-side lengths (borders, paddings, margins, overflow amounts)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Edges {
    /// Top side
    pub top: f64,
    /// Right side
    pub right: f64,
    /// Bottom side
    pub bottom: f64,
    /// Left side
    pub left: f64,
}

impl Edges {
    /// Create edges
    #[must_use]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Same length on every side
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// How far `inner` pokes out of `outer` on each side (positive = outside)
    #[must_use]
    pub fn overflow(outer: &Rect, inner: &Rect) -> Self {
        Self {
            top: outer.top - inner.top,
            right: inner.right - outer.right,
            bottom: inner.bottom - outer.bottom,
            left: outer.left - inner.left,
        }
    }

    /// Sides in CSS order, labelled
    #[must_use]
    pub fn labelled(&self) -> [(&'static str, f64); 4] {
        [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ]
    }
}

#[derive(Serialize, Deserialize)]
struct RectRepr {
    left: f64,
    top: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
}

impl From<RectRepr> for Rect {
    fn from(repr: RectRepr) -> Self {
        let right = repr
            .right
            .unwrap_or_else(|| repr.left + repr.width.unwrap_or(0.0));
        let bottom = repr
            .bottom
            .unwrap_or_else(|| repr.top + repr.height.unwrap_or(0.0));
        Self::from_edges(repr.left, repr.top, right, bottom)
    }
}

impl From<Rect> for RectRepr {
    fn from(rect: Rect) -> Self {
        Self {
            left: rect.left,
            top: rect.top,
            right: Some(rect.right),
            bottom: Some(rect.bottom),
            width: Some(rect.width),
            height: Some(rect.height),
        }
    }
}
