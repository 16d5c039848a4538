//! Direct text measurement.

use super::Geometry;
use crate::geometry::Rect;
use crate::snapshot::ElementNode;

/// Shortest trimmed text node that is measured
pub const MIN_TEXT_LENGTH: usize = 1;

impl Geometry<'_> {
    /// Per-line rects of the element's direct text nodes.
    ///
    /// Nested elements' text is never included; zero-width or zero-height
    /// rects are dropped.
    #[must_use]
    pub fn text_rects(&self, el: &ElementNode) -> Vec<Rect> {
        el.text
            .iter()
            .filter(|run| run.text.trim().chars().count() >= MIN_TEXT_LENGTH)
            .flat_map(|run| run.rects.iter())
            .filter(|r| r.width > 0.0 && r.height > 0.0)
            .copied()
            .collect()
    }

    /// Bounding box of [`text_rects`](Self::text_rects)
    #[must_use]
    pub fn text_bounds(&self, el: &ElementNode) -> Option<Rect> {
        Rect::union_all(&self.text_rects(el))
    }
}
