//! Visibility resolution.

use super::Geometry;
use crate::snapshot::ElementNode;

impl<'a> Geometry<'a> {
    /// Whether the element and every ancestor are rendered and not hidden.
    ///
    /// Fails on `display: none`, `visibility: hidden | collapse`, any of the
    /// visually-hidden clipping patterns, or a cumulative opacity of zero.
    #[must_use]
    pub fn is_visible(&self, el: &'a ElementNode) -> bool {
        let mut opacity = 1.0;
        for node in std::iter::once(el).chain(self.ancestors(el)) {
            let style = &node.style;
            if style.is_display_none()
                || style.is_visibility_hidden()
                || self.is_visually_hidden_by_clipping(node)
            {
                return false;
            }
            opacity *= style.opacity();
        }
        opacity > 0.0
    }

    /// [`is_visible`](Self::is_visible) and the border box intersects the
    /// viewport with positive area
    #[must_use]
    pub fn is_visible_in_viewport(&self, el: &'a ElementNode) -> bool {
        !el.rect.is_empty() && el.rect.intersects(&self.viewport().rect()) && self.is_visible(el)
    }

    /// Product of the element's and all ancestors' opacity
    #[must_use]
    pub fn effective_opacity(&self, el: &'a ElementNode) -> f64 {
        std::iter::once(el)
            .chain(self.ancestors(el))
            .map(|n| n.style.opacity())
            .product()
    }

    /// `content-visibility: hidden`, a collapsed legacy `clip`, or a hiding
    /// `clip-path` on a 1x1 box or a box that clips on both axes
    fn is_visually_hidden_by_clipping(&self, el: &ElementNode) -> bool {
        let style = &el.style;
        if style.is_content_hidden() || style.legacy_clip_is_empty() {
            return true;
        }
        if !style.clip_path_hides() {
            return false;
        }
        let tiny = el.rect.width <= 1.0 && el.rect.height <= 1.0;
        let clips_both = style.overflow_x().clips() && style.overflow_y().clips();
        tiny || clips_both
    }
}
