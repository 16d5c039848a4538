//! Clipping-ancestor walk and the "intentionally clipped" heuristic.

use super::Geometry;
use crate::geometry::Rect;
use crate::snapshot::ElementNode;

/// Attribute authors put on an element to declare its clipping deliberate
pub const INTENTIONAL_CLIP_ATTRIBUTE: &str = "data-layoutlint-clip";

/// An ancestor whose overflow clips on at least one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippingAncestor {
    /// Padding box of the ancestor
    pub rect: Rect,
    /// Clips horizontally
    pub clips_x: bool,
    /// Clips vertically
    pub clips_y: bool,
}

/// Intersect `rect` with every ancestor on the axes that ancestor clips.
///
/// Returns `None` once the remaining rect has no width or height.
#[must_use]
pub fn clip_rect_by_ancestors(rect: &Rect, ancestors: &[ClippingAncestor]) -> Option<Rect> {
    let mut out = *rect;
    for a in ancestors {
        let (left, right) = if a.clips_x {
            (out.left.max(a.rect.left), out.right.min(a.rect.right))
        } else {
            (out.left, out.right)
        };
        let (top, bottom) = if a.clips_y {
            (out.top.max(a.rect.top), out.bottom.min(a.rect.bottom))
        } else {
            (out.top, out.bottom)
        };
        if right - left <= 0.0 || bottom - top <= 0.0 {
            return None;
        }
        out = Rect::from_edges(left, top, right, bottom);
    }
    (out.width > 0.0 && out.height > 0.0).then_some(out)
}

impl<'a> Geometry<'a> {
    /// Every ancestor (up to `documentElement`) whose overflow clips
    #[must_use]
    pub fn clipping_ancestors(&self, el: &'a ElementNode) -> Vec<ClippingAncestor> {
        self.ancestors(el)
            .filter_map(|a| {
                let clips_x = a.style.overflow_x().clips();
                let clips_y = a.style.overflow_y().clips();
                (clips_x || clips_y).then(|| ClippingAncestor {
                    rect: self.padding_rect(a),
                    clips_x,
                    clips_y,
                })
            })
            .collect()
    }

    /// The part of the border box left after ancestor clipping
    #[must_use]
    pub fn visible_rect(&self, el: &'a ElementNode) -> Option<Rect> {
        clip_rect_by_ancestors(&el.rect, &self.clipping_ancestors(el))
    }

    /// Whether overflow clipping on `el` looks like a design decision.
    ///
    /// True for the opt-out attribute, any `clip-path` or mask, or clipping
    /// overflow combined with an ellipsis, a line clamp, rounded corners,
    /// visible decoration, or non-static positioning.
    #[must_use]
    pub fn is_intentionally_clipped(&self, el: &ElementNode) -> bool {
        let style = &el.style;
        if el.has_attr(INTENTIONAL_CLIP_ATTRIBUTE)
            || style.has_clip_path()
            || style.has_mask_image()
        {
            return true;
        }
        if !style.clips_any_axis() {
            return false;
        }
        style.has_ellipsis()
            || style.is_line_clamped()
            || style.has_rounded_corners(&el.rect)
            || style.has_decoration()
            || style.position() != crate::snapshot::Position::Static
    }
}
