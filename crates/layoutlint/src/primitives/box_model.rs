//! Box-model derivations.

use super::Geometry;
use crate::geometry::Rect;
use crate::snapshot::ElementNode;

impl Geometry<'_> {
    /// Border box minus border widths, clamped at zero size
    #[must_use]
    pub fn padding_rect(&self, el: &ElementNode) -> Rect {
        el.rect.inset(el.style.border_widths())
    }

    /// Width and height of the padding box
    #[must_use]
    pub fn padding_box_size(&self, el: &ElementNode) -> (f64, f64) {
        let r = self.padding_rect(el);
        (r.width, r.height)
    }

    /// Padding box minus paddings: where in-flow content is laid out
    #[must_use]
    pub fn content_rect(&self, el: &ElementNode) -> Rect {
        self.padding_rect(el).inset(el.style.paddings())
    }
}
