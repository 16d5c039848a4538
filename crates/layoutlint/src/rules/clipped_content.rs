//! `clipped-content`: content cut off by `overflow: hidden | clip`.
//!
//! An element that clips an axis and whose scroll size exceeds its padding
//! box on that axis hides content from the user. Vertical overflow is
//! measured against a font-relative threshold so descenders do not count.

use super::{px, Detector, RuleMeta, ViolationReport};
use crate::geometry::Rect;
use crate::message::Severity;
use crate::primitives::Geometry;
use crate::snapshot::ElementNode;
use serde::Deserialize;

/// Options for [`ClippedContent`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Horizontal overflow that still passes
    pub horizontal_threshold: f64,
    /// Floor of the vertical threshold
    pub min_vertical_threshold: f64,
    /// Vertical threshold as a fraction of `font-size`
    pub vertical_font_ratio: f64,
    /// Slack when comparing overflow against negative-margin gutters and
    /// symmetric child overflow
    pub tolerance: f64,
    /// Up to this many children are checked for fitting inside
    pub max_fit_children: usize,
    /// Rounded media containers may crop this much vertically
    pub media_crop_px: f64,
    /// ... or this fraction of their height, whichever is larger
    pub media_crop_ratio: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            horizontal_threshold: 1.0,
            min_vertical_threshold: 3.0,
            vertical_font_ratio: 0.2,
            tolerance: 2.0,
            max_fit_children: 5,
            media_crop_px: 4.0,
            media_crop_ratio: 0.02,
        }
    }
}

const MEDIA: &[&str] = &["img", "video", "canvas", "svg", "picture"];

/// The `clipped-content` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct ClippedContent;

impl Detector for ClippedContent {
    type Options = Options;

    fn id(&self) -> &'static str {
        "clipped-content"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new(
            Severity::Error,
            "Content cut off by an element that hides its overflow",
        )
    }

    fn detect(&self, geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
        detect(geo, options)
    }
}

/// Report every element that clips part of its content
#[must_use]
pub fn detect(geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
    let mut reports = Vec::new();
    for el in geo.candidates() {
        let style = &el.style;
        let clips_x = style.overflow_x().clips();
        let clips_y = style.overflow_y().clips();
        if !clips_x && !clips_y {
            continue;
        }
        if style.has_ellipsis() || style.is_line_clamped() {
            continue;
        }
        if geo.parent(el).is_some_and(|p| geo.is_intentionally_clipped(p)) {
            continue;
        }

        let padding = geo.padding_rect(el);
        let vertical_threshold = options
            .min_vertical_threshold
            .max(style.font_size() * options.vertical_font_ratio);
        let mut overflow_x = if clips_x {
            el.scroll_width - padding.width
        } else {
            0.0
        };
        let mut overflow_y = if clips_y {
            el.scroll_height - padding.height
        } else {
            0.0
        };
        if overflow_x <= options.horizontal_threshold && overflow_y <= vertical_threshold {
            continue;
        }

        let children: Vec<&ElementNode> = geo.visible_children(el).collect();
        if fits_inside(el, &children, &padding, options) {
            continue;
        }
        if is_gutter(&children, Axis::Horizontal, overflow_x, options)
            || symmetric_horizontal_spill(&children, &padding, options)
        {
            overflow_x = 0.0;
        }
        if is_gutter(&children, Axis::Vertical, overflow_y, options)
            || is_minor_media_crop(el, &children, overflow_y, options)
        {
            overflow_y = 0.0;
        }

        let mut parts = Vec::new();
        if overflow_x > options.horizontal_threshold {
            parts.push(format!("~{} horizontally", px(overflow_x)));
        }
        if overflow_y > vertical_threshold {
            parts.push(format!("~{} vertically", px(overflow_y)));
        }
        if parts.is_empty() {
            continue;
        }
        reports.push(ViolationReport::new(
            el.id,
            format!("Content is clipped by overflow: {}", parts.join(" and ")),
        ));
    }
    reports
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Few children, no text, and every child lies inside the padding box
fn fits_inside(
    el: &ElementNode,
    children: &[&ElementNode],
    padding: &Rect,
    options: &Options,
) -> bool {
    !children.is_empty()
        && children.len() <= options.max_fit_children
        && !el.has_direct_text()
        && children
            .iter()
            .all(|c| padding.contains_rect(&c.rect, options.tolerance))
}

/// Children pulled outward by matching negative margins account for the
/// whole overflow
fn is_gutter(children: &[&ElementNode], axis: Axis, overflow: f64, options: &Options) -> bool {
    if overflow <= 0.0 {
        return false;
    }
    let expected = children
        .iter()
        .filter_map(|c| {
            let m = c.style.margins();
            let (a, b) = match axis {
                Axis::Horizontal => (m.left, m.right),
                Axis::Vertical => (m.top, m.bottom),
            };
            (a < 0.0 && b < 0.0 && (a - b).abs() <= options.tolerance).then_some(-a - b)
        })
        .fold(0.0_f64, f64::max);
    expected > 0.0 && overflow <= expected + options.tolerance
}

/// Children spill out on the left and right by the same amount, as in a
/// centred track wider than its viewport
fn symmetric_horizontal_spill(
    children: &[&ElementNode],
    padding: &Rect,
    options: &Options,
) -> bool {
    let Some(union) = Rect::union_all(children.iter().map(|c| &c.rect)) else {
        return false;
    };
    let left = padding.left - union.left;
    let right = union.right - padding.right;
    left > options.horizontal_threshold
        && right > options.horizontal_threshold
        && (left - right).abs() <= options.tolerance
}

/// A rounded frame around a single media element trimming a sliver
fn is_minor_media_crop(
    el: &ElementNode,
    children: &[&ElementNode],
    overflow_y: f64,
    options: &Options,
) -> bool {
    let [only] = children else {
        return false;
    };
    let allowed = options
        .media_crop_px
        .max(el.rect.height * options.media_crop_ratio);
    el.style.has_rounded_corners(&el.rect)
        && MEDIA.contains(&only.tag.as_str())
        && overflow_y <= allowed
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rules::tests::{block, doc, run_default};
    use crate::snapshot::ElementSpec;

    fn clipping(w: f64, h: f64) -> ElementSpec {
        block(0.0, 0.0, w, h)
            .style("overflow-x", "hidden")
            .style("overflow-y", "hidden")
    }

    fn long_text(width: f64) -> Vec<Rect> {
        vec![Rect::from_xywh(0.0, 0.0, width, 18.0)]
    }

    mod signal_tests {
        use super::*;

        #[test]
        fn test_nowrap_text_reports_horizontal_px() {
            let mut d = doc();
            let body = d.body();
            let c = d.push(
                body,
                clipping(100.0, 20.0)
                    .id("c")
                    .style("white-space", "nowrap")
                    .text("VERY LONG TEXT...", long_text(400.0)),
            );
            let reports = run_default(&ClippedContent, &d.build());
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].element, c);
            assert!(reports[0].message.contains("~300px horizontally"));
        }

        #[test]
        fn test_horizontal_threshold_is_exclusive() {
            for (overflow, expected) in [(1.0, 0), (1.1, 1)] {
                let mut d = doc();
                let body = d.body();
                d.push(body, clipping(100.0, 20.0).scroll_size(100.0 + overflow, 20.0));
                assert_eq!(run_default(&ClippedContent, &d.build()).len(), expected);
            }
        }

        #[test]
        fn test_vertical_threshold_scales_with_font() {
            let mut d = doc();
            let body = d.body();
            d.push(
                body,
                clipping(100.0, 40.0)
                    .style("font-size", "40px")
                    .text("Tall", long_text(50.0))
                    .scroll_size(100.0, 47.0),
            );
            assert!(run_default(&ClippedContent, &d.build()).is_empty());

            let mut d = doc();
            let body = d.body();
            d.push(
                body,
                clipping(100.0, 40.0)
                    .style("font-size", "40px")
                    .text("Tall", long_text(50.0))
                    .scroll_size(100.0, 49.0),
            );
            let reports = run_default(&ClippedContent, &d.build());
            assert!(reports[0].message.contains("~9px vertically"));
        }

        #[test]
        fn test_visible_overflow_is_ignored() {
            let mut d = doc();
            let body = d.body();
            d.push(
                body,
                block(0.0, 0.0, 100.0, 20.0).text("wide", long_text(400.0)),
            );
            assert!(run_default(&ClippedContent, &d.build()).is_empty());
        }
    }

    mod exemption_tests {
        use super::*;

        #[test]
        fn test_ellipsis_and_clamp() {
            for (k, v) in [("text-overflow", "ellipsis"), ("-webkit-line-clamp", "2")] {
                let mut d = doc();
                let body = d.body();
                d.push(
                    body,
                    clipping(100.0, 20.0).style(k, v).text("x", long_text(400.0)),
                );
                assert!(run_default(&ClippedContent, &d.build()).is_empty());
            }
        }

        #[test]
        fn test_intentionally_clipped_parent() {
            let mut d = doc();
            let body = d.body();
            let card = d.push(
                body,
                block(0.0, 0.0, 300.0, 300.0)
                    .style("overflow-x", "hidden")
                    .style("border-top-left-radius", "12px"),
            );
            d.push(card, clipping(100.0, 20.0).text("x", long_text(400.0)));
            let reports = run_default(&ClippedContent, &d.build());
            assert!(reports.iter().all(|r| r.element == card));
        }

        #[test]
        fn test_negative_margin_gutter() {
            let mut d = doc();
            let body = d.body();
            let frame = d.push(body, clipping(300.0, 100.0).text("label", vec![]));
            d.push(
                frame,
                block(-8.0, 0.0, 316.0, 100.0)
                    .style("margin-left", "-8px")
                    .style("margin-right", "-8px"),
            );
            assert!(run_default(&ClippedContent, &d.build()).is_empty());
        }

        #[test]
        fn test_symmetric_spill() {
            let mut d = doc();
            let body = d.body();
            let track = d.push(body, clipping(300.0, 100.0).text("t", vec![]));
            d.push(track, block(-50.0, 0.0, 200.0, 100.0));
            d.push(track, block(150.0, 0.0, 200.0, 100.0));
            assert!(run_default(&ClippedContent, &d.build()).is_empty());
        }

        #[test]
        fn test_children_fitting_inside() {
            let mut d = doc();
            let body = d.body();
            let frame = d.push(body, clipping(300.0, 100.0).scroll_size(340.0, 100.0));
            d.push(frame, block(0.0, 0.0, 100.0, 100.0));
            assert!(run_default(&ClippedContent, &d.build()).is_empty());
        }

        #[test]
        fn test_rounded_media_crop() {
            let mut d = doc();
            let body = d.body();
            let frame = d.push(
                body,
                clipping(200.0, 150.0)
                    .style("border-top-left-radius", "8px")
                    .text("caption", vec![]),
            );
            d.push(frame, ElementSpec::new("img").xywh(0.0, 0.0, 200.0, 154.0));
            assert!(run_default(&ClippedContent, &d.build()).is_empty());
        }
    }
}
