//! `overlapped-elements`: in-flow elements painting over each other.
//!
//! Elements are compared only within the same layout root, so content of a
//! positioned dialog is never compared with the page behind it. Each
//! unordered pair is tested once.

use super::{Detector, RuleMeta, ViolationReport};
use crate::geometry::Rect;
use crate::message::Severity;
use crate::primitives::{clip_rect_by_ancestors, Geometry};
use crate::snapshot::{ElementId, ElementNode};
use serde::Deserialize;
use std::collections::HashMap;

/// Options for [`OverlappedElements`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Overlap, as a fraction of the smaller element's visible area, that
    /// reports
    pub min_overlap_ratio: f64,
    /// Client rects smaller than this on either axis are ignored
    pub min_rect_size: f64,
    /// Footprints thinner than this on one axis...
    pub thin_footprint: f64,
    /// ...and covering less than this fraction are ignored
    pub thin_overlap_ratio: f64,
    /// Negative-margin overlaps below this fraction are ignored
    pub negative_margin_ratio: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_overlap_ratio: 0.05,
            min_rect_size: 1.0,
            thin_footprint: 12.0,
            thin_overlap_ratio: 0.2,
            negative_margin_ratio: 0.5,
        }
    }
}

/// The `overlapped-elements` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlappedElements;

impl Detector for OverlappedElements {
    type Options = Options;

    fn id(&self) -> &'static str {
        "overlapped-elements"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new(Severity::Error, "In-flow elements overlapping each other")
    }

    fn detect(&self, geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
        detect(geo, options)
    }
}

#[derive(Debug)]
struct Candidate<'a> {
    el: &'a ElementNode,
    rects: Vec<Rect>,
    bounds: Rect,
    area: f64,
    layout_root: Option<ElementId>,
}

impl<'a> Candidate<'a> {
    fn build(geo: &Geometry<'a>, el: &'a ElementNode, options: &Options) -> Option<Self> {
        let ancestors = geo.clipping_ancestors(el);
        let rects: Vec<Rect> = el
            .client_rects
            .iter()
            .filter_map(|r| clip_rect_by_ancestors(r, &ancestors))
            .filter(|r| r.width >= options.min_rect_size && r.height >= options.min_rect_size)
            .collect();
        let bounds = Rect::union_all(&rects)?;
        let area = rects.iter().map(Rect::area).sum();
        Some(Self {
            el,
            rects,
            bounds,
            area,
            layout_root: geo.layout_root(el),
        })
    }
}

#[derive(Debug)]
struct Overlap {
    area: f64,
    ratio: f64,
    footprint: Rect,
}

fn overlap(a: &Candidate<'_>, b: &Candidate<'_>) -> Option<Overlap> {
    if !a.bounds.intersects(&b.bounds) {
        return None;
    }
    let pieces: Vec<Rect> = a
        .rects
        .iter()
        .flat_map(|ra| b.rects.iter().filter_map(move |rb| ra.intersection(rb)))
        .collect();
    let footprint = Rect::union_all(&pieces)?;
    let area: f64 = pieces.iter().map(Rect::area).sum();
    let smaller = a.area.min(b.area);
    (smaller > 0.0).then(|| Overlap {
        area,
        ratio: area / smaller,
        footprint,
    })
}

/// Report pairs of in-flow elements that overlap
#[must_use]
pub fn detect(geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
    let snapshot = geo.snapshot();
    let candidates: Vec<Candidate<'_>> = geo
        .candidates()
        .filter(|el| !snapshot.is_document_level(el) && !el.style.position().is_out_of_flow())
        .filter_map(|el| Candidate::build(geo, el, options))
        .collect();
    let by_id: HashMap<ElementId, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (c.el.id, i))
        .collect();

    let mut reports = Vec::new();
    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            if a.layout_root != b.layout_root
                || geo.contains(a.el.id, b.el.id)
                || geo.contains(b.el.id, a.el.id)
            {
                continue;
            }
            let Some(hit) = overlap(a, b) else {
                continue;
            };
            if hit.ratio < options.min_overlap_ratio {
                continue;
            }
            if is_float_wrap(a.el, b.el)
                || is_thin(&hit, options)
                || is_negative_margin_overlap(a.el, b.el, &hit, options)
                || parent_overlaps(geo, &candidates, &by_id, a, b, options)
                || parent_overlaps(geo, &candidates, &by_id, b, a, options)
            {
                continue;
            }
            reports.push(
                ViolationReport::new(
                    b.el.id,
                    format!(
                        "Element overlaps another element by {:.0}% of the smaller element's area",
                        hit.ratio * 100.0
                    ),
                )
                .with_relation("overlapped element", a.el.id),
            );
        }
    }
    reports
}

/// A float next to the text-bearing sibling that wraps around it
fn is_float_wrap(a: &ElementNode, b: &ElementNode) -> bool {
    if a.parent != b.parent {
        return false;
    }
    let wraps = |float: &ElementNode, text: &ElementNode| {
        float.style.is_floated() && !text.style.is_floated() && text.has_direct_text()
    };
    wraps(a, b) || wraps(b, a)
}

fn is_thin(hit: &Overlap, options: &Options) -> bool {
    hit.footprint.width.min(hit.footprint.height) < options.thin_footprint
        && hit.ratio < options.thin_overlap_ratio
}

/// Overlap produced by a negative margin on either axis that covers it
fn is_negative_margin_overlap(
    a: &ElementNode,
    b: &ElementNode,
    hit: &Overlap,
    options: &Options,
) -> bool {
    if hit.ratio >= options.negative_margin_ratio {
        return false;
    }
    let pull = |el: &ElementNode| {
        let m = el.style.margins();
        (
            (-m.left).max(-m.right).max(0.0),
            (-m.top).max(-m.bottom).max(0.0),
        )
    };
    let ((ax, ay), (bx, by)) = (pull(a), pull(b));
    let covers = |margin: f64, extent: f64| margin > 0.0 && extent <= margin + 1.0;
    covers(ax.max(bx), hit.footprint.width) || covers(ay.max(by), hit.footprint.height)
}

/// The immediate parent of `child` already overlaps `other`, so the pair
/// would duplicate that report
fn parent_overlaps(
    geo: &Geometry<'_>,
    candidates: &[Candidate<'_>],
    by_id: &HashMap<ElementId, usize>,
    child: &Candidate<'_>,
    other: &Candidate<'_>,
    options: &Options,
) -> bool {
    let Some(parent) = child.el.parent else {
        return false;
    };
    if geo.contains(parent, other.el.id) {
        return false;
    }
    by_id
        .get(&parent)
        .and_then(|&i| overlap(&candidates[i], other))
        .is_some_and(|hit| hit.ratio >= options.min_overlap_ratio && hit.area > 0.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rules::tests::{block, doc, run_default};
    use crate::snapshot::{LayoutSnapshot, Viewport};
    use proptest::prelude::*;

    fn stacked(margin_top: f64) -> (LayoutSnapshot, ElementId, ElementId) {
        let mut d = doc();
        let body = d.body();
        let first = d.push(body, block(0.0, 0.0, 100.0, 100.0));
        let second = d.push(
            body,
            block(0.0, 100.0 + margin_top, 100.0, 100.0)
                .style("margin-top", &format!("{margin_top}px")),
        );
        (d.build(), first, second)
    }

    mod signal_tests {
        use super::*;

        #[test]
        fn test_negative_margin_top_overlap_reports_percent() {
            let (snap, first, second) = stacked(-55.0);
            let reports = run_default(&OverlappedElements, &snap);
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].element, second);
            assert_eq!(reports[0].relations[0].element, first);
            assert!(reports[0].message.contains("55%"));
        }

        #[test]
        fn test_below_five_percent_is_ignored() {
            let (snap, _, _) = stacked(-4.0);
            assert!(run_default(&OverlappedElements, &snap).is_empty());
        }

        #[test]
        fn test_ancestors_and_layout_roots() {
            let mut d = doc();
            let body = d.body();
            let outer = d.push(body, block(0.0, 0.0, 200.0, 200.0));
            d.push(outer, block(0.0, 0.0, 100.0, 100.0));
            let dialog = d.push(
                body,
                block(0.0, 0.0, 300.0, 300.0).style("position", "fixed"),
            );
            d.push(dialog, block(0.0, 0.0, 150.0, 150.0));
            assert!(run_default(&OverlappedElements, &d.build()).is_empty());
        }
    }

    mod exemption_tests {
        use super::*;

        #[test]
        fn test_float_with_wrapping_text() {
            let mut d = doc();
            let body = d.body();
            d.push(
                body,
                block(0.0, 0.0, 100.0, 100.0).style("float", "left"),
            );
            d.push(
                body,
                block(0.0, 0.0, 400.0, 100.0).text("wraps", vec![]),
            );
            assert!(run_default(&OverlappedElements, &d.build()).is_empty());
        }

        #[test]
        fn test_thin_overlap() {
            let mut d = doc();
            let body = d.body();
            d.push(body, block(0.0, 0.0, 100.0, 100.0));
            d.push(body, block(90.0, 0.0, 100.0, 100.0));
            assert!(run_default(&OverlappedElements, &d.build()).is_empty());
        }

        #[test]
        fn test_inline_negative_margin_below_half() {
            let mut d = doc();
            let body = d.body();
            d.push(body, block(0.0, 0.0, 100.0, 100.0));
            d.push(
                body,
                block(70.0, 0.0, 100.0, 100.0).style("margin-left", "-30px"),
            );
            assert!(run_default(&OverlappedElements, &d.build()).is_empty());
        }

        #[test]
        fn test_block_negative_margin_below_half() {
            for margin in [-20.0, -45.0] {
                let (snap, _, _) = stacked(margin);
                assert!(
                    run_default(&OverlappedElements, &snap).is_empty(),
                    "margin-top {margin}px"
                );
            }
        }

        #[test]
        fn test_negative_margin_bottom_pulls_next_sibling() {
            let mut d = doc();
            let body = d.body();
            d.push(
                body,
                block(0.0, 0.0, 100.0, 100.0).style("margin-bottom", "-30px"),
            );
            d.push(body, block(0.0, 70.0, 100.0, 100.0));
            assert!(run_default(&OverlappedElements, &d.build()).is_empty());
        }

        #[test]
        fn test_child_duplicate_suppressed_by_parent() {
            let mut d = doc();
            let body = d.body();
            let card = d.push(body, block(0.0, 0.0, 200.0, 100.0));
            d.push(card, block(0.0, 50.0, 200.0, 50.0));
            let banner = d.push(body, block(0.0, 40.0, 200.0, 100.0));
            let reports = run_default(&OverlappedElements, &d.build());
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].element, banner);
            assert_eq!(reports[0].relations[0].element, card);
        }

        #[test]
        fn test_clipped_part_does_not_count() {
            let mut d = doc();
            let body = d.body();
            let frame = d.push(
                body,
                block(0.0, 0.0, 100.0, 100.0)
                    .style("overflow-x", "hidden")
                    .style("overflow-y", "hidden"),
            );
            d.push(frame, block(0.0, 0.0, 300.0, 100.0));
            d.push(body, block(150.0, 0.0, 100.0, 100.0));
            assert!(run_default(&OverlappedElements, &d.build()).is_empty());
        }
    }

    proptest! {
        #[test]
        fn prop_each_pair_reported_once(
            boxes in prop::collection::vec((0u16..300, 0u16..300, 20u16..120, 20u16..120), 2..8)
        ) {
            let mut d = crate::snapshot::SnapshotBuilder::new(Viewport::default());
            let body = d.body();
            for (x, y, w, h) in &boxes {
                d.push(body, block(f64::from(*x), f64::from(*y), f64::from(*w), f64::from(*h)));
            }
            let snap = d.build();
            let reports = run_default(&OverlappedElements, &snap);
            let mut pairs = std::collections::HashSet::new();
            for r in &reports {
                let other = r.relations[0].element;
                let key = if r.element < other { (r.element, other) } else { (other, r.element) };
                prop_assert!(pairs.insert(key), "pair reported twice");
            }
            prop_assert_eq!(reports.clone(), run_default(&OverlappedElements, &snap));
        }
    }
}
