//! `misalignment`: flex siblings a few pixels off from each other.
//!
//! For a row the candidate edges are top, bottom and the vertical centre;
//! for a column they are left, right and the horizontal centre. A pair is
//! aligned when its best-matching edge is within `alignedTolerance`. When
//! even the best edge is off by no more than `maxOffset` the pair is
//! reported on that edge; anything further apart reads as deliberate.

use super::{px, Detector, RuleMeta, ViolationReport};
use crate::geometry::Rect;
use crate::message::Severity;
use crate::primitives::Geometry;
use crate::snapshot::ElementNode;
use serde::Deserialize;

/// Options for [`Misalignment`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Children smaller than this on either axis are ignored
    pub min_size: f64,
    /// Offsets up to this are aligned
    pub aligned_tolerance: f64,
    /// Offsets above this are intentional
    pub max_offset: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_size: 24.0,
            aligned_tolerance: 1.0,
            max_offset: 6.0,
        }
    }
}

/// The `misalignment` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct Misalignment;

impl Detector for Misalignment {
    type Options = Options;

    fn id(&self) -> &'static str {
        "misalignment"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new(Severity::Warn, "Flex siblings a few pixels out of line")
    }

    fn detect(&self, geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
        detect(geo, options)
    }
}

/// Cross-axis edges compared for one flex direction, in tie-break order
fn edges(rect: &Rect, row: bool) -> [(&'static str, f64); 3] {
    if row {
        [
            ("top", rect.top),
            ("bottom", rect.bottom),
            ("center", rect.center_y()),
        ]
    } else {
        [
            ("left", rect.left),
            ("right", rect.right),
            ("center", rect.center_x()),
        ]
    }
}

/// Same flex line: the cross-axis ranges overlap
fn same_line(a: &Rect, b: &Rect, row: bool) -> bool {
    if row {
        a.top < b.bottom && b.top < a.bottom
    } else {
        a.left < b.right && b.left < a.right
    }
}

/// The best-aligned edge and its offset
fn closest_edge(a: &Rect, b: &Rect, row: bool) -> (&'static str, f64) {
    let ea = edges(a, row);
    let eb = edges(b, row);
    let mut best = (ea[0].0, (ea[0].1 - eb[0].1).abs());
    for i in 1..3 {
        let diff = (ea[i].1 - eb[i].1).abs();
        if diff < best.1 {
            best = (ea[i].0, diff);
        }
    }
    best
}

/// Report flex siblings whose best edge is slightly off
#[must_use]
pub fn detect(geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
    let mut reports = Vec::new();
    for container in geo.candidates() {
        if !container.style.is_flex() {
            continue;
        }
        let row = container.style.is_row_direction();
        let items: Vec<&ElementNode> = geo
            .visible_children(container)
            .filter(|c| !c.style.position().is_out_of_flow())
            .filter(|c| c.rect.width >= options.min_size && c.rect.height >= options.min_size)
            .collect();

        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                if !same_line(&a.rect, &b.rect, row) {
                    continue;
                }
                let (edge, offset) = closest_edge(&a.rect, &b.rect, row);
                if offset <= options.aligned_tolerance || offset > options.max_offset {
                    continue;
                }
                reports.push(
                    ViolationReport::new(
                        b.id,
                        format!(
                            "Element is misaligned with its sibling: {edge} edge off by {}",
                            px(offset)
                        ),
                    )
                    .with_relation("sibling", a.id),
                );
            }
        }
    }
    reports
}
