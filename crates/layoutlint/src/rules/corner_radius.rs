//! `corner-radius-coherence`: nested radii that do not follow the parent.
//!
//! A decorated child sitting close to a rounded corner of its parent looks
//! right only when its own radius is the parent's radius minus the gap
//! between them. Corners farther in than half the parent radius are free.

use super::{px, Detector, RuleMeta, ViolationReport};
use crate::geometry::Rect;
use crate::message::Severity;
use crate::primitives::Geometry;
use crate::snapshot::Corner;
use serde::Deserialize;

/// Options for [`CornerRadiusCoherence`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Allowed difference between expected and found radius
    pub tolerance: f64,
    /// Insets above this fraction of the parent radius are not checked
    pub max_inset_ratio: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tolerance: 2.0,
            max_inset_ratio: 0.5,
        }
    }
}

const EPSILON: f64 = 1e-6;

/// The `corner-radius-coherence` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct CornerRadiusCoherence;

impl Detector for CornerRadiusCoherence {
    type Options = Options;

    fn id(&self) -> &'static str {
        "corner-radius-coherence"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new(
            Severity::Info,
            "Nested corner radius that does not follow its parent",
        )
    }

    fn detect(&self, geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
        detect(geo, options)
    }
}

/// Horizontal and vertical distance from the parent's corner to the
/// child's, positive when the child sits inside
fn corner_gap(corner: Corner, parent: &Rect, child: &Rect) -> (f64, f64) {
    match corner {
        Corner::TopLeft => (child.left - parent.left, child.top - parent.top),
        Corner::TopRight => (parent.right - child.right, child.top - parent.top),
        Corner::BottomRight => (parent.right - child.right, parent.bottom - child.bottom),
        Corner::BottomLeft => (child.left - parent.left, parent.bottom - child.bottom),
    }
}

/// Radius the child should have at a corner, if the corner is constrained
#[must_use]
pub fn expected_radius(parent_radius: f64, inset: f64, max_inset_ratio: f64) -> Option<f64> {
    if parent_radius <= 0.0 || inset < 0.0 || inset > parent_radius * max_inset_ratio {
        return None;
    }
    Some((parent_radius - inset).max(0.0))
}

/// Report decorated children whose corners break the nesting law
#[must_use]
pub fn detect(geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
    let mut reports = Vec::new();
    for parent in geo.candidates() {
        if !parent.style.has_rounded_corners(&parent.rect) {
            continue;
        }
        for child in geo.visible_children(parent) {
            if !child.style.has_decoration() {
                continue;
            }
            let mismatches: Vec<String> = Corner::ALL
                .iter()
                .filter_map(|&corner| {
                    let (dx, dy) = corner_gap(corner, &parent.rect, &child.rect);
                    let expected = expected_radius(
                        parent.style.corner_radius(corner, &parent.rect),
                        dx.min(dy),
                        options.max_inset_ratio,
                    )?;
                    let found = child.style.corner_radius(corner, &child.rect);
                    ((found - expected).abs() > options.tolerance + EPSILON).then(|| {
                        format!(
                            "{} expected ~{}, found {}",
                            corner.label(),
                            px(expected),
                            px(found)
                        )
                    })
                })
                .collect();
            if mismatches.is_empty() {
                continue;
            }
            reports.push(
                ViolationReport::new(
                    child.id,
                    format!(
                        "Corner radius does not match parent: {}",
                        mismatches.join("; ")
                    ),
                )
                .with_relation("parent", parent.id),
            );
        }
    }
    reports
}
