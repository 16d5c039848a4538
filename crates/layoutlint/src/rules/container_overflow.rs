//! `container-overflow`: children escaping their container's box.

use super::{px, Detector, RuleMeta, ViolationReport};
use crate::geometry::Edges;
use crate::message::Severity;
use crate::primitives::{clip_rect_by_ancestors, Geometry};
use crate::snapshot::ElementNode;
use serde::Deserialize;

/// Options for [`ContainerOverflow`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Allowed overflow when the container clips
    pub clipped_threshold: f64,
    /// Allowed overflow when the container lets overflow show
    pub visible_threshold: f64,
    /// `top`/`left` at or below this marks an off-screen (skip-link) child
    pub offscreen_offset: f64,
    /// Slack for symmetric negative margins
    pub margin_tolerance: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            clipped_threshold: 1.0,
            visible_threshold: 20.0,
            offscreen_offset: -500.0,
            margin_tolerance: 2.0,
        }
    }
}

/// The `container-overflow` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerOverflow;

impl Detector for ContainerOverflow {
    type Options = Options;

    fn id(&self) -> &'static str {
        "container-overflow"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new(Severity::Warn, "Child element escaping its container")
    }

    fn detect(&self, geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
        detect(geo, options)
    }
}

/// Report children whose border box leaves their parent's box, unless
/// positioning takes them out of flow
#[must_use]
pub fn detect(geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
    let snapshot = geo.snapshot();
    let mut reports = Vec::new();
    for el in geo.candidates() {
        if el.style.position().is_out_of_flow() {
            continue;
        }
        let Some(parent) = geo.parent(el) else {
            continue;
        };
        if snapshot.is_document_level(parent) || snapshot.is_document_level(el) {
            continue;
        }
        if parent.style.has_ellipsis() || el.style.has_ellipsis() {
            continue;
        }
        if geo.is_intentionally_clipped(parent) || is_offscreen(el, options) {
            continue;
        }
        let threshold = if parent.style.clips_any_axis() {
            options.clipped_threshold
        } else if is_layout_container(parent) {
            options.visible_threshold
        } else {
            continue;
        };
        let Some(container) =
            clip_rect_by_ancestors(&parent.rect, &geo.clipping_ancestors(parent))
        else {
            continue;
        };

        let overflow =
            without_symmetric_margins(el, Edges::overflow(&container, &el.rect), options);
        let sides: Vec<String> = overflow
            .labelled()
            .iter()
            .filter(|(_, amount)| *amount > threshold)
            .map(|(side, amount)| format!("{side} {}", px(*amount)))
            .collect();
        if sides.is_empty() {
            continue;
        }
        reports.push(
            ViolationReport::new(
                el.id,
                format!("Element overflows its container: {}", sides.join(", ")),
            )
            .with_relation("container", parent.id),
        );
    }
    reports
}

/// Flex, grid, explicitly sized or max-width constrained
fn is_layout_container(el: &ElementNode) -> bool {
    el.style.is_flex()
        || el.style.is_grid()
        || el.explicit_width
        || el.explicit_height
        || el.style.has_max_width()
}

fn is_offscreen(el: &ElementNode, options: &Options) -> bool {
    let at_or_below = |v: Option<f64>| v.is_some_and(|v| v <= options.offscreen_offset);
    at_or_below(el.style.length("top"))
        || at_or_below(el.style.length("left"))
        || el.rect.right <= options.offscreen_offset
        || el.rect.bottom <= options.offscreen_offset
}

/// Zero out an axis where matching negative margins pull the child out by
/// the amount it overflows
fn without_symmetric_margins(el: &ElementNode, mut overflow: Edges, options: &Options) -> Edges {
    let m = el.style.margins();
    let symmetric =
        |a: f64, b: f64| a < 0.0 && b < 0.0 && (a - b).abs() <= options.margin_tolerance;
    if symmetric(m.left, m.right)
        && overflow.left <= -m.left + options.margin_tolerance
        && overflow.right <= -m.right + options.margin_tolerance
    {
        overflow.left = 0.0;
        overflow.right = 0.0;
    }
    if symmetric(m.top, m.bottom)
        && overflow.top <= -m.top + options.margin_tolerance
        && overflow.bottom <= -m.bottom + options.margin_tolerance
    {
        overflow.top = 0.0;
        overflow.bottom = 0.0;
    }
    overflow
}
