//! `space-misuse`: lopsided empty space around simple content.
//!
//! Only leaf-like containers are checked: a handful of children that
//! either leave most of the box empty or are dominated by one child. For
//! each axis the detector compares the empty space on both sides of the
//! children's union box:
//!
//! - **Irregular gap**: the larger side is big and much bigger than the
//!   smaller one (content flush to one side of a roomy box).
//! - **Sparse axis**: content fills little of the axis and the leftover is
//!   split fairly evenly, so the box is simply too large for it.
//!
//! An axis whose empty side is visually occupied by a sibling of the
//! container, or by one of its own positioned children, is left alone.

use super::{px, Detector, RuleMeta, ViolationReport};
use crate::geometry::Rect;
use crate::message::Severity;
use crate::primitives::Geometry;
use crate::snapshot::ElementNode;
use serde::Deserialize;

/// Options for [`SpaceMisuse`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Smallest container checked, per axis
    pub min_container_size: f64,
    /// Smallest content union checked, per axis
    pub min_content_size: f64,
    /// Most visible children a leaf-like container may have
    pub max_children: usize,
    /// Leaf-like when content covers less than this fraction of the area...
    pub max_fill: f64,
    /// ...or one child covers at least this fraction
    pub dominant_child: f64,
    /// Content below this fill on both axes is an icon or badge
    pub icon_fill: f64,
    /// Larger gap that counts as irregular
    pub min_gap: f64,
    /// Required difference between the two gaps
    pub min_gap_difference: f64,
    /// Axis fill below which the axis is sparse
    pub sparse_fill: f64,
    /// Unused space a sparse axis must waste
    pub min_unused: f64,
    /// Largest larger/smaller split still counted as balanced
    pub max_split_ratio: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_container_size: 50.0,
            min_content_size: 10.0,
            max_children: 3,
            max_fill: 0.3,
            dominant_child: 0.5,
            icon_fill: 0.2,
            min_gap: 60.0,
            min_gap_difference: 40.0,
            sparse_fill: 0.25,
            min_unused: 100.0,
            max_split_ratio: 3.0,
        }
    }
}

/// The `space-misuse` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceMisuse;

impl Detector for SpaceMisuse {
    type Options = Options;

    fn id(&self) -> &'static str {
        "space-misuse"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new(Severity::Info, "Lopsided or wasted empty space in a container")
    }

    fn detect(&self, geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
        detect(geo, options)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    const fn label(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }

    /// Gaps before and after `content` inside `frame`
    fn gaps(self, frame: &Rect, content: &Rect) -> (f64, f64) {
        match self {
            Self::Horizontal => (content.left - frame.left, frame.right - content.right),
            Self::Vertical => (content.top - frame.top, frame.bottom - content.bottom),
        }
    }

    fn extent(self, rect: &Rect) -> f64 {
        match self {
            Self::Horizontal => rect.width,
            Self::Vertical => rect.height,
        }
    }

    /// The empty bands before and after `content`
    fn gap_regions(self, frame: &Rect, content: &Rect) -> [Rect; 2] {
        match self {
            Self::Horizontal => [
                Rect::from_edges(frame.left, frame.top, content.left, frame.bottom),
                Rect::from_edges(content.right, frame.top, frame.right, frame.bottom),
            ],
            Self::Vertical => [
                Rect::from_edges(frame.left, frame.top, frame.right, content.top),
                Rect::from_edges(frame.left, content.bottom, frame.right, frame.bottom),
            ],
        }
    }
}

/// Report leaf-like containers with badly distributed empty space
#[must_use]
pub fn detect(geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
    let snapshot = geo.snapshot();
    let mut reports = Vec::new();
    for container in geo.candidates() {
        if snapshot.is_document_level(container)
            || container.style.is_grid()
            || container.has_direct_text()
        {
            continue;
        }
        let (children, positioned): (Vec<&ElementNode>, Vec<&ElementNode>) = geo
            .visible_children(container)
            .partition(|c| !c.style.position().is_layout_root());
        if children.is_empty() || children.len() > options.max_children {
            continue;
        }
        let frame = geo.padding_rect(container);
        let Some(content) = Rect::union_all(children.iter().map(|c| &c.rect)) else {
            continue;
        };
        if frame.width < options.min_container_size
            || frame.height < options.min_container_size
            || content.width < options.min_content_size
            || content.height < options.min_content_size
        {
            continue;
        }
        if !is_leaf_like(&frame, &content, &children, options) {
            continue;
        }
        let fill_x = content.width / frame.width;
        let fill_y = content.height / frame.height;
        if fill_x < options.icon_fill && fill_y < options.icon_fill {
            continue;
        }

        let neighbours: Vec<&ElementNode> = geo
            .parent(container)
            .map(|p| {
                geo.visible_children(p)
                    .filter(|s| s.id != container.id)
                    .collect()
            })
            .unwrap_or_default();
        let findings: Vec<String> = [Axis::Horizontal, Axis::Vertical]
            .into_iter()
            .filter(|&axis| {
                !gap_is_occupied(
                    axis,
                    &frame,
                    &content,
                    neighbours.iter().chain(&positioned).copied(),
                )
            })
            .filter_map(|axis| describe_axis(axis, &frame, &content, options))
            .collect();
        if findings.is_empty() {
            continue;
        }
        reports.push(ViolationReport::new(
            container.id,
            format!("Unbalanced empty space: {}", findings.join("; ")),
        ));
    }
    reports
}

fn is_leaf_like(
    frame: &Rect,
    content: &Rect,
    children: &[&ElementNode],
    options: &Options,
) -> bool {
    let area = frame.area();
    if area <= 0.0 {
        return false;
    }
    let largest = children.iter().map(|c| c.rect.area()).fold(0.0_f64, f64::max);
    content.area() / area < options.max_fill || largest / area >= options.dominant_child
}

fn gap_is_occupied<'a>(
    axis: Axis,
    frame: &Rect,
    content: &Rect,
    mut others: impl Iterator<Item = &'a ElementNode>,
) -> bool {
    let regions = axis.gap_regions(frame, content);
    others.any(|el| {
        regions
            .iter()
            .filter(|r| !r.is_empty())
            .any(|r| r.intersects(&el.rect))
    })
}

fn describe_axis(axis: Axis, frame: &Rect, content: &Rect, options: &Options) -> Option<String> {
    let (before, after) = axis.gaps(frame, content);
    let (smaller, larger) = (before.min(after).max(0.0), before.max(after));
    if larger >= options.min_gap && larger - smaller >= options.min_gap_difference {
        return Some(format!(
            "{} gaps {} and {}",
            axis.label(),
            px(before.max(0.0)),
            px(after.max(0.0))
        ));
    }

    let fill = axis.extent(content) / axis.extent(frame);
    let unused = before.max(0.0) + after.max(0.0);
    let balanced = smaller > 0.0 && larger / smaller <= options.max_split_ratio;
    (fill < options.sparse_fill && unused >= options.min_unused && balanced).then(|| {
        format!(
            "{} content fills {:.0}% with {} unused",
            axis.label(),
            fill * 100.0,
            px(unused)
        )
    })
}
