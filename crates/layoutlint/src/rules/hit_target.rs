//! `hit-target-obscured`: click targets covered by something else.
//!
//! Works from the hit-test samples the page takes over each interactive
//! element. A sample is obscured when the topmost element at that point is
//! neither the target, its own subtree or ancestry, nor its label, and
//! actually paints something.

use super::{Detector, RuleMeta, ViolationReport};
use crate::message::Severity;
use crate::primitives::Geometry;
use crate::snapshot::{ElementId, ElementNode};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Options for [`HitTargetObscured`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Fraction of samples that must be obscured to report
    pub min_obscured_ratio: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_obscured_ratio: 0.5,
        }
    }
}

/// The `hit-target-obscured` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct HitTargetObscured;

impl Detector for HitTargetObscured {
    type Options = Options;

    fn id(&self) -> &'static str {
        "hit-target-obscured"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new(Severity::Error, "Click target covered by another element")
    }

    fn detect(&self, geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
        detect(geo, options)
    }
}

/// Report interactive elements whose hit area is mostly covered
#[must_use]
pub fn detect(geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
    let mut reports = Vec::new();
    for el in geo.candidates() {
        if el.hit_samples.is_empty()
            || !geo.is_interactive(el)
            || geo.is_disabled(el)
            || !geo.is_visible_in_viewport(el)
        {
            continue;
        }

        let mut sampled = 0usize;
        let mut obscurers: BTreeMap<ElementId, usize> = BTreeMap::new();
        for top in el.hit_samples.iter().filter_map(|s| s.top) {
            sampled += 1;
            if let Some(cover) = geo.element(top) {
                if obscures(geo, el, cover) {
                    *obscurers.entry(top).or_default() += 1;
                }
            }
        }
        if sampled == 0 {
            continue;
        }
        let obscured: usize = obscurers.values().sum();
        let ratio = obscured as f64 / sampled as f64;
        if ratio < options.min_obscured_ratio {
            continue;
        }
        // most frequent; lowest id wins ties
        let Some((&main, _)) = obscurers
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        else {
            continue;
        };
        reports.push(
            ViolationReport::new(
                el.id,
                format!(
                    "Click target is ~{:.0}% obscured by another element",
                    ratio * 100.0
                ),
            )
            .with_relation("obscuring element", main),
        );
    }
    reports
}

fn obscures<'a>(geo: &Geometry<'a>, target: &'a ElementNode, top: &'a ElementNode) -> bool {
    !(geo.contains(target.id, top.id)
        || geo.contains(top.id, target.id)
        || geo.are_label_associated(target, top)
        || !geo.has_visual_weight(top))
}
