//! `ragged-lines`: orphaned or very short wrapped lines.
//!
//! An element's direct text rects are grouped into visual lines by their
//! bottom edge. A last line much shorter than the longest one is an
//! orphan; a short line in the middle of a paragraph usually means a
//! forced break or an unbreakable word pushed to the next line.

use super::{px, Detector, RuleMeta, ViolationReport};
use crate::geometry::Rect;
use crate::message::Severity;
use crate::primitives::Geometry;
use serde::Deserialize;

/// Options for [`RaggedLines`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Rects whose bottoms are this close share a line
    pub line_tolerance: f64,
    /// Narrower lines are dropped
    pub min_line_width: f64,
    /// Narrower elements are skipped
    pub min_element_width: f64,
    /// Last line below this fraction of the longest is an orphan
    pub orphan_ratio: f64,
    /// Interior line below this fraction of the longest is reported
    pub interior_ratio: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            line_tolerance: 3.0,
            min_line_width: 5.0,
            min_element_width: 40.0,
            orphan_ratio: 0.45,
            interior_ratio: 0.30,
        }
    }
}

/// The `ragged-lines` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct RaggedLines;

impl Detector for RaggedLines {
    type Options = Options;

    fn id(&self) -> &'static str {
        "ragged-lines"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new(Severity::Info, "Orphaned or very short wrapped lines")
    }

    fn detect(&self, geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
        detect(geo, options)
    }
}

/// Widths of the visual lines formed by `rects`, top to bottom
#[must_use]
pub fn line_widths(rects: &[Rect], options: &Options) -> Vec<f64> {
    let mut sorted = rects.to_vec();
    sorted.sort_by(|a, b| a.bottom.total_cmp(&b.bottom));

    let mut lines: Vec<(f64, Rect)> = Vec::new();
    for rect in sorted {
        match lines.last_mut() {
            Some((baseline, span)) if (rect.bottom - *baseline).abs() <= options.line_tolerance => {
                *span = span.union(&rect);
            }
            _ => lines.push((rect.bottom, rect)),
        }
    }
    lines
        .into_iter()
        .map(|(_, span)| span.width)
        .filter(|w| *w >= options.min_line_width)
        .collect()
}

/// Report elements whose wrapped text leaves short lines
#[must_use]
pub fn detect(geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
    let mut reports = Vec::new();
    for el in geo.candidates() {
        if el.rect.width < options.min_element_width {
            continue;
        }
        let widths = line_widths(&geo.text_rects(el), options);
        let count = widths.len();
        if count < 2 {
            continue;
        }
        let longest = widths.iter().copied().fold(0.0_f64, f64::max);
        if longest < options.min_line_width {
            continue;
        }

        let mut issues = Vec::new();
        for (i, &width) in widths.iter().enumerate().take(count - 1).skip(1) {
            let ratio = width / longest;
            if ratio < options.interior_ratio {
                issues.push(format!(
                    "line {}/{count} is {} ({:.0}% of the longest line)",
                    i + 1,
                    px(width),
                    ratio * 100.0
                ));
            }
        }
        let last = widths[count - 1];
        let ratio = last / longest;
        if ratio < options.orphan_ratio {
            issues.push(format!(
                "last line {count}/{count} is {} ({:.0}% of the longest line)",
                px(last),
                ratio * 100.0
            ));
        }
        if issues.is_empty() {
            continue;
        }
        reports.push(ViolationReport::new(
            el.id,
            format!("Ragged text wrapping: {}", issues.join("; ")),
        ));
    }
    reports
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rules::tests::{block, doc, run_default};

    fn paragraph(widths: &[f64]) -> Vec<ViolationReport> {
        let rects = widths
            .iter()
            .enumerate()
            .map(|(i, w)| Rect::from_xywh(0.0, i as f64 * 20.0, *w, 18.0))
            .collect();
        let mut d = doc();
        let body = d.body();
        d.push(
            body,
            block(0.0, 0.0, 220.0, widths.len() as f64 * 20.0).text("some wrapped words", rects),
        );
        run_default(&RaggedLines, &d.build())
    }

    #[test]
    fn test_orphan_boundary() {
        assert!(paragraph(&[200.0, 90.0]).is_empty());
        let reports = paragraph(&[200.0, 88.0]);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("last line 2/2 is 88px (44% of the longest line)"));
    }

    #[test]
    fn test_interior_short_line() {
        let reports = paragraph(&[200.0, 40.0, 190.0, 150.0]);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("line 2/4 is 40px"));
        assert!(!reports[0].message.contains("last line"));
    }

    #[test]
    fn test_both_issues_merged() {
        let reports = paragraph(&[200.0, 40.0, 20.0]);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("; "));
    }

    #[test]
    fn test_single_line_and_narrow_element() {
        assert!(paragraph(&[200.0]).is_empty());

        let mut d = doc();
        let body = d.body();
        d.push(
            body,
            block(0.0, 0.0, 30.0, 40.0).text(
                "ab cd",
                vec![
                    Rect::from_xywh(0.0, 0.0, 30.0, 18.0),
                    Rect::from_xywh(0.0, 20.0, 6.0, 18.0),
                ],
            ),
        );
        assert!(run_default(&RaggedLines, &d.build()).is_empty());
    }

    #[test]
    fn test_rects_on_one_baseline_merge() {
        let opts = Options::default();
        let widths = line_widths(
            &[
                Rect::from_xywh(0.0, 0.0, 50.0, 18.0),
                Rect::from_xywh(60.0, 2.0, 40.0, 18.0),
                Rect::from_xywh(0.0, 20.0, 3.0, 18.0),
            ],
            &opts,
        );
        assert_eq!(widths, vec![100.0]);
    }
}
