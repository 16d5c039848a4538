//! `text-overflow`: text spilling out of its own element.

use super::{px, Detector, RuleMeta, ViolationReport};
use crate::geometry::Edges;
use crate::message::Severity;
use crate::primitives::Geometry;
use serde::Deserialize;

/// Options for [`TextOverflow`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Horizontal spill that still passes
    pub horizontal_threshold: f64,
    /// Vertical spill allowance as a fraction of `font-size`
    pub vertical_font_ratio: f64,
    /// Characters of text quoted in the message
    pub preview_length: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            horizontal_threshold: 1.0,
            vertical_font_ratio: 0.5,
            preview_length: 30,
        }
    }
}

/// The `text-overflow` detector
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOverflow;

impl Detector for TextOverflow {
    type Options = Options;

    fn id(&self) -> &'static str {
        "text-overflow"
    }

    fn meta(&self) -> RuleMeta {
        RuleMeta::new(Severity::Error, "Text running outside its element")
    }

    fn detect(&self, geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
        detect(geo, options)
    }
}

/// Report elements whose direct text leaves their border box
#[must_use]
pub fn detect(geo: &Geometry<'_>, options: &Options) -> Vec<ViolationReport> {
    let mut reports = Vec::new();
    for el in geo.candidates() {
        if el.style.has_ellipsis() {
            continue;
        }
        let Some(bounds) = geo.text_bounds(el) else {
            continue;
        };
        let overflow = Edges::overflow(&el.rect, &bounds);
        let vertical_threshold = el.style.font_size() * options.vertical_font_ratio;
        let sides: Vec<String> = overflow
            .labelled()
            .iter()
            .filter(|(side, amount)| {
                let threshold = match *side {
                    "top" | "bottom" => vertical_threshold,
                    _ => options.horizontal_threshold,
                };
                *amount > threshold
            })
            .map(|(side, amount)| format!("{side} {}", px(*amount)))
            .collect();
        if sides.is_empty() {
            continue;
        }
        reports.push(ViolationReport::new(
            el.id,
            format!(
                "Text overflows its element ({}): \"{}\"",
                sides.join(", "),
                preview(&el.direct_text(), options.preview_length)
            ),
        ));
    }
    reports
}

fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::rules::tests::{block, doc, run_default};

    #[test]
    fn test_text_spilling_right() {
        let mut d = doc();
        let body = d.body();
        let el = d.push(
            body,
            block(0.0, 0.0, 100.0, 20.0).text(
                "A label that is far too long for its little box",
                vec![Rect::from_xywh(0.0, 0.0, 400.0, 18.0)],
            ),
        );
        let reports = run_default(&TextOverflow, &d.build());
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].element, el);
        assert_eq!(
            reports[0].message,
            "Text overflows its element (right 300px): \"A label that is far too long f…\""
        );
    }

    #[test]
    fn test_vertical_allowance_follows_font_size() {
        let run = |bottom_spill: f64| {
            let mut d = doc();
            let body = d.body();
            d.push(
                body,
                block(0.0, 0.0, 100.0, 20.0)
                    .style("font-size", "16px")
                    .text("Hi", vec![Rect::from_xywh(0.0, 0.0, 20.0, 20.0 + bottom_spill)]),
            );
            run_default(&TextOverflow, &d.build())
        };
        assert!(run(8.0).is_empty());
        assert!(run(9.0)[0].message.contains("bottom 9px"));
    }

    #[test]
    fn test_ellipsis_exempt() {
        let mut d = doc();
        let body = d.body();
        d.push(
            body,
            block(0.0, 0.0, 100.0, 20.0)
                .style("overflow-x", "hidden")
                .style("text-overflow", "ellipsis")
                .text("dots", vec![Rect::from_xywh(0.0, 0.0, 400.0, 18.0)]),
        );
        assert!(run_default(&TextOverflow, &d.build()).is_empty());
    }

    #[test]
    fn test_clipping_element_still_reports() {
        let mut d = doc();
        let body = d.body();
        let el = d.push(
            body,
            block(0.0, 0.0, 100.0, 20.0)
                .style("overflow-x", "hidden")
                .style("white-space", "nowrap")
                .text("clipped", vec![Rect::from_xywh(0.0, 0.0, 400.0, 18.0)]),
        );
        let reports = run_default(&TextOverflow, &d.build());
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].element, el);
        assert!(reports[0].message.contains("right 300px"));
    }

    #[test]
    fn test_short_preview_is_not_truncated() {
        assert_eq!(preview("short", 30), "short");
        assert_eq!(preview("abcdef", 3), "abc…");
    }
}
