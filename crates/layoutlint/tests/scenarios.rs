//! End-to-end scenarios: synthetic layouts linted through the full engine.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use layoutlint::{
    ElementSpec, LayoutSnapshot, LintConfig, LintMessage, LintResult, Linter, Rect, RuleRegistry,
    ScopeSpec, SnapshotBuilder, StaticPage, Viewport, DEFAULT_IGNORE_ATTRIBUTE,
};

async fn lint_with(linter: &Linter, snapshot: LayoutSnapshot) -> LintResult {
    let mut page = StaticPage::new(snapshot);
    linter.lint_page(&mut page).await.unwrap()
}

async fn lint(snapshot: LayoutSnapshot) -> LintResult {
    lint_with(&Linter::builder().build().unwrap(), snapshot).await
}

fn of<'a>(result: &'a LintResult, rule_id: &str) -> Vec<&'a LintMessage> {
    result
        .messages
        .iter()
        .filter(|m| m.rule_id == rule_id)
        .collect()
}

fn block(x: f64, y: f64, w: f64, h: f64) -> ElementSpec {
    ElementSpec::new("div").xywh(x, y, w, h)
}

/// `#c` holding one unbroken 400px line of text
fn long_label(extra: &[(&str, &str)]) -> LayoutSnapshot {
    let mut doc = SnapshotBuilder::new(Viewport::default());
    doc.url("https://shop.test/cart");
    let body = doc.body();
    let label = extra.iter().fold(
        block(0.0, 0.0, 100.0, 20.0)
            .id("c")
            .style("overflow-x", "hidden")
            .style("overflow-y", "hidden")
            .style("white-space", "nowrap")
            .text(
                "VERY LONG TEXT THAT NEVER WRAPS",
                vec![Rect::from_xywh(0.0, 1.0, 400.0, 18.0)],
            ),
        |spec, (name, value)| spec.style(name, value),
    );
    doc.push(body, label);
    doc.build()
}

mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn test_clipped_label() {
        let result = lint(long_label(&[])).await;
        let clipped = of(&result, "clipped-content");
        assert_eq!(clipped.len(), 1);
        assert_eq!(
            clipped[0].message,
            "Content is clipped by overflow: ~300px horizontally"
        );
        assert_eq!(clipped[0].location.element.selector, "#c");
        let spilled = of(&result, "text-overflow");
        assert_eq!(spilled.len(), 1);
        assert!(spilled[0].message.contains("right 300px"));
        assert_eq!(result.url, "https://shop.test/cart");
        assert!(result.has_errors());
    }

    #[tokio::test]
    async fn test_ellipsis_label_is_clean() {
        let result = lint(long_label(&[("text-overflow", "ellipsis")])).await;
        assert!(result.messages.is_empty(), "{:#?}", result.messages);
        assert_eq!(result.error_count, 0);
    }

    #[tokio::test]
    async fn test_negative_margin_stack_overlaps() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        doc.push(body, block(0.0, 0.0, 100.0, 100.0));
        doc.push(
            body,
            block(0.0, 45.0, 100.0, 100.0).style("margin-top", "-55px"),
        );
        let result = lint(doc.build()).await;
        let overlaps = of(&result, "overlapped-elements");
        assert_eq!(overlaps.len(), 1);
        assert_eq!(
            overlaps[0].message,
            "Element overlaps another element by 55% of the smaller element's area"
        );
        assert_eq!(overlaps[0].relations[0].description, "overlapped element");
    }

    #[tokio::test]
    async fn test_flex_row_offset_sibling() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let row = doc.push(body, block(0.0, 0.0, 400.0, 60.0).style("display", "flex"));
        doc.push(row, block(0.0, 0.0, 100.0, 50.0));
        doc.push(
            row,
            block(100.0, 4.0, 100.0, 50.0).style("margin-top", "4px"),
        );
        let result = lint(doc.build()).await;
        let misaligned = of(&result, "misalignment");
        assert_eq!(misaligned.len(), 1);
        assert!(misaligned[0].message.contains("top edge off by 4px"));
        assert_eq!(misaligned[0].severity, layoutlint::Severity::Warn);
    }

    #[tokio::test]
    async fn test_nested_equal_radii() {
        let rounded = |spec: ElementSpec| {
            [
                "border-top-left-radius",
                "border-top-right-radius",
                "border-bottom-right-radius",
                "border-bottom-left-radius",
            ]
            .into_iter()
            .fold(spec, |s, p| s.style(p, "20px"))
        };
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let card = doc.push(body, rounded(block(0.0, 0.0, 300.0, 200.0)));
        doc.push(
            card,
            rounded(block(5.0, 5.0, 290.0, 190.0).style("background-color", "white")),
        );
        let result = lint(doc.build()).await;
        let corners = of(&result, "corner-radius-coherence");
        assert_eq!(corners.len(), 1);
        for corner in ["top-left", "top-right", "bottom-right", "bottom-left"] {
            assert!(
                corners[0]
                    .message
                    .contains(&format!("{corner} expected ~15px, found 20px")),
                "{}",
                corners[0].message
            );
        }
        assert_eq!(result.info_count, result.recommend_count);
    }

    #[tokio::test]
    async fn test_child_flush_top_left() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let container = doc.push(body, block(0.0, 0.0, 300.0, 250.0));
        doc.push(container, block(0.0, 0.0, 100.0, 80.0));
        let result = lint(doc.build()).await;
        let space = of(&result, "space-misuse");
        assert_eq!(space.len(), 1);
        assert!(space[0].message.contains("horizontal gaps 0px and 200px"));
        assert!(space[0].message.contains("vertical gaps 0px and 170px"));
    }
}

mod threshold_tests {
    use super::*;

    fn clipped_by(overflow: f64) -> LayoutSnapshot {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        doc.push(
            body,
            block(0.0, 0.0, 100.0, 20.0)
                .style("overflow-x", "hidden")
                .scroll_size(100.0 + overflow, 20.0),
        );
        doc.build()
    }

    fn paragraph(last: f64) -> LayoutSnapshot {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        doc.push(
            body,
            block(0.0, 0.0, 220.0, 40.0).text(
                "a paragraph that wraps once",
                vec![
                    Rect::from_xywh(0.0, 0.0, 200.0, 18.0),
                    Rect::from_xywh(0.0, 20.0, last, 18.0),
                ],
            ),
        );
        doc.build()
    }

    #[tokio::test]
    async fn test_horizontal_clip_threshold_is_one_pixel() {
        assert!(of(&lint(clipped_by(1.0)).await, "clipped-content").is_empty());
        assert_eq!(of(&lint(clipped_by(1.1)).await, "clipped-content").len(), 1);
    }

    #[tokio::test]
    async fn test_orphan_threshold_is_45_percent() {
        assert!(of(&lint(paragraph(90.0)).await, "ragged-lines").is_empty());
        assert_eq!(of(&lint(paragraph(88.0)).await, "ragged-lines").len(), 1);
    }
}

mod engine_tests {
    use super::*;

    #[tokio::test]
    async fn test_ignore_marker_on_ancestor_moves_only_that_message() {
        let build = |marked: bool| {
            let mut doc = SnapshotBuilder::new(Viewport::default());
            let body = doc.body();
            let wrapper = if marked {
                block(0.0, 0.0, 600.0, 100.0).attr(DEFAULT_IGNORE_ATTRIBUTE, "clipped-content")
            } else {
                block(0.0, 0.0, 600.0, 100.0)
            };
            let wrapper = doc.push(body, wrapper.id("promo"));
            doc.push(
                wrapper,
                block(0.0, 0.0, 100.0, 20.0)
                    .style("overflow-x", "hidden")
                    .scroll_size(400.0, 20.0),
            );
            doc.push(
                body,
                block(0.0, 200.0, 100.0, 20.0)
                    .id("footer-note")
                    .style("overflow-x", "hidden")
                    .scroll_size(250.0, 20.0),
            );
            doc.build()
        };

        let plain = lint(build(false)).await;
        let marked = lint(build(true)).await;
        assert_eq!(of(&plain, "clipped-content").len(), 2);
        assert_eq!(of(&marked, "clipped-content").len(), 1);
        assert_eq!(marked.suppressed_messages.len(), 1);
        assert_eq!(
            marked.suppressed_messages[0].location.element.selector,
            "#promo > div"
        );
        let others = |r: &LintResult| -> Vec<LintMessage> {
            r.messages
                .iter()
                .filter(|m| m.location.element.selector != "#promo > div")
                .cloned()
                .collect()
        };
        assert_eq!(others(&plain), others(&marked));
        assert_eq!(plain.error_count, marked.error_count + 1);
    }

    #[tokio::test]
    async fn test_scope_limits_detection() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let panel = doc.push(body, block(0.0, 0.0, 600.0, 100.0).id("panel"));
        doc.push(
            panel,
            block(0.0, 0.0, 100.0, 20.0)
                .style("overflow-x", "hidden")
                .scroll_size(400.0, 20.0),
        );
        doc.push(
            body,
            block(0.0, 200.0, 100.0, 20.0)
                .id("outside")
                .style("overflow-x", "hidden")
                .scroll_size(400.0, 20.0),
        );
        let linter = Linter::builder()
            .scope(ScopeSpec::Selector("#panel".to_string()))
            .build()
            .unwrap();
        let result = lint_with(&linter, doc.build()).await;
        let clipped = of(&result, "clipped-content");
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].location.element.selector, "#panel > div");
    }

    #[tokio::test]
    async fn test_config_disables_rule() {
        let config = LintConfig::from_yaml("rules:\n  clipped-content: off\n").unwrap();
        let linter = config.builder(RuleRegistry::builtin()).build().unwrap();
        let result = lint_with(&linter, long_label(&[])).await;
        assert!(of(&result, "clipped-content").is_empty());
    }

    #[tokio::test]
    async fn test_recorded_snapshot_lints_the_same() {
        let snapshot = long_label(&[]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let linter = Linter::builder().build().unwrap();
        let mut recorded = StaticPage::from_path(&path).unwrap();
        let from_file = linter.lint_page(&mut recorded).await.unwrap();
        assert_eq!(from_file, lint_with(&linter, snapshot).await);
    }

    #[tokio::test]
    async fn test_repeat_visits_are_identical() {
        let linter = Linter::builder().build().unwrap();
        let snapshot = long_label(&[]);
        let first = lint_with(&linter, snapshot.clone()).await;
        let second = lint_with(&linter, snapshot).await;
        assert_eq!(first, second);
    }
}
