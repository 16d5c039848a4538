//! Selector synthesis for locations.
//!
//! The engine never interprets selectors; it only needs them to be stable
//! within one page state and unique enough to point a human at the element
//! and to key ignore suppression.

use crate::message::{ElementLocation, Location};
use crate::snapshot::{ElementNode, LayoutSnapshot};

/// Turns an element into a CSS selector
pub trait SelectorFinder: Send + Sync + std::fmt::Debug {
    /// Selector for `el`
    fn selector(&self, snapshot: &LayoutSnapshot, el: &ElementNode) -> String;
}

/// Builds `parent > child` paths, anchored at the nearest unique `id`.
///
/// Each step is the bare tag when no sibling shares it, else the tag with
/// a class no sibling shares, else the tag with `:nth-child()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssPathFinder;

impl CssPathFinder {
    /// Create a finder
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn unique_id<'s>(snapshot: &'s LayoutSnapshot, el: &'s ElementNode) -> Option<&'s str> {
        let id = el.dom_id()?;
        let shared = snapshot
            .elements()
            .iter()
            .filter(|e| e.dom_id() == Some(id))
            .count();
        (shared == 1).then_some(id)
    }

    fn step(snapshot: &LayoutSnapshot, el: &ElementNode) -> String {
        let Some(parent) = snapshot.parent(el) else {
            return el.tag.clone();
        };
        let siblings: Vec<&ElementNode> = snapshot
            .children(parent)
            .filter(|s| s.id != el.id)
            .collect();
        if !siblings.iter().any(|s| s.tag == el.tag) {
            return el.tag.clone();
        }
        let unique_class = el.classes().filter(|c| is_css_ident(c)).find(|c| {
            !siblings
                .iter()
                .any(|s| s.tag == el.tag && s.classes().any(|sc| sc == *c))
        });
        if let Some(class) = unique_class {
            return format!("{}.{}", el.tag, class);
        }
        let position = parent
            .children
            .iter()
            .position(|c| *c == el.id)
            .map_or(1, |i| i + 1);
        format!("{}:nth-child({})", el.tag, position)
    }
}

impl SelectorFinder for CssPathFinder {
    fn selector(&self, snapshot: &LayoutSnapshot, el: &ElementNode) -> String {
        let mut steps = Vec::new();
        let mut current = Some(el);
        while let Some(node) = current {
            if let Some(id) = Self::unique_id(snapshot, node) {
                steps.push(id_selector(id));
                break;
            }
            steps.push(Self::step(snapshot, node));
            current = snapshot.parent(node);
        }
        steps.reverse();
        steps.join(" > ")
    }
}

/// Location of `el` with its selector from `finder`
#[must_use]
pub fn locate(
    finder: &dyn SelectorFinder,
    snapshot: &LayoutSnapshot,
    el: &ElementNode,
) -> Location {
    Location {
        element: ElementLocation {
            tag_name: el.tag.clone(),
            id: el.dom_id().unwrap_or_default().to_string(),
            classes: el.classes().map(str::to_string).collect(),
            selector: finder.selector(snapshot, el),
        },
    }
}

fn id_selector(id: &str) -> String {
    if is_css_ident(id) {
        format!("#{id}")
    } else {
        format!("[id=\"{}\"]", id.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn is_css_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let start_ok = first.is_ascii_alphabetic()
        || first == '_'
        || (first == '-' && s.chars().nth(1).is_some_and(|c| !c.is_ascii_digit()));
    start_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::snapshot::{ElementSpec, SnapshotBuilder, Viewport};

    #[test]
    fn test_unique_id_anchors_path() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let main = doc.push(body, ElementSpec::new("main").id("app"));
        let a = doc.push(main, ElementSpec::new("div"));
        let b = doc.push(main, ElementSpec::new("div").class("card wide"));
        let c = doc.push(main, ElementSpec::new("div"));
        let p = doc.push(a, ElementSpec::new("p"));
        let snap = doc.build();
        let f = CssPathFinder::new();
        let sel = |id| f.selector(&snap, snap.element(id).unwrap());
        assert_eq!(sel(main), "#app");
        assert_eq!(sel(a), "#app > div:nth-child(1)");
        assert_eq!(sel(b), "#app > div.card");
        assert_eq!(sel(c), "#app > div:nth-child(3)");
        assert_eq!(sel(p), "#app > div:nth-child(1) > p");
    }

    #[test]
    fn test_path_reaches_html_without_ids() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let span = doc.push(body, ElementSpec::new("span"));
        let snap = doc.build();
        let sel = CssPathFinder::new().selector(&snap, snap.element(span).unwrap());
        assert_eq!(sel, "html > body > span");
    }

    #[test]
    fn test_duplicate_and_odd_ids() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        doc.push(body, ElementSpec::new("i").id("dup"));
        let dup = doc.push(body, ElementSpec::new("b").id("dup"));
        let odd = doc.push(body, ElementSpec::new("u").id("1st"));
        let snap = doc.build();
        let f = CssPathFinder::new();
        assert_eq!(f.selector(&snap, snap.element(dup).unwrap()), "html > body > b");
        assert_eq!(f.selector(&snap, snap.element(odd).unwrap()), "[id=\"1st\"]");
    }

    #[test]
    fn test_locate() {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let el = doc.push(body, ElementSpec::new("div").id("x").class("a b"));
        let snap = doc.build();
        let loc = locate(&CssPathFinder, &snap, snap.element(el).unwrap());
        assert_eq!(loc.element.tag_name, "div");
        assert_eq!(loc.element.id, "x");
        assert_eq!(loc.element.classes, vec!["a", "b"]);
        assert_eq!(loc.element.selector, "#x");
    }
}
