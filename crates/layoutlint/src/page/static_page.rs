//! In-memory page over a recorded snapshot.
//!
//! Used for offline linting of captured layouts and as the engine's test
//! double. Scope selectors support compound selectors made of a tag, `#id`
//! and `.class` parts, optionally comma-separated.

use super::{Page, Scope, ScopeSpec, ScrollPosition};
use crate::engine::suppression::is_ignored;
use crate::finder::{locate, CssPathFinder, SelectorFinder};
use crate::message::Location;
use crate::result::{LinterError, LinterResult};
use crate::snapshot::{ElementId, ElementNode, LayoutSnapshot};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::trace;

/// A page that never changes unless reset
#[derive(Debug)]
pub struct StaticPage {
    pristine: LayoutSnapshot,
    current: LayoutSnapshot,
    finder: Option<Box<dyn SelectorFinder>>,
    scroll: ScrollPosition,
    next_scope: u32,
    live_scopes: HashSet<u32>,
    resolved: HashMap<String, ElementId>,
    reset_count: usize,
    scroll_writes: usize,
    snapshot_count: usize,
}

impl StaticPage {
    /// Page over `snapshot` with the default [`CssPathFinder`]
    #[must_use]
    pub fn new(snapshot: LayoutSnapshot) -> Self {
        Self::with_finder(snapshot, CssPathFinder::new())
    }

    /// Page over `snapshot` with a custom finder
    #[must_use]
    pub fn with_finder(snapshot: LayoutSnapshot, finder: impl SelectorFinder + 'static) -> Self {
        let mut page = Self::without_finder(snapshot);
        page.finder = Some(Box::new(finder));
        page
    }

    /// Page whose selector finder is missing; location resolution fails
    #[must_use]
    pub fn without_finder(snapshot: LayoutSnapshot) -> Self {
        let scroll = ScrollPosition::new(snapshot.viewport.scroll_x, snapshot.viewport.scroll_y);
        Self {
            current: snapshot.clone(),
            pristine: snapshot,
            finder: None,
            scroll,
            next_scope: 1,
            live_scopes: HashSet::new(),
            resolved: HashMap::new(),
            reset_count: 0,
            scroll_writes: 0,
            snapshot_count: 0,
        }
    }

    /// Load a snapshot recorded as JSON
    pub fn from_path(path: impl AsRef<Path>) -> LinterResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let snapshot: LayoutSnapshot = serde_json::from_str(&text)?;
        Ok(Self::new(snapshot))
    }

    /// Times [`Page::reset`] ran
    #[must_use]
    pub const fn reset_count(&self) -> usize {
        self.reset_count
    }

    /// Times [`Page::scroll_to`] ran
    #[must_use]
    pub const fn scroll_writes(&self) -> usize {
        self.scroll_writes
    }

    /// Times [`Page::snapshot`] ran
    #[must_use]
    pub const fn snapshot_count(&self) -> usize {
        self.snapshot_count
    }

    /// Scopes resolved and not yet disposed
    #[must_use]
    pub fn live_scope_count(&self) -> usize {
        self.live_scopes.len()
    }

    /// Current scroll offset, without a round trip
    #[must_use]
    pub const fn current_scroll(&self) -> ScrollPosition {
        self.scroll
    }

    fn element(&self, id: ElementId) -> LinterResult<&ElementNode> {
        self.current
            .element(id)
            .ok_or_else(|| LinterError::UnknownElement { id: id.0 })
    }
}

#[async_trait]
impl Page for StaticPage {
    fn url(&self) -> &str {
        &self.current.url
    }

    async fn evaluate(
        &mut self,
        _script: &str,
        _arg: serde_json::Value,
    ) -> LinterResult<serde_json::Value> {
        Err(LinterError::evaluation("static pages have no script context"))
    }

    async fn resolve_scope(&mut self, spec: &ScopeSpec) -> LinterResult<Scope> {
        let roots = match spec {
            ScopeSpec::Document => vec![self.current.root],
            ScopeSpec::Selector(selector) => {
                let list = SelectorList::parse(selector).ok_or_else(|| LinterError::InvalidScope {
                    selector: selector.clone(),
                })?;
                self.current
                    .elements()
                    .iter()
                    .filter(|el| list.matches(el))
                    .map(|el| el.id)
                    .collect()
            }
        };
        let id = self.next_scope;
        self.next_scope += 1;
        self.live_scopes.insert(id);
        trace!(scope = id, roots = roots.len(), "resolved scope");
        Ok(Scope {
            id,
            spec: spec.clone(),
            roots,
        })
    }

    async fn dispose_scope(&mut self, scope: Scope) -> LinterResult<()> {
        self.live_scopes.remove(&scope.id);
        Ok(())
    }

    async fn snapshot(&mut self, scope: &Scope) -> LinterResult<LayoutSnapshot> {
        if !self.live_scopes.contains(&scope.id) {
            return Err(LinterError::page(format!(
                "scope {} is no longer valid",
                scope.id
            )));
        }
        self.snapshot_count += 1;
        let ids = match scope.spec {
            ScopeSpec::Document => self.current.elements().iter().map(|e| e.id).collect(),
            ScopeSpec::Selector(_) => self.current.descendants_of(&scope.roots),
        };
        let mut snapshot = self.current.clone().with_scope(ids);
        snapshot.viewport.scroll_x = self.scroll.x;
        snapshot.viewport.scroll_y = self.scroll.y;
        Ok(snapshot)
    }

    async fn scroll_position(&mut self) -> LinterResult<ScrollPosition> {
        Ok(self.scroll)
    }

    async fn scroll_to(&mut self, position: ScrollPosition) -> LinterResult<()> {
        self.scroll_writes += 1;
        self.scroll = position;
        Ok(())
    }

    async fn reset(&mut self) -> LinterResult<()> {
        self.current = self.pristine.clone();
        self.scroll = ScrollPosition::new(
            self.pristine.viewport.scroll_x,
            self.pristine.viewport.scroll_y,
        );
        self.live_scopes.clear();
        self.resolved.clear();
        self.reset_count += 1;
        Ok(())
    }

    async fn resolve_locations(&mut self, elements: &[ElementId]) -> LinterResult<Vec<Location>> {
        let Some(finder) = self.finder.as_deref() else {
            return Err(LinterError::environment(
                "selector finder is not available in the page",
            ));
        };
        let mut locations = Vec::with_capacity(elements.len());
        let mut resolved = Vec::with_capacity(elements.len());
        for id in elements {
            let el = self.element(*id)?;
            let location = locate(finder, &self.current, el);
            resolved.push((location.element.selector.clone(), *id));
            locations.push(location);
        }
        self.resolved.extend(resolved);
        Ok(locations)
    }

    async fn ignored_selectors(
        &mut self,
        selectors: &[String],
        rule_id: &str,
        attribute: &str,
    ) -> LinterResult<HashSet<String>> {
        Ok(selectors
            .iter()
            .filter(|s| {
                self.resolved
                    .get(*s)
                    .and_then(|id| self.current.element(*id))
                    .is_some_and(|el| is_ignored(&self.current, el, rule_id, attribute))
            })
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty()
            || !text
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '#' | '.'))
        {
            return None;
        }
        let mut compound = Self::default();
        let mut rest = text;
        let head_end = rest.find(['#', '.']).unwrap_or(rest.len());
        if head_end > 0 {
            compound.tag = Some(rest[..head_end].to_ascii_lowercase());
        }
        rest = &rest[head_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            if marker == '#' {
                compound.id = Some(name.to_string());
            } else {
                compound.classes.push(name.to_string());
            }
            rest = &body[end..];
        }
        Some(compound)
    }

    fn matches(&self, el: &ElementNode) -> bool {
        self.tag.as_ref().map_or(true, |t| el.tag == *t)
            && self.id.as_deref().map_or(true, |id| el.dom_id() == Some(id))
            && self
                .classes
                .iter()
                .all(|c| el.classes().any(|ec| ec == c))
    }
}

#[derive(Debug)]
struct SelectorList(Vec<Compound>);

impl SelectorList {
    fn parse(text: &str) -> Option<Self> {
        text.split(',')
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    fn matches(&self, el: &ElementNode) -> bool {
        self.0.iter().any(|c| c.matches(el))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::suppression::DEFAULT_IGNORE_ATTRIBUTE;
    use crate::snapshot::{ElementSpec, SnapshotBuilder, Viewport};

    fn page() -> (StaticPage, ElementId, ElementId) {
        let mut doc = SnapshotBuilder::new(Viewport::default());
        let body = doc.body();
        let main = doc.push(body, ElementSpec::new("main").id("app").class("shell"));
        let card = doc.push(
            main,
            ElementSpec::new("div")
                .class("card")
                .attr(DEFAULT_IGNORE_ATTRIBUTE, "misalignment"),
        );
        (StaticPage::new(doc.build()), main, card)
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_compound_parse() {
            let c = Compound::parse("div.card#x.wide").unwrap();
            assert_eq!(c.tag.as_deref(), Some("div"));
            assert_eq!(c.id.as_deref(), Some("x"));
            assert_eq!(c.classes, vec!["card", "wide"]);
            assert!(Compound::parse("div > p").is_none());
            assert!(Compound::parse("div.").is_none());
        }
    }

    mod page_tests {
        use super::*;

        #[tokio::test]
        async fn test_selector_scope_covers_descendants() {
            let (mut page, main, card) = page();
            let scope = page
                .resolve_scope(&ScopeSpec::Selector("main.shell".to_string()))
                .await
                .unwrap();
            assert_eq!(scope.roots, vec![main]);
            let snap = page.snapshot(&scope).await.unwrap();
            assert_eq!(snap.scope, vec![card]);
        }

        #[tokio::test]
        async fn test_invalid_scope_selector() {
            let (mut page, _, _) = page();
            let err = page
                .resolve_scope(&ScopeSpec::Selector("main > div".to_string()))
                .await
                .unwrap_err();
            assert!(matches!(err, LinterError::InvalidScope { .. }));
        }

        #[tokio::test]
        async fn test_reset_invalidates_scopes() {
            let (mut page, _, _) = page();
            let scope = page.resolve_scope(&ScopeSpec::Document).await.unwrap();
            page.reset().await.unwrap();
            assert!(page.snapshot(&scope).await.is_err());
            assert_eq!(page.reset_count(), 1);
        }

        #[tokio::test]
        async fn test_ignored_selectors_use_resolved_locations() {
            let (mut page, main, card) = page();
            let locations = page.resolve_locations(&[main, card]).await.unwrap();
            let selectors: Vec<String> = locations
                .iter()
                .map(|l| l.element.selector.clone())
                .chain(std::iter::once("#never-resolved".to_string()))
                .collect();
            let ignored = page
                .ignored_selectors(&selectors, "misalignment", DEFAULT_IGNORE_ATTRIBUTE)
                .await
                .unwrap();
            assert_eq!(ignored.len(), 1);
            assert!(ignored.contains(&locations[1].element.selector));
        }

        #[tokio::test]
        async fn test_missing_finder_is_environment_fatal() {
            let (page, main, _) = page();
            let mut page = StaticPage::without_finder(page.pristine);
            let err = page.resolve_locations(&[main]).await.unwrap_err();
            assert!(err.is_environment_fatal());
        }

        #[tokio::test]
        async fn test_snapshot_reports_scroll() {
            let (mut page, _, _) = page();
            page.scroll_to(ScrollPosition::new(0.0, 120.0)).await.unwrap();
            let scope = page.resolve_scope(&ScopeSpec::Document).await.unwrap();
            let snap = page.snapshot(&scope).await.unwrap();
            assert_eq!(snap.viewport.scroll_y, 120.0);
        }
    }
}
