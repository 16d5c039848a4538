//! The page collaborator.
//!
//! A [`Page`] is a rendered document the engine can query. Every call is
//! one round trip into the page's script context; everything in between
//! runs in Rust over the returned data.
//!
//! ```text
//! ┌────────────┐  resolve_scope / snapshot   ┌──────────────────────┐
//! │  Linter    │ ──────────────────────────► │ Page                 │
//! │  (engine)  │  resolve_locations          │  ChromiumPage (CDP)  │
//! │            │  ignored_selectors          │  StaticPage (memory) │
//! │            │ ◄────────────────────────── │                      │
//! └────────────┘  scroll_position / reset    └──────────────────────┘
//! ```

#[cfg(feature = "browser")]
mod cdp;
mod static_page;

#[cfg(feature = "browser")]
pub use cdp::{Browser, BrowserConfig, ChromiumPage, RUNTIME_SCRIPT};
pub use static_page::StaticPage;

use crate::message::Location;
use crate::result::LinterResult;
use crate::snapshot::{ElementId, LayoutSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Which part of the document the detectors scan
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeSpec {
    /// The whole document
    #[default]
    Document,
    /// Descendants of every element matching a CSS selector
    Selector(String),
}

impl ScopeSpec {
    /// Scope from an optional selector
    #[must_use]
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector.map(str::trim) {
            Some(s) if !s.is_empty() => Self::Selector(s.to_string()),
            _ => Self::Document,
        }
    }
}

impl fmt::Display for ScopeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => f.write_str("document"),
            Self::Selector(s) => f.write_str(s),
        }
    }
}

/// A resolved scope. Valid until disposed or the page is reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Page-assigned handle
    pub id: u32,
    /// What was resolved
    pub spec: ScopeSpec,
    /// Root elements; `documentElement` for [`ScopeSpec::Document`]
    pub roots: Vec<ElementId>,
}

/// Document scroll offset
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    /// `scrollX`
    pub x: f64,
    /// `scrollY`
    pub y: f64,
}

impl ScrollPosition {
    /// Create a position
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rendered document the engine lints.
///
/// Implementations own any in-page runtime they need; the engine only
/// relies on the operations below.
#[async_trait]
pub trait Page: Send + Sync {
    /// Current URL
    fn url(&self) -> &str;

    /// Run `script` (a JS function expression) with `arg` in the page
    async fn evaluate(
        &mut self,
        script: &str,
        arg: serde_json::Value,
    ) -> LinterResult<serde_json::Value>;

    /// Resolve the elements a scope covers
    async fn resolve_scope(&mut self, spec: &ScopeSpec) -> LinterResult<Scope>;

    /// Release a scope's handles
    async fn dispose_scope(&mut self, scope: Scope) -> LinterResult<()>;

    /// Capture the current layout of `scope`
    async fn snapshot(&mut self, scope: &Scope) -> LinterResult<LayoutSnapshot>;

    /// Current scroll offset
    async fn scroll_position(&mut self) -> LinterResult<ScrollPosition>;

    /// Scroll the document
    async fn scroll_to(&mut self, position: ScrollPosition) -> LinterResult<()>;

    /// Bring the page back to its pristine state (after a rule with side
    /// effects). Element handles from before the reset are invalid.
    async fn reset(&mut self) -> LinterResult<()>;

    /// Resolve elements to locations, one per input, in order.
    ///
    /// Fails with [`LinterError::EnvironmentFatal`](crate::LinterError::EnvironmentFatal)
    /// when the page has no selector finder.
    async fn resolve_locations(&mut self, elements: &[ElementId]) -> LinterResult<Vec<Location>>;

    /// Which of `selectors` match an element that, itself or through an
    /// ancestor, carries `attribute` with a token matching `rule_id`.
    /// Selectors that no longer match anything are skipped.
    async fn ignored_selectors(
        &mut self,
        selectors: &[String],
        rule_id: &str,
        attribute: &str,
    ) -> LinterResult<HashSet<String>>;

    /// Close the page
    async fn close(&mut self) -> LinterResult<()> {
        Ok(())
    }
}
