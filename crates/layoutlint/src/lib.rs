//! Layoutlint: baseline-free visual regression linting
//!
//! Layoutlint inspects the geometry of a rendered page and reports layout
//! defects directly: clipped or overflowing content, overlapping elements,
//! obscured click targets, misaligned siblings, incoherent corner radii,
//! ragged text and wasted space. No reference screenshot is needed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    LAYOUTLINT Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Page       │    │ Layout     │    │ Detectors  │            │
//! │   │ (chromium  │───►│ Snapshot   │───►│ (pure Rust │            │
//! │   │  or static)│    │            │    │  geometry) │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │         ▲                                   │ reports           │
//! │         │  locations, ignore markers  ┌─────▼──────┐            │
//! │         └─────────────────────────────│  Engine    │──► Result  │
//! │                                       └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use layoutlint::{ElementSpec, Linter, SnapshotBuilder, StaticPage, Viewport};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut doc = SnapshotBuilder::new(Viewport::default());
//! let body = doc.body();
//! doc.push(
//!     body,
//!     ElementSpec::new("div")
//!         .xywh(0.0, 0.0, 100.0, 20.0)
//!         .style("overflow-x", "hidden")
//!         .scroll_size(400.0, 20.0),
//! );
//!
//! let linter = Linter::builder().build().unwrap();
//! let mut page = StaticPage::new(doc.build());
//! let result = linter.lint_page(&mut page).await.unwrap();
//! assert_eq!(result.messages[0].rule_id, "clipped-content");
//! # });
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod config;
pub mod engine;
pub mod finder;
pub mod geometry;
pub mod message;
pub mod page;
pub mod primitives;
mod result;
pub mod rules;
pub mod snapshot;

pub use config::{LintConfig, ResetPolicy, RuleEntry, ViewportSize, DEFAULT_CONFIG_FILE};
pub use engine::{Linter, LinterBuilder, RuleSetting, ScrollCheckout, DEFAULT_IGNORE_ATTRIBUTE};
pub use finder::{CssPathFinder, SelectorFinder};
pub use geometry::{Edges, Rect};
pub use message::{ElementLocation, LintMessage, LintResult, Location, MessageRelation, Severity};
#[cfg(feature = "browser")]
pub use page::{Browser, BrowserConfig, ChromiumPage};
pub use page::{Page, Scope, ScopeSpec, ScrollPosition, StaticPage};
pub use primitives::Geometry;
pub use result::{LinterError, LinterResult};
pub use rules::{
    Detector, DetectorRule, Relation, Rule, RuleContext, RuleMeta, RuleRegistry, ViolationReport,
};
pub use snapshot::{
    ComputedStyleView, ElementId, ElementNode, ElementSpec, LayoutSnapshot, SnapshotBuilder,
    Viewport,
};
