//! Rules and the built-in layout detectors.
//!
//! ## Built-in rules
//!
//! | Rule ID | Default | Detects |
//! |---------|---------|---------|
//! | `clipped-content` | error | content cut off by `overflow: hidden \| clip` |
//! | `container-overflow` | warn | children escaping their container's box |
//! | `overlapped-elements` | error | in-flow elements painting over each other |
//! | `hit-target-obscured` | error | click targets covered by another element |
//! | `misalignment` | warn | flex siblings a few pixels off |
//! | `corner-radius-coherence` | info | nested radii that do not follow the parent |
//! | `text-overflow` | error | text spilling out of its own element |
//! | `ragged-lines` | info | orphaned or very short wrapped lines |
//! | `space-misuse` | info | lopsided empty space around content |
//!
//! Each detector is a pure function over a [`Geometry`]; the [`Rule`]
//! wrapper only fetches a fresh snapshot and forwards reports.

pub mod clipped_content;
pub mod container_overflow;
pub mod corner_radius;
pub mod hit_target;
pub mod misalignment;
pub mod overlapped_elements;
pub mod ragged_lines;
pub mod space_misuse;
pub mod text_overflow;

use crate::message::Severity;
use crate::page::{Page, Scope};
use crate::primitives::Geometry;
use crate::result::{LinterError, LinterResult};
use crate::snapshot::{ElementId, LayoutSnapshot};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Secondary element of a violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// How it relates to the primary element
    pub description: String,
    /// The element
    pub element: ElementId,
}

/// A violation as reported by a detector, still pointing at live elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationReport {
    /// Human-readable description
    pub message: String,
    /// Primary element
    pub element: ElementId,
    /// Related elements
    pub relations: Vec<Relation>,
}

impl ViolationReport {
    /// Create a report without relations
    #[must_use]
    pub fn new(element: ElementId, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            element,
            relations: Vec::new(),
        }
    }

    /// Add a related element
    #[must_use]
    pub fn with_relation(mut self, description: impl Into<String>, element: ElementId) -> Self {
        self.relations.push(Relation {
            description: description.into(),
            element,
        });
        self
    }
}

/// Static facts about a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMeta {
    /// Severity when the configuration does not name one
    pub severity: Severity,
    /// The rule mutates the page; the engine resets it afterwards
    pub has_side_effects: bool,
    /// One-line description
    pub description: String,
}

impl RuleMeta {
    /// Metadata for a side-effect-free rule
    #[must_use]
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            severity,
            has_side_effects: false,
            description: description.into(),
        }
    }

    /// Mark the rule as mutating the page
    #[must_use]
    pub const fn with_side_effects(mut self) -> Self {
        self.has_side_effects = true;
        self
    }
}

/// Everything a rule run can touch.
///
/// Reports go into a buffer owned by this context; the engine drains it
/// when the run finishes, so a report can never outlive its run.
pub struct RuleContext<'a> {
    page: &'a mut dyn Page,
    scope: &'a Scope,
    rule_id: &'a str,
    severity: Severity,
    options: &'a serde_json::Value,
    reports: Vec<ViolationReport>,
}

impl fmt::Debug for RuleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext")
            .field("url", &self.page.url())
            .field("scope", &self.scope)
            .field("rule_id", &self.rule_id)
            .field("severity", &self.severity)
            .field("reports", &self.reports.len())
            .finish_non_exhaustive()
    }
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(
        page: &'a mut dyn Page,
        scope: &'a Scope,
        rule_id: &'a str,
        severity: Severity,
        options: &'a serde_json::Value,
    ) -> Self {
        Self {
            page,
            scope,
            rule_id,
            severity,
            options,
            reports: Vec::new(),
        }
    }

    /// Id of the running rule
    #[must_use]
    pub const fn rule_id(&self) -> &str {
        self.rule_id
    }

    /// Scope the rule should scan
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        self.scope
    }

    /// Raw options from the configuration (`null` when none)
    #[must_use]
    pub const fn options(&self) -> &serde_json::Value {
        self.options
    }

    /// Options deserialized into the rule's own type
    pub fn options_as<T: DeserializeOwned + Default>(&self) -> LinterResult<T> {
        parse_options(self.rule_id, self.options)
    }

    /// Fresh layout of the scope
    pub async fn snapshot(&mut self) -> LinterResult<LayoutSnapshot> {
        self.page.snapshot(self.scope).await
    }

    /// Run a script in the page
    pub async fn evaluate(
        &mut self,
        script: &str,
        arg: serde_json::Value,
    ) -> LinterResult<serde_json::Value> {
        self.page.evaluate(script, arg).await
    }

    /// The page itself
    pub fn page(&mut self) -> &mut dyn Page {
        self.page
    }

    /// Record a violation; ignored when the rule is off
    pub fn report(&mut self, violation: ViolationReport) {
        if self.severity != Severity::Off {
            self.reports.push(violation);
        }
    }

    pub(crate) fn into_reports(self) -> Vec<ViolationReport> {
        self.reports
    }
}

/// A lint rule the engine can run
#[async_trait]
pub trait Rule: Send + Sync {
    /// Rule id (`name` or `namespace/name`)
    fn id(&self) -> &str;

    /// Static metadata
    fn meta(&self) -> RuleMeta;

    /// Check configured options before any page is visited
    fn validate_options(&self, _options: &serde_json::Value) -> LinterResult<()> {
        Ok(())
    }

    /// Inspect the page and report violations
    async fn run(&self, ctx: &mut RuleContext<'_>) -> LinterResult<()>;
}

/// A pure detector over one snapshot
pub trait Detector: Send + Sync + fmt::Debug {
    /// Options type; `Default` gives the documented thresholds
    type Options: DeserializeOwned + Default + Send + Sync;

    /// Rule id
    fn id(&self) -> &'static str;

    /// Static metadata
    fn meta(&self) -> RuleMeta;

    /// Violations in the snapshot behind `geo`
    fn detect(&self, geo: &Geometry<'_>, options: &Self::Options) -> Vec<ViolationReport>;
}

/// Adapts a [`Detector`] to the [`Rule`] surface
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectorRule<D>(pub D);

#[async_trait]
impl<D: Detector> Rule for DetectorRule<D> {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn meta(&self) -> RuleMeta {
        self.0.meta()
    }

    fn validate_options(&self, options: &serde_json::Value) -> LinterResult<()> {
        parse_options::<D::Options>(self.0.id(), options).map(|_| ())
    }

    async fn run(&self, ctx: &mut RuleContext<'_>) -> LinterResult<()> {
        let options: D::Options = ctx.options_as()?;
        let snapshot = ctx.snapshot().await?;
        let geo = Geometry::new(&snapshot);
        for violation in self.0.detect(&geo, &options) {
            ctx.report(violation);
        }
        Ok(())
    }
}

fn parse_options<T: DeserializeOwned + Default>(
    rule_id: &str,
    options: &serde_json::Value,
) -> LinterResult<T> {
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| LinterError::InvalidOptions {
        rule_id: rule_id.to_string(),
        message: e.to_string(),
    })
}

/// Rules by id, iterated in sorted order
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, Arc<dyn Rule>>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.keys()).finish()
    }
}

impl RuleRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the nine built-in rules
    #[must_use]
    pub fn builtin() -> Self {
        let rules: [Arc<dyn Rule>; 9] = [
            Arc::new(DetectorRule(clipped_content::ClippedContent)),
            Arc::new(DetectorRule(container_overflow::ContainerOverflow)),
            Arc::new(DetectorRule(overlapped_elements::OverlappedElements)),
            Arc::new(DetectorRule(hit_target::HitTargetObscured)),
            Arc::new(DetectorRule(misalignment::Misalignment)),
            Arc::new(DetectorRule(corner_radius::CornerRadiusCoherence)),
            Arc::new(DetectorRule(text_overflow::TextOverflow)),
            Arc::new(DetectorRule(ragged_lines::RaggedLines)),
            Arc::new(DetectorRule(space_misuse::SpaceMisuse)),
        ];
        Self {
            rules: rules
                .into_iter()
                .map(|r| (r.id().to_string(), r))
                .collect(),
        }
    }

    /// Add a rule; ids must be unique
    pub fn register(&mut self, rule: impl Rule + 'static) -> LinterResult<()> {
        let id = rule.id().to_string();
        if self.rules.contains_key(&id) {
            return Err(LinterError::config(format!("rule '{id}' is already registered")));
        }
        self.rules.insert(id, Arc::new(rule));
        Ok(())
    }

    /// Rule by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.get(id)
    }

    /// Rules in id order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.values()
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Format a px amount the way messages show it: whole pixels
pub(crate) fn px(value: f64) -> String {
    format!("{}px", value.round() as i64)
}
