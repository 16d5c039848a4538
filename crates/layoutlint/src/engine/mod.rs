//! Rule execution engine.
//!
//! One page visit runs every enabled rule in id order against the same
//! page, strictly one after another:
//!
//! ```text
//! resolve scope
//!   └─ for each rule:
//!        scroll checkout → run → restore scroll
//!        → resolve locations → query ignore markers → classify
//!        → (side effects) dispose scope, reset page, resolve scope
//! dispose scope → LintResult
//! ```
//!
//! Any failure inside a rule iteration aborts the visit and is wrapped in
//! [`LinterError::RuleFailed`] naming the page and the rule.

pub mod scroll;
pub mod suppression;

pub use scroll::ScrollCheckout;
pub use suppression::DEFAULT_IGNORE_ATTRIBUTE;

use crate::message::{LintMessage, LintResult, Location, MessageRelation, Severity};
use crate::page::{Page, Scope, ScopeSpec};
use crate::result::{LinterError, LinterResult};
use crate::rules::{Rule, RuleContext, RuleRegistry, ViolationReport};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// Configured severity and options of one rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetting {
    /// Severity; `off` disables the rule
    pub severity: Severity,
    /// Rule options, `null` for defaults
    pub options: serde_json::Value,
}

impl RuleSetting {
    /// Setting with default options
    #[must_use]
    pub const fn new(severity: Severity) -> Self {
        Self {
            severity,
            options: serde_json::Value::Null,
        }
    }

    /// Setting with options
    #[must_use]
    pub const fn with_options(severity: Severity, options: serde_json::Value) -> Self {
        Self { severity, options }
    }
}

struct EnabledRule {
    rule: Arc<dyn Rule>,
    severity: Severity,
    options: serde_json::Value,
    has_side_effects: bool,
}

impl fmt::Debug for EnabledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnabledRule")
            .field("id", &self.rule.id())
            .field("severity", &self.severity)
            .field("has_side_effects", &self.has_side_effects)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Linter`]
#[derive(Debug)]
pub struct LinterBuilder {
    registry: RuleRegistry,
    settings: BTreeMap<String, RuleSetting>,
    scope: ScopeSpec,
    ignore_attribute: String,
}

impl Default for LinterBuilder {
    fn default() -> Self {
        Self::new(RuleRegistry::builtin())
    }
}

impl LinterBuilder {
    /// Start from a registry; every rule runs at its default severity
    #[must_use]
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            settings: BTreeMap::new(),
            scope: ScopeSpec::Document,
            ignore_attribute: DEFAULT_IGNORE_ATTRIBUTE.to_string(),
        }
    }

    /// Register an additional rule
    pub fn register(mut self, rule: impl Rule + 'static) -> LinterResult<Self> {
        self.registry.register(rule)?;
        Ok(self)
    }

    /// Set a rule's severity, keeping default options
    #[must_use]
    pub fn rule(self, id: impl Into<String>, severity: Severity) -> Self {
        self.rule_setting(id, RuleSetting::new(severity))
    }

    /// Set a rule's severity and options
    #[must_use]
    pub fn rule_setting(mut self, id: impl Into<String>, setting: RuleSetting) -> Self {
        self.settings.insert(id.into(), setting);
        self
    }

    /// Limit detectors to part of the document
    #[must_use]
    pub fn scope(mut self, scope: ScopeSpec) -> Self {
        self.scope = scope;
        self
    }

    /// Attribute used as the ignore marker
    #[must_use]
    pub fn ignore_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.ignore_attribute = attribute.into();
        self
    }

    /// Validate settings and build the linter.
    ///
    /// Fails on settings for rules the registry does not know and on
    /// options a rule rejects, so nothing fails later mid-visit.
    pub fn build(self) -> LinterResult<Linter> {
        if let Some(unknown) = self
            .settings
            .keys()
            .find(|id| self.registry.get(id).is_none())
        {
            return Err(LinterError::config(format!("unknown rule '{unknown}'")));
        }

        let mut rules = Vec::new();
        for rule in self.registry.iter() {
            let meta = rule.meta();
            let setting = self
                .settings
                .get(rule.id())
                .cloned()
                .unwrap_or_else(|| RuleSetting::new(meta.severity));
            if setting.severity == Severity::Off {
                continue;
            }
            rule.validate_options(&setting.options)?;
            rules.push(EnabledRule {
                rule: Arc::clone(rule),
                severity: setting.severity,
                options: setting.options,
                has_side_effects: meta.has_side_effects,
            });
        }
        Ok(Linter {
            rules,
            scope: self.scope,
            ignore_attribute: self.ignore_attribute,
        })
    }
}

/// Runs a fixed rule set against pages
#[derive(Debug)]
pub struct Linter {
    rules: Vec<EnabledRule>,
    scope: ScopeSpec,
    ignore_attribute: String,
}

impl Linter {
    /// Builder over the built-in rules
    #[must_use]
    pub fn builder() -> LinterBuilder {
        LinterBuilder::default()
    }

    /// Ids of the rules that will run, in run order
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.rule.id())
    }

    /// Configured scope
    #[must_use]
    pub const fn scope(&self) -> &ScopeSpec {
        &self.scope
    }

    /// Lint one page
    pub async fn lint_page(&self, page: &mut dyn Page) -> LinterResult<LintResult> {
        let url = page.url().to_string();
        let span = info_span!("lint_page", url = %url);
        self.visit(page, &url).instrument(span).await
    }

    /// Lint many pages, at most `concurrency` at a time.
    ///
    /// Each future opens its own page; results come back in input order
    /// and every page that opened is closed.
    pub async fn lint_all<I, Fut>(
        &self,
        visits: I,
        concurrency: usize,
    ) -> Vec<LinterResult<LintResult>>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = LinterResult<Box<dyn Page>>>,
    {
        stream::iter(visits)
            .map(|open| async move {
                let mut page = open.await?;
                let result = self.lint_page(page.as_mut()).await;
                if let Err(e) = page.close().await {
                    warn!(url = page.url(), error = %e, "failed to close page");
                }
                result
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn visit(&self, page: &mut dyn Page, url: &str) -> LinterResult<LintResult> {
        let mut scope = page.resolve_scope(&self.scope).await?;
        let mut messages = Vec::new();
        let mut suppressed = Vec::new();

        for enabled in &self.rules {
            let id = enabled.rule.id();
            match self.run_rule(page, &scope, enabled).await {
                Ok((kept, silenced)) => {
                    messages.extend(kept);
                    suppressed.extend(silenced);
                }
                Err(e) => {
                    if let Err(dispose) = page.dispose_scope(scope).await {
                        debug!(error = %dispose, "scope disposal after failure");
                    }
                    return Err(LinterError::rule_failed(url, id, e));
                }
            }
            if enabled.has_side_effects {
                scope = Self::refresh(page, scope, &self.scope)
                    .await
                    .map_err(|e| LinterError::rule_failed(url, id, e))?;
            }
        }
        page.dispose_scope(scope).await?;

        let result = LintResult::new(url, messages, suppressed);
        info!(
            errors = result.error_count,
            warnings = result.warning_count,
            infos = result.info_count,
            suppressed = result.suppressed_messages.len(),
            "page linted"
        );
        Ok(result)
    }

    /// Throw away a scope, reset the page and resolve the scope again
    async fn refresh(page: &mut dyn Page, scope: Scope, spec: &ScopeSpec) -> LinterResult<Scope> {
        page.dispose_scope(scope).await?;
        page.reset().await?;
        debug!("page reset after rule with side effects");
        page.resolve_scope(spec).await
    }

    async fn run_rule(
        &self,
        page: &mut dyn Page,
        scope: &Scope,
        enabled: &EnabledRule,
    ) -> LinterResult<(Vec<LintMessage>, Vec<LintMessage>)> {
        let id = enabled.rule.id();
        debug!(rule = id, severity = %enabled.severity, "rule started");

        let checkout = ScrollCheckout::capture(page).await?;
        let mut ctx = RuleContext::new(&mut *page, scope, id, enabled.severity, &enabled.options);
        let outcome = enabled.rule.run(&mut ctx).await;
        let reports = ctx.into_reports();
        let restored = checkout.restore(page).await;
        outcome?;
        restored?;

        let (messages, suppressed) = self.classify(page, id, enabled.severity, reports).await?;
        debug!(
            rule = id,
            messages = messages.len(),
            suppressed = suppressed.len(),
            "rule finished"
        );
        Ok((messages, suppressed))
    }

    /// Resolve every report's elements, then split messages on the ignore
    /// markers of their primary elements
    async fn classify(
        &self,
        page: &mut dyn Page,
        rule_id: &str,
        severity: Severity,
        reports: Vec<ViolationReport>,
    ) -> LinterResult<(Vec<LintMessage>, Vec<LintMessage>)> {
        if reports.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let elements: Vec<_> = reports
            .iter()
            .flat_map(|r| std::iter::once(r.element).chain(r.relations.iter().map(|x| x.element)))
            .collect();
        let locations = page.resolve_locations(&elements).await?;
        if locations.len() != elements.len() {
            return Err(LinterError::page(format!(
                "resolved {} locations for {} elements",
                locations.len(),
                elements.len()
            )));
        }

        let mut locations = locations.into_iter();
        let mut next = || -> LinterResult<Location> {
            locations
                .next()
                .ok_or_else(|| LinterError::page("location list ended early"))
        };
        let mut built = Vec::with_capacity(reports.len());
        for report in reports {
            let location = next()?;
            let mut relations = Vec::with_capacity(report.relations.len());
            for relation in report.relations {
                relations.push(MessageRelation {
                    description: relation.description,
                    location: next()?,
                });
            }
            built.push(LintMessage {
                rule_id: rule_id.to_string(),
                severity,
                message: report.message,
                location,
                relations,
            });
        }

        let selectors: Vec<String> = built
            .iter()
            .map(|m| m.location.element.selector.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let ignored = page
            .ignored_selectors(&selectors, rule_id, &self.ignore_attribute)
            .await?;
        Ok(built
            .into_iter()
            .partition(|m| !ignored.contains(&m.location.element.selector)))
    }
}
