//! Lint configuration files.
//!
//! ```yaml
//! rules:
//!   misalignment: off
//!   ragged-lines: [warn, { orphanRatio: 0.3 }]
//! scope: main
//! viewport: { width: 1440, height: 900 }
//! concurrency: 8
//! reset: reload
//! ```
//!
//! YAML and JSON are both accepted; the format follows the file extension.

use crate::engine::{LinterBuilder, RuleSetting, DEFAULT_IGNORE_ATTRIBUTE};
use crate::message::Severity;
use crate::page::ScopeSpec;
use crate::result::{LinterError, LinterResult};
use crate::rules::RuleRegistry;
use crate::snapshot::Viewport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File name the CLI looks for in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".layoutlint.yaml";

/// One entry under `rules:`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleEntry {
    /// `rule-id: warn`
    Severity(Severity),
    /// `rule-id: [warn, { ... }]`
    WithOptions(Severity, serde_json::Value),
}

impl RuleEntry {
    /// Configured severity
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Severity(s) | Self::WithOptions(s, _) => *s,
        }
    }

    fn into_setting(self) -> RuleSetting {
        match self {
            Self::Severity(s) => RuleSetting::new(s),
            Self::WithOptions(s, options) => RuleSetting::with_options(s, options),
        }
    }
}

/// What a browser page does between rules with side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// Reload the page and wait for it to settle
    #[default]
    Reload,
    /// Leave the page as the rule left it
    None,
}

/// Viewport size used when the linter opens pages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Width in CSS px
    pub width: u32,
    /// Height in CSS px
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

impl From<ViewportSize> for Viewport {
    fn from(size: ViewportSize) -> Self {
        Self::new(f64::from(size.width), f64::from(size.height))
    }
}

/// Contents of a configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct LintConfig {
    /// Per-rule severity and options; unlisted rules keep their defaults
    pub rules: BTreeMap<String, RuleEntry>,
    /// CSS selector limiting the scanned part of the page
    pub scope: Option<String>,
    /// Ignore-marker attribute
    pub ignore_attribute: String,
    /// Viewport size for browser pages
    pub viewport: ViewportSize,
    /// Pages linted at the same time
    pub concurrency: usize,
    /// Page reset after rules with side effects
    pub reset: ResetPolicy,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            scope: None,
            ignore_attribute: DEFAULT_IGNORE_ATTRIBUTE.to_string(),
            viewport: ViewportSize::default(),
            concurrency: 4,
            reset: ResetPolicy::default(),
        }
    }
}

impl LintConfig {
    /// Parse YAML (JSON is a subset)
    pub fn from_yaml(text: &str) -> LinterResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON
    pub fn from_json(text: &str) -> LinterResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a file; `.json` is read as JSON, anything else as YAML
    pub fn from_path(path: impl AsRef<Path>) -> LinterResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&text)
        } else {
            Self::from_yaml(&text)
        }
    }

    /// Override one rule's severity, keeping any configured options
    pub fn set_severity(&mut self, rule_id: impl Into<String>, severity: Severity) {
        let id = rule_id.into();
        let entry = match self.rules.remove(&id) {
            Some(RuleEntry::WithOptions(_, options)) => RuleEntry::WithOptions(severity, options),
            _ => RuleEntry::Severity(severity),
        };
        self.rules.insert(id, entry);
    }

    /// Configured scope
    #[must_use]
    pub fn scope_spec(&self) -> ScopeSpec {
        ScopeSpec::from_selector(self.scope.as_deref())
    }

    /// Linter builder over `registry` carrying this configuration
    #[must_use]
    pub fn builder(&self, registry: RuleRegistry) -> LinterBuilder {
        self.rules.iter().fold(
            LinterBuilder::new(registry)
                .scope(self.scope_spec())
                .ignore_attribute(self.ignore_attribute.clone()),
            |builder, (id, entry)| builder.rule_setting(id.clone(), entry.clone().into_setting()),
        )
    }

    fn validate(&self) -> LinterResult<()> {
        if self.concurrency == 0 {
            return Err(LinterError::config("concurrency must be at least 1"));
        }
        if self.ignore_attribute.trim().is_empty() {
            return Err(LinterError::config("ignore_attribute must not be empty"));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(LinterError::config("viewport must not be empty"));
        }
        Ok(())
    }
}
