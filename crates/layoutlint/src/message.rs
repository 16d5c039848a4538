//! Lint messages and per-page results.
//!
//! Nothing here references a live element: locations are resolved to
//! selectors before a message is built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::LinterError;

/// Rule severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rule disabled, never executed
    Off,
    /// Informational (also called "recommend")
    #[serde(alias = "recommend")]
    Info,
    /// Should be reviewed
    #[serde(alias = "warning")]
    Warn,
    /// Must be fixed
    Error,
}

impl Severity {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LinterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(Self::Off),
            "info" | "recommend" => Ok(Self::Info),
            "warn" | "warning" | "1" => Ok(Self::Warn),
            "error" | "2" => Ok(Self::Error),
            other => Err(LinterError::config(format!("unknown severity '{other}'"))),
        }
    }
}

/// Serializable identity of an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementLocation {
    /// Lowercase tag name
    pub tag_name: String,
    /// `id` attribute, empty when absent
    #[serde(default)]
    pub id: String,
    /// Class list
    #[serde(default)]
    pub classes: Vec<String>,
    /// Selector produced by the page's finder
    pub selector: String,
}

/// Where a violation is
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// The element
    pub element: ElementLocation,
}

/// Secondary element of a message, e.g. the sibling it overlaps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRelation {
    /// How the element relates to the primary one
    pub description: String,
    /// Where it is
    pub location: Location,
}

/// One reported defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintMessage {
    /// Rule that reported it
    pub rule_id: String,
    /// Configured severity of that rule
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
    /// Primary element
    pub location: Location,
    /// Related elements
    #[serde(default)]
    pub relations: Vec<MessageRelation>,
}

/// Result of linting one page
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintResult {
    /// Page URL
    pub url: String,
    /// Reported messages
    pub messages: Vec<LintMessage>,
    /// Messages silenced by an ignore marker
    pub suppressed_messages: Vec<LintMessage>,
    /// Messages with severity `error`
    pub error_count: usize,
    /// Messages with severity `warn`
    pub warning_count: usize,
    /// Messages with severity `info`
    pub info_count: usize,
    /// Same as `info_count`
    pub recommend_count: usize,
}

impl LintResult {
    /// Build a result, deriving counts from `messages` only
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        messages: Vec<LintMessage>,
        suppressed_messages: Vec<LintMessage>,
    ) -> Self {
        let count = |s: Severity| messages.iter().filter(|m| m.severity == s).count();
        let error_count = count(Severity::Error);
        let warning_count = count(Severity::Warn);
        let info_count = count(Severity::Info);
        Self {
            url: url.into(),
            messages,
            suppressed_messages,
            error_count,
            warning_count,
            info_count,
            recommend_count: info_count,
        }
    }

    /// Whether any error-severity message was reported
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn message(severity: Severity) -> LintMessage {
        LintMessage {
            rule_id: "ragged-lines".to_string(),
            severity,
            message: "m".to_string(),
            location: Location {
                element: ElementLocation {
                    tag_name: "p".to_string(),
                    id: String::new(),
                    classes: vec![],
                    selector: "p".to_string(),
                },
            },
            relations: vec![],
        }
    }

    mod severity_tests {
        use super::*;

        #[test]
        fn test_aliases() {
            assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warn);
            assert_eq!("recommend".parse::<Severity>().unwrap(), Severity::Info);
            assert!("loud".parse::<Severity>().is_err());
            let s: Severity = serde_json::from_str("\"warning\"").unwrap();
            assert_eq!(s, Severity::Warn);
        }

        #[test]
        fn test_ordering() {
            assert!(Severity::Error > Severity::Warn);
            assert!(Severity::Info > Severity::Off);
        }
    }

    mod result_tests {
        use super::*;

        #[test]
        fn test_counts_ignore_suppressed() {
            let r = LintResult::new(
                "about:blank",
                vec![message(Severity::Error), message(Severity::Info)],
                vec![message(Severity::Error)],
            );
            assert_eq!(r.error_count, 1);
            assert_eq!(r.warning_count, 0);
            assert_eq!(r.info_count, 1);
            assert_eq!(r.recommend_count, 1);
            assert!(r.has_errors());
        }

        #[test]
        fn test_camel_case_json() {
            let r = LintResult::new("u", vec![message(Severity::Warn)], vec![]);
            let json = serde_json::to_value(&r).unwrap();
            assert_eq!(json["warningCount"], 1);
            assert_eq!(json["messages"][0]["ruleId"], "ragged-lines");
            assert_eq!(json["messages"][0]["location"]["element"]["tagName"], "p");
            assert!(json["suppressedMessages"].as_array().unwrap().is_empty());
        }
    }
}
