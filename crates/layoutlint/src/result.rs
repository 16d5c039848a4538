//! Result and error types for Layoutlint.

use thiserror::Error;

/// Result type for Layoutlint operations
pub type LinterResult<T> = Result<T, LinterError>;

/// Errors that can occur while linting a page
#[derive(Debug, Error)]
pub enum LinterError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page error (creation, reset, closed connection)
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Script evaluation inside the page failed
    #[error("Script evaluation failed: {message}")]
    Evaluation {
        /// Error message
        message: String,
    },

    /// The in-page runtime the engine relies on is missing or broken
    #[error("Page environment is broken: {message}")]
    EnvironmentFatal {
        /// Error message
        message: String,
    },

    /// A rule run failed; the whole page visit is aborted
    #[error("Rule '{rule_id}' failed on {url}: {source}")]
    RuleFailed {
        /// Page URL
        url: String,
        /// Failing rule
        rule_id: String,
        /// Underlying error
        #[source]
        source: Box<LinterError>,
    },

    /// Scope selector could not be resolved
    #[error("Invalid scope selector: {selector}")]
    InvalidScope {
        /// Selector that failed
        selector: String,
    },

    /// Element handle is not known to the page
    #[error("Unknown element handle: {id}")]
    UnknownElement {
        /// Element handle
        id: u32,
    },

    /// Rule options did not match the rule's option schema
    #[error("Invalid options for rule '{rule_id}': {message}")]
    InvalidOptions {
        /// Rule identifier
        rule_id: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl LinterError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create an environment-fatal error
    #[must_use]
    pub fn environment(message: impl Into<String>) -> Self {
        Self::EnvironmentFatal {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap an error raised while running `rule_id` against `url`
    #[must_use]
    pub fn rule_failed(url: impl Into<String>, rule_id: impl Into<String>, source: Self) -> Self {
        Self::RuleFailed {
            url: url.into(),
            rule_id: rule_id.into(),
            source: Box::new(source),
        }
    }

    /// Whether the page environment itself is broken
    #[must_use]
    pub fn is_environment_fatal(&self) -> bool {
        match self {
            Self::EnvironmentFatal { .. } => true,
            Self::RuleFailed { source, .. } => source.is_environment_fatal(),
            _ => false,
        }
    }
}
