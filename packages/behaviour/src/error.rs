//! Error types for the behaviour engine

use crate::report::ApplyReport;
use thiserror::Error;

/// Boxed error returned by behaviour callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single behaviour callback invocation.
pub type BehaviourResult = std::result::Result<(), BoxError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum BehaviourError {
    /// The selector delegate rejected a selector
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A behaviour callback failed on a matched element
    #[error("Behaviour '{id}' failed on '{selector}': {source}")]
    BehaviourFailed {
        id: String,
        selector: String,
        #[source]
        source: BoxError,
    },

    /// A queued pass failed; passes drained before it are kept in `completed`
    #[error("Apply queue stopped after {} completed passes: {source}", .completed.len())]
    QueueStopped {
        completed: Vec<ApplyReport>,
        #[source]
        source: Box<BehaviourError>,
    },

    /// A priority from the host cannot be represented exactly
    #[error("Invalid priority {value}: {reason}")]
    InvalidPriority { value: f64, reason: String },

    /// The host DOM reported an error outside selector parsing
    #[error("DOM error: {0}")]
    Dom(String),

    /// Invalid registry configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl BehaviourError {
    /// Shorthand for an [`BehaviourError::InvalidSelector`] error.
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, BehaviourError>;
