//! Configuration for the behaviour engine
//!
//! Two kinds of settings live here:
//! - Compile-time constants shared by the registry and its bindings
//! - [`RegistryConfig`], the runtime configuration of a single registry
//!
//! # Loading
//!
//! `RegistryConfig` can be built in code or parsed from YAML/JSON:
//!
//! ```yaml
//! failure_policy: propagate
//! ```
//!
//! Unknown keys are rejected so that typos do not silently fall back to the
//! defaults.

use crate::error::{BehaviourError, Result};
use serde::{Deserialize, Serialize};

/// Priority to use when a behaviour has no ordering requirements.
pub const DEFAULT_PRIORITY: i64 = 0;

/// Largest priority magnitude a JavaScript number holds exactly
/// (`Number.MAX_SAFE_INTEGER`).
pub const MAX_SAFE_PRIORITY: i64 = (1 << 53) - 1;

/// Convert a priority received as a floating point number (a JS number).
///
/// Only integral values within `±MAX_SAFE_PRIORITY` are accepted, so the
/// registry orders them exactly as the host would.
pub fn priority_from_f64(value: f64) -> Result<i64> {
    let reject = |reason: &str| BehaviourError::InvalidPriority {
        value,
        reason: reason.to_string(),
    };
    if !value.is_finite() {
        return Err(reject("not a finite number"));
    }
    if value.fract() != 0.0 {
        return Err(reject("not an integer"));
    }
    if value.abs() > MAX_SAFE_PRIORITY as f64 {
        return Err(reject("outside the safe integer range"));
    }
    Ok(value as i64)
}

/// Maximum configuration document size in bytes (64 KB).
///
/// A registry configuration is a handful of keys; anything larger is
/// almost certainly the wrong file.
pub const MAX_CONFIG_SIZE: usize = 64 * 1024;

/// What an apply pass does when a selector or a behaviour callback fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the pass at the first failure and return it to the caller.
    Propagate,
    /// Log the failure, record it in the report and keep going.
    #[default]
    Isolate,
}

/// Runtime configuration of a [`crate::BehaviourRegistry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// How failures during an apply pass are handled
    pub failure_policy: FailurePolicy,
}

impl RegistryConfig {
    /// Set the failure policy.
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        check_size(yaml)?;
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        tracing::debug!(failure_policy = ?config.failure_policy, "Parsed registry config");
        Ok(config)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        check_size(json)?;
        let config: Self = serde_json::from_str(json)?;
        tracing::debug!(failure_policy = ?config.failure_policy, "Parsed registry config");
        Ok(config)
    }
}

fn check_size(content: &str) -> Result<()> {
    if content.len() > MAX_CONFIG_SIZE {
        return Err(BehaviourError::ConfigError(format!(
            "Configuration exceeds maximum size ({} bytes)",
            MAX_CONFIG_SIZE
        )));
    }
    Ok(())
}
