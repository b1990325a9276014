//! Registry configuration.
//!
//! Values come from builder calls, environment variables, or (with the
//! `config` feature) JSON documents.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Prefix for environment variables read by [`RegistryConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "SCOPED_CONTAINER";

/// Settings for a [`ScopeRegistry`](crate::ScopeRegistry).
///
/// # Examples
///
/// ```
/// use scoped_container::{RegistryConfig, ScopeRegistry};
///
/// let config = RegistryConfig::new()
///     .with_leak_warning_threshold(1_000)
///     .with_live_scope_logging(true);
/// let registry = ScopeRegistry::new().with_config(config);
/// assert_eq!(registry.config().leak_warning_threshold, Some(1_000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RegistryConfig {
    /// Warn when more scopes than this are live at once
    pub leak_warning_threshold: Option<usize>,
    /// Log the live scope ids after every finalized response
    pub log_live_scopes: bool,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leak_warning_threshold(mut self, threshold: usize) -> Self {
        self.leak_warning_threshold = Some(threshold);
        self
    }

    pub fn with_live_scope_logging(mut self, enabled: bool) -> Self {
        self.log_live_scopes = enabled;
        self
    }

    /// Reads `SCOPED_CONTAINER_LEAK_WARNING_THRESHOLD` and
    /// `SCOPED_CONTAINER_LOG_LIVE_SCOPES`. Unset variables keep their defaults.
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Like [`from_env`](Self::from_env) with a custom variable prefix.
    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    fn from_lookup<F>(prefix: &str, lookup: F) -> DiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = prefix.to_uppercase();
        let mut config = Self::default();

        let key = format!("{}_LEAK_WARNING_THRESHOLD", prefix);
        if let Some(raw) = lookup(&key) {
            let threshold = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| DiError::Config(format!("{}: {}", key, e)))?;
            config.leak_warning_threshold = Some(threshold);
        }

        let key = format!("{}_LOG_LIVE_SCOPES", prefix);
        if let Some(raw) = lookup(&key) {
            config.log_live_scopes = parse_bool(&raw).ok_or_else(|| {
                DiError::Config(format!("{}: expected a boolean, got {:?}", key, raw))
            })?;
        }

        Ok(config)
    }

    /// Parses a JSON document such as `{"leak_warning_threshold": 100}`.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::Config(e.to_string()))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
