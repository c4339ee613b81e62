//! Async-macro configuration
//!
//! Expensive macro types opt in to asynchronous generation by name. An
//! opted-in macro renders a lightweight placeholder immediately; the real
//! execution happens on a follow-up request triggered client-side.

use serde::Deserialize;
use std::collections::HashSet;

/// Names of macro types that render asynchronously
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AsyncMacroConfig {
    #[serde(default)]
    async_macros: HashSet<String>,
}

impl AsyncMacroConfig {
    /// Configuration with no async macros
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an explicit name list
    #[must_use]
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            async_macros: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Load from YAML (`async_macros: [daily-history-chart]`)
    ///
    /// # Errors
    /// Returns the serde_yaml error for malformed configuration.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Whether a macro type renders asynchronously
    #[inline]
    #[must_use]
    pub fn is_async(&self, name: &str) -> bool {
        self.async_macros.contains(name)
    }
}
