//! Error types for the data boundary
//!
//! Collaborator failures are split into two families: query evaluation
//! errors (surfaced to the macro author) and cache-store errors (always
//! caught by callers and degraded to uncached execution).

/// Errors from the query collaborator
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Query string could not be parsed
    #[error("could not parse query: {0}")]
    Parse(String),

    /// Query references a property the project does not have
    #[error("unknown property: '{0}'")]
    UnknownProperty(String),

    /// Evaluation failed in the underlying engine
    #[error("query execution failed: {0}")]
    Execution(String),

    /// Point-in-time evaluation is not supported by this query
    #[error("query does not support as-of evaluation: {0}")]
    AsOfUnsupported(String),
}

impl QueryError {
    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}

/// Errors from the cache store collaborator
///
/// These never escape the caching layers: a failing store degrades to
/// uncached execution.
#[derive(Debug, thiserror::Error)]
pub enum CacheStoreError {
    /// Store backend is unreachable
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded
    #[error("corrupt cache entry for key '{key}': {message}")]
    Corrupt {
        /// Key whose entry failed to decode
        key: String,
        /// Decoder failure detail
        message: String,
    },
}

impl CacheStoreError {
    /// Create an unavailability error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a corrupt-entry error
    pub fn corrupt(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            message: message.into(),
        }
    }
}
