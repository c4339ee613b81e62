//! Error types for the daily-history engine

use chartmark_chart::ChartError;
use chartmark_data::{CacheStoreError, QueryError};
use chartmark_macro::MacroError;

/// Result type alias for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors filling or reading the daily-history cache
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Cache store failure
    ///
    /// Unlike the rendered-output cache, the history cache is the data
    /// source itself, so a store failure here does surface.
    #[error(transparent)]
    Store(#[from] CacheStoreError),

    /// Point-in-time query failure
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Chart assembly failure
    #[error(transparent)]
    Chart(#[from] ChartError),
}

impl From<HistoryError> for MacroError {
    fn from(err: HistoryError) -> Self {
        MacroError::processing(err.to_string())
    }
}
