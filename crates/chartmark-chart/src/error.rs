//! Error types for the chart data model
//!
//! Data-consistency failures here are business-rule violations surfaced to
//! the macro author as rendered error text, not system failures.

use chartmark_data::QueryError;
use chartmark_macro::MacroError;
use chartmark_params::ParameterError;

/// Result type alias for chart operations
pub type ChartResult<T> = Result<T, ChartError>;

/// Errors building or loading a chart
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// `down-from` is only meaningful on a cumulative chart
    #[error("down-from can only be used when cumulative is true")]
    DownFromRequiresCumulative,

    /// A `total` series is smaller than the sum of its overlays
    #[error("total series value at '{label}' is less than the sum of its overlay series")]
    TotalLessThanOverlays {
        /// X-axis label of the inconsistent position
        label: String,
    },

    /// A trend or combine parameter referenced a series that does not exist
    #[error("no series named '{0}'")]
    UnknownSeries(String),

    /// An x-axis override did not parse in the project's date format
    #[error("x-labels boundary '{0}' is not a valid date")]
    InvalidDateBoundary(String),

    /// Parameter resolution or conversion failed
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// Query collaborator failure
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl From<ChartError> for MacroError {
    fn from(err: ChartError) -> Self {
        MacroError::processing(err.to_string())
    }
}
