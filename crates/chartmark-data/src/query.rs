//! Query engine seam
//!
//! The engine parses query strings and evaluates them against tabular
//! project data, optionally at a past point in time ("as of"). Chartmark
//! only needs the narrow surface defined here; the query language itself
//! is an external collaborator.

use crate::error::QueryError;
use crate::property::PropertyDefinition;
use chrono::NaiveDate;

/// One row of a query result: the grouping key and an aggregate value
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Stored string form of the grouping property value
    pub key: String,
    /// Aggregate value for that key
    pub value: f64,
}

impl Row {
    /// Create a result row
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Options passed to [`QueryEngine::parse`]
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Extra conditions merged into the query (chart-level conditions)
    pub conditions: Option<String>,
}

/// A parsed, executable query
pub trait DataQuery: Send + Sync {
    /// Evaluate the query, optionally as of a past date
    ///
    /// # Errors
    /// Returns [`QueryError`] when evaluation fails or as-of evaluation is
    /// unsupported for this query shape.
    fn values(&self, as_of: Option<NaiveDate>) -> Result<Vec<Row>, QueryError>;

    /// Return a new query narrowed by extra conditions
    ///
    /// # Errors
    /// Returns [`QueryError::Parse`] when the conditions do not parse.
    fn restrict_with(&self, conditions: &str) -> Result<Box<dyn DataQuery>, QueryError>;

    /// Definition of the property the first selected column groups by
    fn column_property(&self) -> Option<PropertyDefinition>;

    /// Whether the query result depends on the current wall clock
    ///
    /// Time-dependent queries (referencing "today") make the owning macro
    /// uncacheable.
    fn is_time_dependent(&self) -> bool {
        false
    }
}

/// Parser for the external query language
pub trait QueryEngine: Send + Sync {
    /// Parse a query string into an executable query
    ///
    /// # Errors
    /// Returns [`QueryError::Parse`] on malformed query text.
    fn parse(&self, query: &str, options: &QueryOptions) -> Result<Box<dyn DataQuery>, QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_construction() {
        let row = Row::new("Iteration 1", 5.0);
        assert_eq!(row.key, "Iteration 1");
        assert!((row.value - 5.0).abs() < f64::EPSILON);
    }
}
