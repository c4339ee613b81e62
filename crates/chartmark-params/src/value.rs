//! Raw and resolved parameter maps
//!
//! Raw maps come straight out of the macro body parser: hyphenated keys,
//! string scalars, and at most one nested `series` list. Resolved maps are
//! keyed by internal (underscored) names and carry either a scalar or the
//! independently resolved series elements.

use crate::error::{ParameterError, ParameterResult};
use chartmark_data::Project;
use chrono::NaiveDate;
use indexmap::IndexMap;

/// Convert an internal (underscored) name to its external (hyphenated) form
#[inline]
#[must_use]
pub fn external_name(internal: &str) -> String {
    internal.replace('_', "-")
}

/// Convert an external (hyphenated) name to its internal (underscored) form
#[inline]
#[must_use]
pub fn internal_name(external: &str) -> String {
    external.replace('-', "_")
}

/// A raw parameter value as parsed from macro markup
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A scalar value, kept as the string the author wrote
    Scalar(String),
    /// A nested list of sub-object maps (the `series` key)
    Series(Vec<RawParams>),
}

/// Ordered raw parameter map, keyed by external (hyphenated) names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams {
    entries: IndexMap<String, RawValue>,
}

impl RawParams {
    /// Create an empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a scalar value under an external name
    pub fn insert(&mut self, external: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(external.into(), RawValue::Scalar(value.into()));
    }

    /// Insert the `series` sub-collection
    pub fn insert_series(&mut self, elements: Vec<RawParams>) {
        self.entries
            .insert("series".to_string(), RawValue::Series(elements));
    }

    /// Scalar value for an external name, if present
    #[must_use]
    pub fn scalar(&self, external: &str) -> Option<&str> {
        match self.entries.get(external) {
            Some(RawValue::Scalar(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// The `series` sub-collection, if present
    #[must_use]
    pub fn series(&self) -> Option<&[RawParams]> {
        match self.entries.get("series") {
            Some(RawValue::Series(elements)) => Some(elements.as_slice()),
            _ => None,
        }
    }

    /// Whether any value is stored under an external name
    #[inline]
    #[must_use]
    pub fn contains(&self, external: &str) -> bool {
        self.entries.contains_key(external)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build from (name, scalar) pairs, preserving order
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.insert(k, v);
        }
        params
    }
}

/// A resolved parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    /// Scalar resolved to its final string form
    Text(String),
    /// Independently resolved series elements, original order preserved
    Series(Vec<ResolvedParams>),
}

/// Resolved parameter map, keyed by internal (underscored) names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParams {
    values: IndexMap<String, ResolvedValue>,
}

impl ResolvedParams {
    /// Create an empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a scalar under an internal name
    pub fn set(&mut self, internal: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(internal.into(), ResolvedValue::Text(value.into()));
    }

    /// Store resolved series elements under an internal name
    pub fn set_series(&mut self, internal: impl Into<String>, elements: Vec<ResolvedParams>) {
        self.values
            .insert(internal.into(), ResolvedValue::Series(elements));
    }

    /// Resolved scalar for an internal name
    #[must_use]
    pub fn text(&self, internal: &str) -> Option<&str> {
        match self.values.get(internal) {
            Some(ResolvedValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Resolved series elements for an internal name
    #[must_use]
    pub fn series(&self, internal: &str) -> Option<&[ResolvedParams]> {
        match self.values.get(internal) {
            Some(ResolvedValue::Series(elements)) => Some(elements.as_slice()),
            _ => None,
        }
    }

    /// Resolved scalar parsed as a number
    ///
    /// # Errors
    /// Returns [`ParameterError::Convert`] when the value is not numeric.
    pub fn numeric(&self, internal: &str) -> ParameterResult<Option<f64>> {
        match self.text(internal) {
            None => Ok(None),
            Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| {
                ParameterError::convert(external_name(internal), raw, "number")
            }),
        }
    }

    /// Resolved scalar parsed as a date in the project's format
    ///
    /// # Errors
    /// Returns [`ParameterError::Convert`] when the value does not parse as
    /// a date.
    pub fn date(
        &self,
        internal: &str,
        project: &dyn Project,
    ) -> ParameterResult<Option<NaiveDate>> {
        match self.text(internal) {
            None => Ok(None),
            Some(raw) => project.parse_date(raw).map(Some).map_err(|_| {
                ParameterError::convert(external_name(internal), raw, "date")
            }),
        }
    }

    /// Resolved scalar parsed as a boolean flag (`true`/`false`, any case)
    ///
    /// # Errors
    /// Returns [`ParameterError::Convert`] for anything else.
    pub fn flag(&self, internal: &str) -> ParameterResult<Option<bool>> {
        match self.text(internal) {
            None => Ok(None),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(ParameterError::convert(
                    external_name(internal),
                    raw,
                    "boolean",
                )),
            },
        }
    }

    /// Whether anything resolved for an internal name
    #[inline]
    #[must_use]
    pub fn contains(&self, internal: &str) -> bool {
        self.values.contains_key(internal)
    }
}
