//! Error types for parameter resolution and conversion

use chartmark_data::ValueKind;

/// Result type alias for parameter operations
pub type ParameterResult<T> = Result<T, ParameterError>;

/// Errors raised while resolving or converting macro parameters
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    /// One or more required parameters were not supplied
    ///
    /// Names are external (hyphenated) and listed in declaration order.
    #[error("{}", missing_message(.0))]
    MissingValues(Vec<String>),

    /// A computed value's kind does not match the parameter's declared kinds
    #[error("parameter '{parameter}' cannot use value '{value}': expected {} value", expected_kinds(.expected))]
    IncompatibleType {
        /// External name of the parameter
        parameter: String,
        /// The offending resolved value
        value: String,
        /// Kinds the parameter accepts
        expected: Vec<ValueKind>,
    },

    /// A declared type conversion failed (e.g. string to date)
    ///
    /// Short-circuits validation: invalid data is never partially
    /// validated.
    #[error("parameter '{parameter}' value '{value}' is not a valid {expected}")]
    Convert {
        /// External name of the parameter
        parameter: String,
        /// The raw value that failed to convert
        value: String,
        /// Target type name
        expected: &'static str,
    },
}

impl ParameterError {
    /// Create a missing-values error from external parameter names
    #[must_use]
    pub fn missing(names: Vec<String>) -> Self {
        Self::MissingValues(names)
    }

    /// Create a conversion error
    pub fn convert(
        parameter: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::Convert {
            parameter: parameter.into(),
            value: value.into(),
            expected,
        }
    }
}

fn missing_message(names: &[String]) -> String {
    let joined = names.join(", ");
    if names.len() == 1 {
        format!("parameter {joined} is required")
    } else {
        format!("parameters {joined} are required")
    }
}

fn expected_kinds(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(|k| k.describe())
        .collect::<Vec<_>>()
        .join(" or ")
}
