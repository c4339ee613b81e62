//! Error types for macro processing
//!
//! Every failure during extraction, parameter resolution, validation,
//! construction, or execution is normalized into [`MacroError`]. Raw
//! parser-library messages are never surfaced: YAML-level failures map to
//! the fixed [`SYNTAX_MESSAGE`].

use chartmark_params::ParameterError;

/// Fixed message shown for any YAML-level parse failure in a macro body
pub const SYNTAX_MESSAGE: &str =
    "Please check the syntax of this macro. The macro markup has to be valid YAML.";

/// Result type alias for macro operations
pub type MacroResult<T> = Result<T, MacroError>;

/// Errors surfaced to a macro author
#[derive(Debug, thiserror::Error)]
pub enum MacroError {
    /// Any failure while locating, constructing, or executing a macro
    #[error("{message}")]
    Processing {
        /// Human-readable description
        message: String,
        /// Project context for error display, when derivable
        project: Option<String>,
    },

    /// Aggregated business-rule validation failures
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
}

impl MacroError {
    /// Create a processing error without project context
    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
            project: None,
        }
    }

    /// Create a processing error carrying project context
    pub fn processing_in(message: impl Into<String>, project: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
            project: Some(project.into()),
        }
    }

    /// Attach project context if none is present
    #[must_use]
    pub fn with_project(self, project: &str) -> Self {
        match self {
            Self::Processing { message, project: None } => Self::Processing {
                message,
                project: Some(project.to_string()),
            },
            other => other,
        }
    }

    /// Project context, when known
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        match self {
            Self::Processing { project, .. } => project.as_deref(),
            Self::Validation(_) => None,
        }
    }
}

impl From<ParameterError> for MacroError {
    fn from(err: ParameterError) -> Self {
        Self::processing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_display_is_just_the_message() {
        let err = MacroError::processing_in("No such macro: pie", "alpha");
        assert_eq!(err.to_string(), "No such macro: pie");
        assert_eq!(err.project(), Some("alpha"));
    }

    #[test]
    fn validation_joins_with_comma() {
        let err = MacroError::Validation(vec![
            "start-date must come before end-date".to_string(),
            "down-from requires cumulative".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "start-date must come before end-date, down-from requires cumulative"
        );
    }

    #[test]
    fn parameter_errors_become_processing_errors() {
        let err: MacroError =
            ParameterError::missing(vec!["query".to_string()]).into();
        assert_eq!(err.to_string(), "parameter query is required");
        assert_eq!(err.project(), None);
    }

    #[test]
    fn with_project_does_not_overwrite() {
        let err = MacroError::processing_in("boom", "alpha").with_project("beta");
        assert_eq!(err.project(), Some("alpha"));
    }
}
