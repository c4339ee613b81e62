//! Ordered validation pipeline
//!
//! Macro types declare an ordered list of named validation steps. A step
//! can be guarded (skipped unless a predicate holds), can override its
//! failure message, and can be blocking: a blocking step that fails stops
//! the pipeline, for validators that are logical prerequisites of later
//! ones ("start-date is present" must hold before "start-date < end-date"
//! means anything).
//!
//! Type conversions run strictly before business validation; a conversion
//! failure short-circuits the whole pipeline by erroring during macro
//! construction, so invalid data is never partially validated.

use crate::error::{MacroError, MacroResult};

type Check<T> = Box<dyn Fn(&T) -> Result<bool, String> + Send + Sync>;
type Guard<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// One named validation step
pub struct Step<T: ?Sized> {
    name: &'static str,
    check: Check<T>,
    guard: Option<Guard<T>>,
    message: Option<String>,
    block: bool,
}

impl<T: ?Sized> Step<T> {
    /// Create a step from a name and a check
    ///
    /// The check returns `Ok(true)` to pass, `Ok(false)` to fail with the
    /// step's message, or `Err(detail)` to fail with the message plus the
    /// detail text.
    #[must_use]
    pub fn new(
        name: &'static str,
        check: impl Fn(&T) -> Result<bool, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            check: Box::new(check),
            guard: None,
            message: None,
            block: false,
        }
    }

    /// Skip this step unless the predicate holds
    #[must_use]
    pub fn guard(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Box::new(predicate));
        self
    }

    /// Override the default failure message
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Stop the pipeline as soon as this step fails
    #[must_use]
    pub fn blocking(mut self) -> Self {
        self.block = true;
        self
    }

    fn failure_message(&self, detail: Option<String>) -> String {
        let base = self
            .message
            .clone()
            .unwrap_or_else(|| format!("{} failed", self.name.replace('_', " ")));
        match detail {
            Some(detail) if !detail.is_empty() => format!("{base}: {detail}"),
            _ => base,
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Step<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("block", &self.block)
            .finish()
    }
}

/// An ordered list of validation steps for one target type
pub struct ValidationPipeline<T: ?Sized> {
    steps: Vec<Step<T>>,
}

impl<T: ?Sized> ValidationPipeline<T> {
    /// Create an empty pipeline
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step, preserving declaration order
    #[must_use]
    pub fn step(mut self, step: Step<T>) -> Self {
        self.steps.push(step);
        self
    }

    /// Number of declared steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline has no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order against a target
    ///
    /// Prior errors are discarded; each call starts clean. Failures are
    /// aggregated into [`MacroError::Validation`]; a failing blocking step
    /// stops further processing.
    ///
    /// # Errors
    /// Returns [`MacroError::Validation`] with one message per failed step.
    pub fn validate(&self, target: &T) -> MacroResult<()> {
        let mut errors = Vec::new();

        for step in &self.steps {
            if let Some(guard) = &step.guard {
                if !guard(target) {
                    continue;
                }
            }
            let failure = match (step.check)(target) {
                Ok(true) => None,
                Ok(false) => Some(step.failure_message(None)),
                Err(detail) => Some(step.failure_message(Some(detail))),
            };
            if let Some(message) = failure {
                errors.push(message);
                if step.block {
                    break;
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MacroError::Validation(errors))
        }
    }
}

impl<T: ?Sized> Default for ValidationPipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for ValidationPipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("steps", &self.steps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dates {
        start: Option<i32>,
        end: Option<i32>,
    }

    fn pipeline() -> ValidationPipeline<Dates> {
        ValidationPipeline::new()
            .step(
                Step::new("start_date_present", |d: &Dates| Ok(d.start.is_some()))
                    .message("start-date must be supplied")
                    .blocking(),
            )
            .step(
                Step::new("start_before_end", |d: &Dates| {
                    Ok(d.start.unwrap() < d.end.unwrap_or(i32::MAX))
                })
                .message("start-date must come before end-date"),
            )
    }

    #[test]
    fn passing_target_is_ok() {
        let target = Dates {
            start: Some(1),
            end: Some(5),
        };
        assert!(pipeline().validate(&target).is_ok());
    }

    #[test]
    fn blocking_failure_stops_processing() {
        // without blocking the second step would panic on unwrap
        let target = Dates {
            start: None,
            end: Some(5),
        };
        let err = pipeline().validate(&target).unwrap_err();
        assert_eq!(err.to_string(), "start-date must be supplied");
    }

    #[test]
    fn non_blocking_failures_aggregate() {
        let pipeline: ValidationPipeline<i32> = ValidationPipeline::new()
            .step(Step::new("positive", |n: &i32| Ok(*n > 0)))
            .step(Step::new("even", |n: &i32| Ok(*n % 2 == 0)).message("must be even"));

        let err = pipeline.validate(&-3).unwrap_err();
        assert_eq!(err.to_string(), "positive failed, must be even");
    }

    #[test]
    fn guard_skips_step() {
        let pipeline: ValidationPipeline<Dates> = ValidationPipeline::new().step(
            Step::new("start_before_end", |d: &Dates| {
                Ok(d.start.unwrap() < d.end.unwrap())
            })
            .guard(|d: &Dates| d.start.is_some() && d.end.is_some()),
        );

        let target = Dates {
            start: None,
            end: None,
        };
        assert!(pipeline.validate(&target).is_ok());
    }

    #[test]
    fn raised_detail_is_appended_to_message() {
        let pipeline: ValidationPipeline<i32> = ValidationPipeline::new().step(
            Step::new("parseable", |_: &i32| Err("not a number".to_string()))
                .message("value is invalid"),
        );

        let err = pipeline.validate(&0).unwrap_err();
        assert_eq!(err.to_string(), "value is invalid: not a number");
    }

    #[test]
    fn validate_starts_clean_each_call() {
        let pipeline: ValidationPipeline<i32> =
            ValidationPipeline::new().step(Step::new("positive", |n: &i32| Ok(*n > 0)));

        assert!(pipeline.validate(&-1).is_err());
        assert!(pipeline.validate(&1).is_ok());
    }
}
