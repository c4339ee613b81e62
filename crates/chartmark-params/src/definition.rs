//! Parameter definitions
//!
//! Each macro type declares its parameters as an explicit, ordered list of
//! [`ParameterDefinition`] descriptors; the resolver walks that list. This
//! replaces reflective accessor generation with a plain schema object.

use crate::resolver::ResolveContext;
use chartmark_data::ValueKind;
use std::sync::Arc;

/// Closure computing a default value at resolve time
pub type ComputedDefault = Arc<dyn Fn(&ResolveContext<'_>) -> Option<String> + Send + Sync>;

/// Closure deciding whether a parameter is required at resolve time
pub type ComputedRequirement = Arc<dyn Fn(&ResolveContext<'_>) -> bool + Send + Sync>;

/// Default value for a parameter
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed default
    Static(String),
    /// A default computed against the resolve context
    Computed(ComputedDefault),
}

impl std::fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Whether a parameter must resolve to a value
#[derive(Clone, Default)]
pub enum Requirement {
    /// Optional
    #[default]
    Never,
    /// Always required
    Always,
    /// Required when the predicate holds for the resolve context
    When(ComputedRequirement),
}

impl Requirement {
    /// Evaluate the requirement against a context
    #[must_use]
    pub fn applies(&self, ctx: &ResolveContext<'_>) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::When(predicate) => predicate(ctx),
        }
    }
}

impl std::fmt::Debug for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::Always => f.write_str("Always"),
            Self::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Declarative schema for a single macro or series parameter
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    name: String,
    requirement: Requirement,
    default: Option<DefaultValue>,
    compatible_kinds: Vec<ValueKind>,
    computable: bool,
    allowed_values: Vec<String>,
    list_schema: Option<Arc<Vec<ParameterDefinition>>>,
}

impl ParameterDefinition {
    /// Create a definition for an internal (underscored) name
    ///
    /// By default the parameter is optional, text-kinded, not computable,
    /// and has neither default nor whitelist.
    #[must_use]
    pub fn new(internal: impl Into<String>) -> Self {
        Self {
            name: internal.into(),
            requirement: Requirement::Never,
            default: None,
            compatible_kinds: vec![ValueKind::Text],
            computable: false,
            allowed_values: Vec::new(),
            list_schema: None,
        }
    }

    /// Mark the parameter as always required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.requirement = Requirement::Always;
        self
    }

    /// Make required-ness context-dependent
    #[must_use]
    pub fn required_when(mut self, predicate: ComputedRequirement) -> Self {
        self.requirement = Requirement::When(predicate);
        self
    }

    /// Set a static default
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    /// Set a computed default
    #[must_use]
    pub fn computed_default(mut self, default: ComputedDefault) -> Self {
        self.default = Some(DefaultValue::Computed(default));
        self
    }

    /// Set the compatible value kinds
    #[must_use]
    pub fn compatible(mut self, kinds: &[ValueKind]) -> Self {
        self.compatible_kinds = kinds.to_vec();
        self
    }

    /// Allow computed forms (`THIS CARD.<property>`, project variables)
    #[must_use]
    pub fn computable(mut self) -> Self {
        self.computable = true;
        self
    }

    /// Restrict accepted literals to a whitelist (matched case-insensitively)
    #[must_use]
    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Declare this parameter as a repeated sub-object (`series`)
    ///
    /// Values come from the raw map's `series` sub-collection; each element
    /// is resolved independently against `schema`.
    #[must_use]
    pub fn list_of(mut self, schema: Vec<ParameterDefinition>) -> Self {
        self.list_schema = Some(Arc::new(schema));
        self
    }

    /// Internal (underscored) name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requirement of this parameter
    #[inline]
    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Default value, if declared
    #[inline]
    #[must_use]
    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Kinds this parameter accepts
    #[inline]
    #[must_use]
    pub fn compatible_kinds(&self) -> &[ValueKind] {
        &self.compatible_kinds
    }

    /// Whether computed forms are allowed
    #[inline]
    #[must_use]
    pub fn is_computable(&self) -> bool {
        self.computable
    }

    /// Literal whitelist, empty when unrestricted
    #[inline]
    #[must_use]
    pub fn allowed(&self) -> &[String] {
        &self.allowed_values
    }

    /// Element schema when this is a `list_of` parameter
    #[inline]
    #[must_use]
    pub fn list_schema(&self) -> Option<&[ParameterDefinition]> {
        self.list_schema.as_deref().map(Vec::as_slice)
    }
}
