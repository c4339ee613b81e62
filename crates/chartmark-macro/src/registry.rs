//! Macro trait and registry
//!
//! The registry is an explicit object constructed once at process start
//! and threaded by reference through extraction; there is no ambient
//! global map.

use crate::context::MacroContext;
use crate::error::{MacroError, MacroResult};
use chartmark_params::RawParams;
use dashmap::DashMap;
use std::sync::Arc;

/// A constructed, parameter-validated macro instance
///
/// Construction resolves and validates parameters; execution is idempotent
/// given identical project state and parameters.
pub trait Macro: Send + Sync {
    /// Macro type name as written in markup
    fn name(&self) -> &str;

    /// Execute the macro and produce its rendered output
    ///
    /// # Errors
    /// Any failure is a [`MacroError`]; callers at the document level
    /// convert it to empty output.
    fn execute(&self, ctx: &MacroContext) -> MacroResult<String>;

    /// Whether the rendered output may be cached
    ///
    /// False when the underlying query is inherently dynamic (depends on
    /// "now"). Cross-project concerns are handled by the caching layer,
    /// which also consults the content provider.
    fn can_be_cached(&self) -> bool {
        true
    }
}

/// Factory constructing a macro from its raw parameter map
pub type MacroFactory =
    Arc<dyn Fn(&MacroContext, &RawParams) -> MacroResult<Box<dyn Macro>> + Send + Sync>;

/// Registry mapping macro-name strings to factories
#[derive(Clone, Default)]
pub struct MacroRegistry {
    factories: Arc<DashMap<String, MacroFactory>>,
}

impl MacroRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a macro name
    pub fn register(&self, name: impl Into<String>, factory: MacroFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Look up a factory by macro name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<MacroFactory> {
        self.factories.get(name).map(|entry| Arc::clone(&entry))
    }

    /// Whether a macro name is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Construct a macro instance by name
    ///
    /// # Errors
    /// Unknown names and any factory failure are [`MacroError::Processing`]
    /// carrying the host project for error display.
    pub fn construct(
        &self,
        name: &str,
        ctx: &MacroContext,
        raw: &RawParams,
    ) -> MacroResult<Box<dyn Macro>> {
        let factory = self.get(name).ok_or_else(|| {
            MacroError::processing_in(
                format!("No such macro: {name}"),
                ctx.project.identifier(),
            )
        })?;
        factory(ctx, raw).map_err(|err| err.with_project(ctx.project.identifier()))
    }

    /// Registered macro names
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.factories.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of registered macros
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("names", &self.names())
            .finish()
    }
}
