//! Macro rendering and the caching decorator
//!
//! [`MacroRenderer`] is the plain path: extract, construct, execute.
//! [`CachingRenderer`] wraps it with a content-addressed output cache and
//! the async placeholder path. Caching is explicit decorator composition,
//! not method rewriting.
//!
//! Cache key material is (content-provider identity, content-provider
//! version, macro type, ordinal position): rendered output is pinned to an
//! exact revision of the owning document, so any edit invalidates all of
//! its macro caches at once.

use crate::config::AsyncMacroConfig;
use crate::context::MacroContext;
use crate::error::MacroResult;
use crate::extract::Extractor;
use chartmark_data::{crosses_projects, CacheStore, ContentProvider};
use std::sync::Arc;

/// Per-render options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Bypass the output cache entirely
    pub dont_use_cache: bool,
    /// Execute inline even for async-configured macro types
    pub force_synchronous: bool,
}

/// Renders the N-th macro of a type out of raw document text
pub trait RenderMacro {
    /// Render a macro occurrence to output text
    ///
    /// # Errors
    /// Propagates [`crate::MacroError`] from extraction, construction,
    /// validation, or execution. Cache-layer failures are never surfaced.
    fn render(
        &self,
        text: &str,
        name: &str,
        position: usize,
        ctx: &MacroContext,
        options: &RenderOptions,
    ) -> MacroResult<String>;
}

/// Plain executor: extract, construct, execute
pub struct MacroRenderer<'a> {
    extractor: Extractor<'a>,
}

impl<'a> MacroRenderer<'a> {
    /// Create a renderer over an extractor
    #[inline]
    #[must_use]
    pub fn new(extractor: Extractor<'a>) -> Self {
        Self { extractor }
    }

    /// The underlying extractor
    #[inline]
    #[must_use]
    pub fn extractor(&self) -> &Extractor<'a> {
        &self.extractor
    }
}

impl RenderMacro for MacroRenderer<'_> {
    fn render(
        &self,
        text: &str,
        name: &str,
        position: usize,
        ctx: &MacroContext,
        _options: &RenderOptions,
    ) -> MacroResult<String> {
        let extraction = self.extractor.extract(text, name, position, ctx)?;
        extraction.macro_instance.execute(&extraction.ctx)
    }
}

impl std::fmt::Debug for MacroRenderer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroRenderer").finish_non_exhaustive()
    }
}

/// Caching decorator around [`MacroRenderer`]
///
/// Also owns the async placeholder path: async-configured macro types
/// short-circuit to a `<div>` with a client-side fetch URL before any
/// extraction happens.
pub struct CachingRenderer<'a> {
    inner: MacroRenderer<'a>,
    store: Arc<dyn CacheStore>,
    async_config: AsyncMacroConfig,
}

impl<'a> CachingRenderer<'a> {
    /// Wrap a plain renderer with a cache store
    #[must_use]
    pub fn new(inner: MacroRenderer<'a>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            store,
            async_config: AsyncMacroConfig::new(),
        }
    }

    /// Enable async placeholders for configured macro names
    #[must_use]
    pub fn with_async_config(mut self, config: AsyncMacroConfig) -> Self {
        self.async_config = config;
        self
    }

    fn wants_placeholder(&self, name: &str, ctx: &MacroContext, options: &RenderOptions) -> bool {
        self.async_config.is_async(name)
            && !ctx.preview
            && !options.force_synchronous
            && ctx.content_provider.cache_id().is_some()
    }
}

impl RenderMacro for CachingRenderer<'_> {
    fn render(
        &self,
        text: &str,
        name: &str,
        position: usize,
        ctx: &MacroContext,
        options: &RenderOptions,
    ) -> MacroResult<String> {
        if self.wants_placeholder(name, ctx, options) {
            return Ok(placeholder(ctx.content_provider.as_ref(), name, position));
        }

        let extraction = self
            .inner
            .extractor()
            .extract(text, name, position, ctx)?;

        let key = if options.dont_use_cache
            || !extraction.macro_instance.can_be_cached()
            || crosses_projects(ctx.content_provider.as_ref(), ctx.project.identifier())
        {
            None
        } else {
            cache_key(ctx.content_provider.as_ref(), name, position)
        };

        let mut store_degraded = false;
        if let Some(key) = &key {
            match self.store.get(key) {
                Ok(Some(cached)) => return Ok(cached),
                Ok(None) => {}
                Err(err) => {
                    // a cache outage must never fail rendering
                    tracing::warn!(%key, error = %err, "macro cache read failed, executing uncached");
                    store_degraded = true;
                }
            }
        }

        let output = extraction.macro_instance.execute(&extraction.ctx)?;

        if let (Some(key), false) = (&key, store_degraded) {
            if let Err(err) = self.store.put(key, &output) {
                tracing::warn!(%key, error = %err, "macro cache write failed");
            }
        }

        Ok(output)
    }
}

impl std::fmt::Debug for CachingRenderer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingRenderer").finish_non_exhaustive()
    }
}

/// Cache key for a macro occurrence, when the provider is persisted
#[must_use]
pub fn cache_key(provider: &dyn ContentProvider, name: &str, position: usize) -> Option<String> {
    provider.cache_id().map(|id| {
        format!(
            "macro-output/{id}/v{version}/{name}/{position}",
            version = provider.version()
        )
    })
}

/// Async placeholder markup for a deferred macro render
#[must_use]
fn placeholder(provider: &dyn ContentProvider, name: &str, position: usize) -> String {
    let id = provider.cache_id().unwrap_or_default();
    format!(
        "<div id=\"{name}-macro-{position}\" class=\"async-macro\" \
         data-url=\"/macro_data/{id}/{name}/{position}\"></div>"
    )
}
