//! Execution context for macro rendering

use chartmark_data::{CardContext, ContentProvider, Project};
use chartmark_params::ResolveContext;
use std::sync::Arc;

/// Everything a macro needs to resolve parameters and execute
///
/// Constructed once per render pass. The project may be swapped for a new
/// context when a macro carries an explicit `project:` parameter.
#[derive(Clone)]
pub struct MacroContext {
    /// Project the macro charts against
    pub project: Arc<dyn Project>,
    /// Document that owns the macro (cache scope and versioning unit)
    pub content_provider: Arc<dyn ContentProvider>,
    /// Card being rendered, when inside a card view
    pub card: Option<Arc<dyn CardContext>>,
    /// Whether this is a preview render (always synchronous, never cached)
    pub preview: bool,
}

impl MacroContext {
    /// Create a context for a project and content provider
    #[must_use]
    pub fn new(project: Arc<dyn Project>, content_provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            project,
            content_provider,
            card: None,
            preview: false,
        }
    }

    /// Attach the card currently being rendered
    #[must_use]
    pub fn with_card(mut self, card: Arc<dyn CardContext>) -> Self {
        self.card = Some(card);
        self
    }

    /// Mark this context as a preview render
    #[must_use]
    pub fn preview(mut self) -> Self {
        self.preview = true;
        self
    }

    /// The same context reporting on a different project
    #[must_use]
    pub fn with_project(&self, project: Arc<dyn Project>) -> Self {
        Self {
            project,
            content_provider: Arc::clone(&self.content_provider),
            card: self.card.clone(),
            preview: self.preview,
        }
    }

    /// Parameter-resolution view of this context
    #[must_use]
    pub fn resolve_context(&self) -> ResolveContext<'_> {
        ResolveContext {
            project: self.project.as_ref(),
            card: self.card.as_deref(),
        }
    }
}

impl std::fmt::Debug for MacroContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroContext")
            .field("project", &self.project.identifier())
            .field("provider", &self.content_provider.cache_id())
            .field("card", &self.card.as_ref().map(|c| c.number()))
            .field("preview", &self.preview)
            .finish()
    }
}
