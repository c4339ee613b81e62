//! Content provider seam
//!
//! The content provider is the document (card, wiki page) that embeds a
//! macro. Its identity and version pin cached macro output to an exact
//! revision: any edit bumps the version and invalidates every macro cache
//! for that document.

/// The entity that owns and caches a macro's rendered output
pub trait ContentProvider: Send + Sync {
    /// Stable cache identity, or `None` until the provider is persisted
    ///
    /// Unpersisted providers have no stable id/version, so their macro
    /// output is never cached.
    fn cache_id(&self) -> Option<String>;

    /// Monotonically increasing revision number
    fn version(&self) -> u64;

    /// Identifiers of every project this provider's content reports on
    ///
    /// When any of them differs from the host project, caching is disabled
    /// to avoid serving stale cross-project data.
    fn rendered_projects(&self) -> Vec<String>;
}

/// Whether rendering for `provider` crosses out of `host_project`
#[must_use]
pub fn crosses_projects(provider: &dyn ContentProvider, host_project: &str) -> bool {
    provider
        .rendered_projects()
        .iter()
        .any(|p| p != host_project)
}
