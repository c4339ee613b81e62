//! Project seam
//!
//! A project supplies locale formatting, project variables, and card
//! display names. Charts always format dates and numbers through the
//! project they report on, which may differ from the host project when a
//! macro carries an explicit `project` parameter.

use crate::property::TypedValue;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// The project a macro renders against
pub trait Project: Send + Sync {
    /// Unique project identifier
    fn identifier(&self) -> &str;

    /// Parse a date string in the project's date format
    ///
    /// # Errors
    /// Returns the unparseable input so callers can name it in their own
    /// error message.
    fn parse_date(&self, raw: &str) -> Result<NaiveDate, String>;

    /// Format a date in the project's date format
    fn format_date(&self, date: NaiveDate) -> String;

    /// Format a number at the project's numeric precision
    fn format_number(&self, value: f64) -> String;

    /// The project's numeric precision (decimal places)
    fn precision(&self) -> u32;

    /// Look up a project variable by name (case-insensitive)
    fn variable(&self, name: &str) -> Option<TypedValue>;

    /// Display name of a card, by card number
    fn card_name(&self, number: u64) -> Option<String>;
}

/// Registry resolving project identifiers to projects
///
/// Used when a macro's `project` parameter overrides the host project.
/// Built once at startup and threaded by reference; there is no ambient
/// global.
#[derive(Default)]
pub struct ProjectRegistry {
    projects: RwLock<HashMap<String, Arc<dyn Project>>>,
}

impl ProjectRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project under its identifier
    pub fn register(&self, project: Arc<dyn Project>) {
        self.projects
            .write()
            .insert(project.identifier().to_string(), project);
    }

    /// Look up a project by identifier
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<Arc<dyn Project>> {
        self.projects.read().get(identifier).cloned()
    }

    /// Number of registered projects
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.read().len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.read().is_empty()
    }
}

impl std::fmt::Debug for ProjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectRegistry")
            .field("len", &self.len())
            .finish()
    }
}
