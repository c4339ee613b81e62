//! Chartmark data boundary
//!
//! Interfaces for every external collaborator the macro/chart engine
//! consumes, plus the in-memory implementations shipped with the engine:
//!
//! - **Query engine**: parse a query string, evaluate it (optionally "as of"
//!   a past date), narrow it with extra conditions.
//! - **Project**: locale-aware date/number formatting, project variables,
//!   card display names.
//! - **Content provider**: the document that owns a macro instance; its
//!   identity and version are the cache-key material.
//! - **Cache store**: plain key-value get/put that must tolerate outages.
//! - **Message publisher**: fire-and-forget continuation signals.
//!
//! The engine never talks to a database, HTTP layer, or broker directly;
//! everything goes through these seams.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod card;
pub mod clock;
pub mod error;
pub mod project;
pub mod property;
pub mod provider;
pub mod publish;
pub mod query;
pub mod store;

pub use card::CardContext;
pub use clock::{Clock, SystemClock, Timer, WallTimer};
pub use error::{CacheStoreError, QueryError};
pub use project::{Project, ProjectRegistry};
pub use property::{PropertyDefinition, TypedValue, ValueKind};
pub use provider::{crosses_projects, ContentProvider};
pub use publish::{MemoryPublisher, MessagePublisher};
pub use query::{DataQuery, QueryEngine, QueryOptions, Row};
pub use store::{CacheStore, MokaStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
