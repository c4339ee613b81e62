//! Chartmark parameter subsystem
//!
//! Declarative schemas for macro parameters and a generic resolver that
//! binds raw string parameters to them.
//!
//! # Core Operations
//!
//! - **Declare**: each macro type lists its [`ParameterDefinition`]s as an
//!   explicit, ordered descriptor list.
//! - **Resolve**: [`resolve_all`] walks the descriptors against a raw
//!   parameter map, applying defaults, allowed-value whitelists, and the
//!   computed forms (`THIS CARD.<property>`, `(project variable)`).
//! - **Convert**: typed accessors on [`ResolvedParams`] turn resolved
//!   strings into dates, numbers, and flags before any business
//!   validation runs.
//!
//! External parameter names are hyphenated (`start-date`); internal names
//! are underscored (`start_date`). The mapping is mechanical and applied
//! at the resolver boundary only.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod definition;
pub mod error;
pub mod resolver;
pub mod value;

pub use definition::{DefaultValue, ParameterDefinition, Requirement};
pub use error::{ParameterError, ParameterResult};
pub use resolver::{resolve_all, ResolveContext};
pub use value::{external_name, internal_name, RawParams, RawValue, ResolvedParams, ResolvedValue};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
