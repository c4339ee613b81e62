//! Chartmark macro engine
//!
//! Locates `{{ macro-name … }}` blocks inside free-form document text,
//! resolves their typed parameters, validates them, and executes them,
//! optionally through a content-addressed output cache and an async
//! placeholder path for expensive macros.
//!
//! # Control flow
//!
//! ```text
//! raw text → Extractor (N-th block of a type) → parameter map
//!          → factory from MacroRegistry → ValidationPipeline
//!          → Macro::execute → CachingRenderer (keyed by provider identity
//!            + version + macro type + ordinal position) → output
//! ```
//!
//! One bad macro must never fail a whole document render:
//! [`extract::Extractor::extract_and_generate`] swallows processing errors
//! and yields an empty string.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod registry;
pub mod render;

pub use config::AsyncMacroConfig;
pub use context::MacroContext;
pub use error::{MacroError, MacroResult, SYNTAX_MESSAGE};
pub use extract::Extractor;
pub use pipeline::{Step, ValidationPipeline};
pub use registry::{Macro, MacroFactory, MacroRegistry};
pub use render::{CachingRenderer, MacroRenderer, RenderMacro, RenderOptions};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
