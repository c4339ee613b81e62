//! Chartmark daily-history engine
//!
//! Charts over time need one value per series per calendar day, each a
//! point-in-time query against the external engine. Computing a long range
//! inside a render is too slow, so this crate materializes past days into
//! a per-date cache incrementally:
//!
//! - **Fill**: iterate the target range under a wall-clock budget; publish
//!   a single continuation message when the budget runs out so a worker
//!   resumes later. Writes are read-before-write, safe under at-least-once
//!   delivery.
//! - **State**: a date is uncached until materialized, then immutable.
//!   Today is never persisted, it is always recomputed live.
//! - **Macro**: `daily-history-chart` renders the full chart when the
//!   range is complete, otherwise an "N of M days computed" progress
//!   message.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod engine;
pub mod error;
pub mod macros;

pub use cache::DailyHistoryCache;
pub use engine::{DailyHistoryChart, FillOutcome, HistorySeries, FILL_TOPIC};
pub use error::{HistoryError, HistoryResult};
pub use macros::{register, DailyHistoryChartMacro, HistoryServices, MACRO_NAME};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
