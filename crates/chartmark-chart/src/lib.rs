//! Chartmark chart data model
//!
//! Series-based charts over the external query engine:
//!
//! - **Series**: one plotted line/bar/area, backed by its own query, with a
//!   combine mode (`total`, `overlay-top`, `overlay-bottom`), optional
//!   down-from baseline, color, and trend-line settings.
//! - **Value pipeline**: `combine(cumulate(raw_per_x_values))`, then the
//!   down-from inversion for burn-down charts.
//! - **X-axis labels**: derived per the grouping property's kind: numeric
//!   with precision reconciliation, date with calendar fill-in, card as
//!   `#N Name`, tree with ancestor expansion.
//! - **Rendering**: a pluggable [`renderer::ChartRenderer`]; the default
//!   serializes the assembled chart data as JSON. Pixel output is someone
//!   else's job.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod chart;
pub mod color;
pub mod error;
pub mod labels;
pub mod macros;
pub mod renderer;
pub mod series;
pub mod trend;

pub use chart::{Chart, ChartConfig, ChartData, SeriesData};
pub use color::Color;
pub use error::{ChartError, ChartResult};
pub use labels::{derive_labels, LabelOptions, LabelSet, NumericTieBreak};
pub use macros::{register, DataSeriesChartMacro, MACRO_NAME};
pub use renderer::{ChartRenderer, JsonRenderer};
pub use series::{CombineMode, Series};
pub use trend::{trend_values, TrendIgnore, TrendScope, TrendSpec};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
