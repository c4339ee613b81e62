//! Chart rendering seam
//!
//! Assembled [`ChartData`] goes out through a renderer. The default emits
//! the chart as JSON for a client-side charting library; pixel output is a
//! different renderer behind the same trait.

use crate::chart::ChartData;

/// Renders assembled chart data into embeddable markup
pub trait ChartRenderer: Send + Sync {
    /// Render the chart
    fn render(&self, data: &ChartData) -> String;
}

/// Renderer emitting the chart data as pretty-printed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ChartRenderer for JsonRenderer {
    fn render(&self, data: &ChartData) -> String {
        // ChartData serialization cannot fail: no maps with non-string keys
        serde_json::to_string_pretty(data).unwrap_or_default()
    }
}
