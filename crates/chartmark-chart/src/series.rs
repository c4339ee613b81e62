//! Chart series
//!
//! One series per plotted line: its own query, a combine mode deciding how
//! it relates to the other series, and optional cosmetics (label, color,
//! trend line, down-from baseline).

use crate::color::Color;
use crate::error::{ChartError, ChartResult};
use crate::trend::{TrendIgnore, TrendScope, TrendSpec};
use chartmark_data::ValueKind;
use chartmark_params::{ParameterDefinition, ResolvedParams};
use serde::Serialize;

/// How a series combines with the others on the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombineMode {
    /// Carries the whole; overlay series are subtracted from it
    Total,
    /// Overlay rendered above the remainder
    OverlayTop,
    /// Overlay rendered below the remainder
    #[default]
    OverlayBottom,
}

impl CombineMode {
    /// Parse the external form
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "total" => Some(Self::Total),
            "overlay-top" => Some(Self::OverlayTop),
            "overlay-bottom" => Some(Self::OverlayBottom),
            _ => None,
        }
    }

    /// Whether this series is an overlay
    #[inline]
    #[must_use]
    pub fn is_overlay(self) -> bool {
        matches!(self, Self::OverlayTop | Self::OverlayBottom)
    }
}

/// One configured chart series
#[derive(Debug, Clone)]
pub struct Series {
    /// Display label; defaults to the query text
    pub label: String,
    /// The query producing this series' values
    pub query: String,
    /// Combine mode relative to the other series
    pub combine: CombineMode,
    /// Author-chosen color, or undefined for rotation assignment
    pub color: Color,
    /// Baseline to count down from, only valid on cumulative charts
    pub down_from: Option<f64>,
    /// Trend-line settings when a trend was requested
    pub trend: Option<TrendSpec>,
}

impl Series {
    /// Parameter schema for one `series` element
    #[must_use]
    pub fn parameter_definitions() -> Vec<ParameterDefinition> {
        vec![
            ParameterDefinition::new("data").required(),
            ParameterDefinition::new("label"),
            ParameterDefinition::new("color").default_value("-1"),
            ParameterDefinition::new("combine")
                .default_value("overlay-bottom")
                .allowed_values(["total", "overlay-top", "overlay-bottom"]),
            ParameterDefinition::new("down_from")
                .computable()
                .compatible(&[ValueKind::Numeric, ValueKind::Card]),
            ParameterDefinition::new("trend").default_value("false"),
            ParameterDefinition::new("trend_scope").default_value("all"),
            ParameterDefinition::new("trend_ignore").default_value("zeroes-at-end"),
        ]
    }

    /// Build a series from a resolved parameter element
    ///
    /// # Errors
    /// Fails when `down-from` is present without `cumulative`, or when a
    /// numeric/flag parameter does not convert.
    pub fn from_resolved(params: &ResolvedParams, cumulative: bool) -> ChartResult<Self> {
        let query = params
            .text("data")
            .ok_or_else(|| ChartError::UnknownSeries("<missing data>".to_string()))?
            .to_string();
        let label = params
            .text("label")
            .map_or_else(|| query.clone(), ToString::to_string);

        let combine = params
            .text("combine")
            .and_then(CombineMode::parse)
            .unwrap_or_default();

        let color = Color::parse(params.text("color").unwrap_or("-1"));

        let down_from = params.numeric("down_from")?;
        if down_from.is_some() && !cumulative {
            return Err(ChartError::DownFromRequiresCumulative);
        }

        let trend = if params.flag("trend")?.unwrap_or(false) {
            Some(TrendSpec {
                scope: params
                    .text("trend_scope")
                    .and_then(TrendScope::parse)
                    .unwrap_or(TrendScope::All),
                ignore: params
                    .text("trend_ignore")
                    .and_then(TrendIgnore::parse)
                    .unwrap_or(TrendIgnore::ZeroesAtEnd),
            })
        } else {
            None
        };

        Ok(Self {
            label,
            query,
            combine,
            color,
            down_from,
            trend,
        })
    }
}
