//! Chart assembly
//!
//! A [`Chart`] owns its configured series and turns query results into
//! [`ChartData`]: derive the x-axis labels, bucket each series' rows onto
//! them, then run the value pipeline per series: cumulate, combine,
//! down-from, trend.

use crate::error::{ChartError, ChartResult};
use crate::labels::{derive_labels, LabelOptions, LabelSet, NumericTieBreak};
use crate::series::{CombineMode, Series};
use crate::trend::trend_values;
use chartmark_data::{
    Project, PropertyDefinition, QueryEngine, QueryOptions, Row, ValueKind,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// Chart-level configuration shared by all series
#[derive(Debug, Clone, Default)]
pub struct ChartConfig {
    /// Extra conditions merged into every series query
    pub conditions: Option<String>,
    /// Whether series values accumulate left to right
    pub cumulative: bool,
    /// Explicit first x-axis label (date axes)
    pub x_labels_start: Option<String>,
    /// Explicit last x-axis label (date axes)
    pub x_labels_end: Option<String>,
    /// Spelling choice for numerically equal axis keys
    pub tie_break: NumericTieBreak,
}

/// One fully computed series, ready to serialize
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesData {
    /// Deduplicated display label
    pub label: String,
    /// Final plotted values, one per axis label
    pub values: Vec<f64>,
    /// Resolved hex color
    pub color: String,
    /// Combine mode the values were computed under
    pub combine: CombineMode,
    /// Trend-line values when a trend was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Vec<f64>>,
}

/// The assembled chart: axis labels plus computed series
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartData {
    /// X-axis labels in axis order
    pub labels: Vec<String>,
    /// Computed series in author order
    pub series: Vec<SeriesData>,
}

/// A configured chart, not yet loaded with data
#[derive(Debug, Clone)]
pub struct Chart {
    config: ChartConfig,
    series: Vec<Series>,
}

impl Chart {
    /// Create a chart, deduplicating series labels
    ///
    /// Duplicate labels get the lowest free ` (n)` suffix, so three series
    /// labeled `A` become `A`, `A (1)`, `A (2)`.
    ///
    /// # Errors
    /// Fails when a series carries `down-from` without the chart being
    /// cumulative.
    pub fn new(config: ChartConfig, mut series: Vec<Series>) -> ChartResult<Self> {
        for entry in &series {
            if entry.down_from.is_some() && !config.cumulative {
                return Err(ChartError::DownFromRequiresCumulative);
            }
        }

        let mut used: HashSet<String> = HashSet::new();
        for entry in &mut series {
            if used.contains(&entry.label) {
                let mut n = 1;
                while used.contains(&format!("{} ({n})", entry.label)) {
                    n += 1;
                }
                entry.label = format!("{} ({n})", entry.label);
            }
            used.insert(entry.label.clone());
        }

        Ok(Self { config, series })
    }

    /// The configured series, after label deduplication
    #[inline]
    #[must_use]
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Chart-level configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Evaluate every series and assemble the chart data
    ///
    /// # Errors
    /// Propagates query failures and data-consistency violations
    /// (total smaller than its overlays, bad date boundaries).
    pub fn load(&self, engine: &dyn QueryEngine, project: &dyn Project) -> ChartResult<ChartData> {
        self.load_as_of(engine, project, None)
    }

    /// Evaluate every series as of a past date and assemble the chart data
    ///
    /// # Errors
    /// As for [`Chart::load`].
    pub fn load_as_of(
        &self,
        engine: &dyn QueryEngine,
        project: &dyn Project,
        as_of: Option<NaiveDate>,
    ) -> ChartResult<ChartData> {
        let options = QueryOptions {
            conditions: self.config.conditions.clone(),
        };

        let mut property: Option<PropertyDefinition> = None;
        let mut rows_per_series: Vec<Vec<Row>> = Vec::with_capacity(self.series.len());
        for entry in &self.series {
            let query = engine.parse(&entry.query, &options)?;
            if property.is_none() {
                property = query.column_property();
            }
            rows_per_series.push(query.values(as_of)?);
        }
        let property =
            property.unwrap_or_else(|| PropertyDefinition::new("value", ValueKind::Text));

        let labels = self.derive_axis(&rows_per_series, &property, project)?;
        let raw: Vec<Vec<f64>> = rows_per_series
            .iter()
            .map(|rows| bucket(rows, &labels))
            .collect();

        self.compute(&labels, raw)
    }

    fn derive_axis(
        &self,
        rows_per_series: &[Vec<Row>],
        property: &PropertyDefinition,
        project: &dyn Project,
    ) -> ChartResult<LabelSet> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut keys: Vec<String> = Vec::new();
        for rows in rows_per_series {
            for row in rows {
                if seen.insert(row.key.as_str()) {
                    keys.push(row.key.clone());
                }
            }
        }
        derive_labels(
            &keys,
            &LabelOptions {
                property,
                project,
                start: self.config.x_labels_start.as_deref(),
                end: self.config.x_labels_end.as_deref(),
                tie_break: self.config.tie_break,
            },
        )
    }

    fn compute(&self, labels: &LabelSet, raw: Vec<Vec<f64>>) -> ChartResult<ChartData> {
        let mut values: Vec<Vec<f64>> = raw;
        if self.config.cumulative {
            for series_values in &mut values {
                let mut running = 0.0;
                for value in series_values.iter_mut() {
                    running += *value;
                    *value = running;
                }
            }
        }

        // overlays subtract from every total series, position by position
        let overlay_sums: Vec<f64> = (0..labels.len())
            .map(|i| {
                self.series
                    .iter()
                    .zip(&values)
                    .filter(|(s, _)| s.combine.is_overlay())
                    .map(|(_, v)| v[i])
                    .sum()
            })
            .collect();

        for (entry, series_values) in self.series.iter().zip(&mut values) {
            if entry.combine == CombineMode::Total {
                for (i, value) in series_values.iter_mut().enumerate() {
                    let remainder = *value - overlay_sums[i];
                    if remainder < 0.0 {
                        return Err(ChartError::TotalLessThanOverlays {
                            label: labels.labels()[i].clone(),
                        });
                    }
                    *value = remainder;
                }
            }
            if let Some(baseline) = entry.down_from {
                for value in series_values.iter_mut() {
                    *value = baseline - *value;
                }
            }
        }

        let mut rotation = 0;
        let mut computed = Vec::with_capacity(self.series.len());
        for (entry, series_values) in self.series.iter().zip(values) {
            let color = entry.color.resolve(rotation);
            if entry.color.is_undefined() {
                rotation += 1;
            }
            let trend = entry
                .trend
                .as_ref()
                .map(|spec| trend_values(&series_values, spec));
            computed.push(SeriesData {
                label: entry.label.clone(),
                values: series_values,
                color,
                combine: entry.combine,
                trend,
            });
        }

        Ok(ChartData {
            labels: labels.labels().to_vec(),
            series: computed,
        })
    }
}

/// Bucket rows onto axis positions, summing keys that share a position
fn bucket(rows: &[Row], labels: &LabelSet) -> Vec<f64> {
    let mut values = vec![0.0; labels.len()];
    for row in rows {
        if let Some(pos) = labels.position(&row.key) {
            values[pos] += row.value;
        }
    }
    values
}
