//! The data-series chart macro
//!
//! Construction resolves and validates parameters, parses every series
//! query once to learn whether the macro is cacheable, and builds the
//! [`Chart`]. Execution evaluates the queries and hands the assembled
//! data to the renderer.

use crate::chart::{Chart, ChartConfig};
use crate::error::ChartError;
use crate::renderer::ChartRenderer;
use crate::series::Series;
use chartmark_data::{QueryEngine, QueryOptions, ValueKind};
use chartmark_macro::{
    Macro, MacroContext, MacroRegistry, MacroResult, Step, ValidationPipeline,
};
use chartmark_params::{resolve_all, ParameterDefinition, RawParams};
use std::sync::Arc;

/// Registered name of the chart macro
pub const MACRO_NAME: &str = "data-series-chart";

struct ChartSettings {
    width: f64,
    height: f64,
}

fn settings_pipeline() -> ValidationPipeline<ChartSettings> {
    ValidationPipeline::new()
        .step(
            Step::new("chart_width_positive", |s: &ChartSettings| {
                Ok(s.width > 0.0)
            })
            .message("chart-width must be a positive number"),
        )
        .step(
            Step::new("chart_height_positive", |s: &ChartSettings| {
                Ok(s.height > 0.0)
            })
            .message("chart-height must be a positive number"),
        )
}

/// A constructed chart macro instance
pub struct DataSeriesChartMacro {
    chart: Chart,
    width: f64,
    height: f64,
    time_dependent: bool,
    engine: Arc<dyn QueryEngine>,
    renderer: Arc<dyn ChartRenderer>,
}

impl DataSeriesChartMacro {
    /// Parameter schema for the chart macro
    #[must_use]
    pub fn parameter_definitions() -> Vec<ParameterDefinition> {
        vec![
            ParameterDefinition::new("conditions"),
            ParameterDefinition::new("cumulative").default_value("false"),
            ParameterDefinition::new("x_labels_start")
                .computable()
                .compatible(&[ValueKind::Date]),
            ParameterDefinition::new("x_labels_end")
                .computable()
                .compatible(&[ValueKind::Date]),
            ParameterDefinition::new("chart_width").default_value("600"),
            ParameterDefinition::new("chart_height").default_value("400"),
            ParameterDefinition::new("series")
                .required()
                .list_of(Series::parameter_definitions()),
        ]
    }

    /// Construct the macro from raw markup parameters
    ///
    /// # Errors
    /// Parameter resolution, conversion, and validation failures all
    /// surface as [`chartmark_macro::MacroError`].
    pub fn construct(
        ctx: &MacroContext,
        raw: &RawParams,
        engine: Arc<dyn QueryEngine>,
        renderer: Arc<dyn ChartRenderer>,
    ) -> MacroResult<Self> {
        let resolved = resolve_all(
            &Self::parameter_definitions(),
            raw,
            &ctx.resolve_context(),
        )?;

        let settings = ChartSettings {
            width: resolved.numeric("chart_width")?.unwrap_or(600.0),
            height: resolved.numeric("chart_height")?.unwrap_or(400.0),
        };
        settings_pipeline().validate(&settings)?;

        let cumulative = resolved.flag("cumulative")?.unwrap_or(false);
        let config = ChartConfig {
            conditions: resolved.text("conditions").map(ToString::to_string),
            cumulative,
            x_labels_start: resolved.text("x_labels_start").map(ToString::to_string),
            x_labels_end: resolved.text("x_labels_end").map(ToString::to_string),
            tie_break: crate::labels::NumericTieBreak::default(),
        };

        let elements = resolved.series("series").unwrap_or(&[]);
        let mut series = Vec::with_capacity(elements.len());
        for element in elements {
            series.push(Series::from_resolved(element, cumulative)?);
        }
        let chart = Chart::new(config, series)?;

        let options = QueryOptions {
            conditions: chart.config().conditions.clone(),
        };
        let mut time_dependent = false;
        for entry in chart.series() {
            let query = engine.parse(&entry.query, &options).map_err(ChartError::from)?;
            time_dependent |= query.is_time_dependent();
        }

        Ok(Self {
            chart,
            width: settings.width,
            height: settings.height,
            time_dependent,
            engine,
            renderer,
        })
    }
}

impl std::fmt::Debug for DataSeriesChartMacro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSeriesChartMacro")
            .field("chart", &self.chart)
            .field("time_dependent", &self.time_dependent)
            .finish_non_exhaustive()
    }
}

impl Macro for DataSeriesChartMacro {
    fn name(&self) -> &str {
        MACRO_NAME
    }

    fn execute(&self, ctx: &MacroContext) -> MacroResult<String> {
        let data = self
            .chart
            .load(self.engine.as_ref(), ctx.project.as_ref())?;
        let body = self.renderer.render(&data);
        Ok(format!(
            "<div class=\"chartmark-chart\" style=\"width:{}px;height:{}px\">{body}</div>",
            self.width, self.height
        ))
    }

    fn can_be_cached(&self) -> bool {
        !self.time_dependent
    }
}

/// Register the chart macro with a registry
pub fn register(
    registry: &MacroRegistry,
    engine: Arc<dyn QueryEngine>,
    renderer: Arc<dyn ChartRenderer>,
) {
    registry.register(
        MACRO_NAME,
        Arc::new(move |ctx: &MacroContext, raw: &RawParams| {
            DataSeriesChartMacro::construct(
                ctx,
                raw,
                Arc::clone(&engine),
                Arc::clone(&renderer),
            )
            .map(|m| Box::new(m) as Box<dyn Macro>)
        }),
    );
}
