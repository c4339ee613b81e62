//! The daily-history chart macro
//!
//! While the date range is still being materialized the macro renders a
//! progress message and runs a budgeted fill; once every past day is
//! cached it renders the full chart. Pending charts are never cacheable
//! at the output layer.

use crate::cache::DailyHistoryCache;
use crate::engine::{DailyHistoryChart, HistorySeries};
use chartmark_chart::{ChartRenderer, Color};
use chartmark_data::{CacheStore, Clock, MessagePublisher, QueryEngine, ValueKind, WallTimer};
use chartmark_macro::{
    Macro, MacroContext, MacroRegistry, MacroResult, Step, ValidationPipeline,
};
use chartmark_params::{resolve_all, ParameterDefinition, RawParams};
use chrono::NaiveDate;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

/// Registered name of the daily-history chart macro
pub const MACRO_NAME: &str = "daily-history-chart";

/// Collaborators the macro needs beyond the render context
#[derive(Clone)]
pub struct HistoryServices {
    /// Query engine for point-in-time evaluation
    pub engine: Arc<dyn QueryEngine>,
    /// Renderer for the assembled chart
    pub renderer: Arc<dyn ChartRenderer>,
    /// Store backing the per-date cache
    pub store: Arc<dyn CacheStore>,
    /// Publisher for fill continuations
    pub publisher: Arc<dyn MessagePublisher>,
    /// Source of "today"
    pub clock: Arc<dyn Clock>,
    /// Wall-clock budget for the in-render fill
    pub fill_budget: Duration,
}

struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

fn range_pipeline() -> ValidationPipeline<DateRange> {
    ValidationPipeline::new().step(
        Step::new("start_not_after_end", |r: &DateRange| Ok(r.start <= r.end))
            .message("start-date must not be after end-date"),
    )
}

/// A constructed daily-history chart macro instance
pub struct DailyHistoryChartMacro {
    chart: DailyHistoryChart,
    fill_budget: Duration,
    renderer: Arc<dyn ChartRenderer>,
    ready: bool,
}

impl DailyHistoryChartMacro {
    /// Parameter schema for the daily-history chart macro
    #[must_use]
    pub fn parameter_definitions() -> Vec<ParameterDefinition> {
        vec![
            ParameterDefinition::new("start_date")
                .required()
                .computable()
                .compatible(&[ValueKind::Date]),
            ParameterDefinition::new("end_date")
                .required()
                .computable()
                .compatible(&[ValueKind::Date]),
            ParameterDefinition::new("conditions"),
            ParameterDefinition::new("series").required().list_of(vec![
                ParameterDefinition::new("data").required(),
                ParameterDefinition::new("label"),
                ParameterDefinition::new("color").default_value("-1"),
            ]),
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
        services: &HistoryServices,
    ) -> MacroResult<Self> {
        let resolved = resolve_all(
            &Self::parameter_definitions(),
            raw,
            &ctx.resolve_context(),
        )?;
        let project = ctx.project.as_ref();

        // required parameters resolved above, the dates are present
        let start = resolved.date("start_date", project)?.unwrap_or_default();
        let end = resolved.date("end_date", project)?.unwrap_or_default();
        range_pipeline().validate(&DateRange { start, end })?;

        let conditions = resolved.text("conditions").map(ToString::to_string);
        let mut series = Vec::new();
        for element in resolved.series("series").unwrap_or(&[]) {
            let query = element.text("data").unwrap_or_default().to_string();
            series.push(HistorySeries {
                label: element
                    .text("label")
                    .map_or_else(|| query.clone(), ToString::to_string),
                query,
                color: Color::parse(element.text("color").unwrap_or("-1")),
            });
        }

        let namespace = namespace(ctx, conditions.as_deref(), &series, start, end);
        let chart = DailyHistoryChart::new(
            series,
            conditions,
            start,
            end,
            DailyHistoryCache::new(Arc::clone(&services.store), namespace),
            Arc::clone(&services.engine),
            Arc::clone(&services.clock),
            Arc::clone(&services.publisher),
        );
        let ready = chart.ready().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not read fill state, rendering as pending");
            false
        });

        Ok(Self {
            chart,
            fill_budget: services.fill_budget,
            renderer: Arc::clone(&services.renderer),
            ready,
        })
    }
}

impl std::fmt::Debug for DailyHistoryChartMacro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyHistoryChartMacro")
            .field("chart", &self.chart)
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

impl Macro for DailyHistoryChartMacro {
    fn name(&self) -> &str {
        MACRO_NAME
    }

    fn execute(&self, ctx: &MacroContext) -> MacroResult<String> {
        if !self.ready {
            let timer = WallTimer::start();
            self.chart.fill(self.fill_budget, &timer)?;
        }
        if self.chart.ready()? {
            let data = self.chart.load(ctx.project.as_ref())?;
            Ok(format!(
                "<div class=\"chartmark-chart\">{}</div>",
                self.renderer.render(&data)
            ))
        } else {
            Ok(format!(
                "<div class=\"chartmark-progress\">{}</div>",
                self.chart.progress()?
            ))
        }
    }

    fn can_be_cached(&self) -> bool {
        self.ready
    }
}

/// Cache namespace: provider identity plus a fingerprint of everything
/// that changes the computed values
fn namespace(
    ctx: &MacroContext,
    conditions: Option<&str>,
    series: &[HistorySeries],
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    let scope = ctx
        .content_provider
        .cache_id()
        .unwrap_or_else(|| format!("project-{}", ctx.project.identifier()));

    let mut hasher = DefaultHasher::new();
    conditions.hash(&mut hasher);
    start.hash(&mut hasher);
    end.hash(&mut hasher);
    for entry in series {
        entry.query.hash(&mut hasher);
    }
    format!("{scope}-{:016x}", hasher.finish())
}

/// Register the daily-history chart macro with a registry
pub fn register(registry: &MacroRegistry, services: HistoryServices) {
    registry.register(
        MACRO_NAME,
        Arc::new(move |ctx: &MacroContext, raw: &RawParams| {
            DailyHistoryChartMacro::construct(ctx, raw, &services)
                .map(|m| Box::new(m) as Box<dyn Macro>)
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FILL_TOPIC;
    use chartmark_chart::JsonRenderer;
    use chartmark_data::{MemoryPublisher, Row};
    use chartmark_test_utils::{date, CountingStore, FakeProject, FakeProvider, FixedClock, ScriptedQueryEngine};

    struct Fixture {
        services: HistoryServices,
        engine: ScriptedQueryEngine,
        publisher: Arc<MemoryPublisher>,
        store: Arc<CountingStore>,
    }

    fn fixture(fill_budget: Duration) -> Fixture {
        let engine = ScriptedQueryEngine::new();
        engine.script("open", vec![Row::new("x", 5.0)]);
        let publisher = Arc::new(MemoryPublisher::new());
        let store = Arc::new(CountingStore::new());
        let services = HistoryServices {
            engine: Arc::new(engine.clone()),
            renderer: Arc::new(JsonRenderer),
            store: Arc::clone(&store) as Arc<dyn CacheStore>,
            publisher: Arc::clone(&publisher) as Arc<dyn MessagePublisher>,
            clock: Arc::new(FixedClock::new(date(2024, 3, 11))),
            fill_budget,
        };
        Fixture {
            services,
            engine,
            publisher,
            store,
        }
    }

    fn context() -> MacroContext {
        MacroContext::new(
            Arc::new(FakeProject::new("alpha")),
            Arc::new(FakeProvider::persisted("page-1", "alpha")),
        )
    }

    fn raw(start: &str, end: &str) -> RawParams {
        let mut raw = RawParams::new();
        raw.insert("start-date", start);
        raw.insert("end-date", end);
        raw.insert_series(vec![RawParams::from_pairs([("data", "open")])]);
        raw
    }

    #[test]
    fn missing_dates_are_reported_together() {
        let fixture = fixture(Duration::from_secs(5));
        let mut params = RawParams::new();
        params.insert_series(vec![RawParams::from_pairs([("data", "open")])]);
        let err =
            DailyHistoryChartMacro::construct(&context(), &params, &fixture.services).unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameters start-date, end-date are required"
        );
    }

    #[test]
    fn inverted_range_fails_validation() {
        let fixture = fixture(Duration::from_secs(5));
        let err = DailyHistoryChartMacro::construct(
            &context(),
            &raw("2024-03-10", "2024-03-01"),
            &fixture.services,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "start-date must not be after end-date");
    }

    #[test]
    fn exhausted_budget_renders_progress_and_publishes_once() {
        let fixture = fixture(Duration::ZERO);
        let chart_macro = DailyHistoryChartMacro::construct(
            &context(),
            &raw("2024-03-01", "2024-03-10"),
            &fixture.services,
        )
        .unwrap();
        assert!(!chart_macro.can_be_cached());

        let output = chart_macro.execute(&context()).unwrap();
        assert_eq!(
            output,
            "<div class=\"chartmark-progress\">0 of 10 days computed</div>"
        );
        assert_eq!(fixture.publisher.count_for(FILL_TOPIC), 1);
        assert_eq!(fixture.store.entry_count(), 0);
    }

    #[test]
    fn completed_fill_renders_the_chart() {
        let fixture = fixture(Duration::from_secs(3600));
        let chart_macro = DailyHistoryChartMacro::construct(
            &context(),
            &raw("2024-03-08", "2024-03-10"),
            &fixture.services,
        )
        .unwrap();

        let output = chart_macro.execute(&context()).unwrap();
        assert!(output.starts_with("<div class=\"chartmark-chart\">"));
        assert!(output.contains("2024-03-08"));
        assert_eq!(fixture.store.entry_count(), 3);

        // a fresh construction over the filled cache is cacheable
        let again = DailyHistoryChartMacro::construct(
            &context(),
            &raw("2024-03-08", "2024-03-10"),
            &fixture.services,
        )
        .unwrap();
        assert!(again.can_be_cached());
        // rendering again recomputes nothing
        let calls = fixture.engine.call_count();
        again.execute(&context()).unwrap();
        assert_eq!(fixture.engine.call_count(), calls);
    }

    #[test]
    fn namespace_separates_providers_and_queries() {
        let ctx_a = context();
        let ctx_b = MacroContext::new(
            Arc::new(FakeProject::new("alpha")),
            Arc::new(FakeProvider::persisted("page-2", "alpha")),
        );
        let series = vec![HistorySeries {
            label: "Open".to_string(),
            query: "open".to_string(),
            color: Color::Undefined,
        }];
        let start = date(2024, 3, 1);
        let end = date(2024, 3, 10);

        let a = namespace(&ctx_a, None, &series, start, end);
        let b = namespace(&ctx_b, None, &series, start, end);
        assert_ne!(a, b);
        // same inputs fingerprint identically
        assert_eq!(a, namespace(&ctx_a, None, &series, start, end));
    }

    #[test]
    fn registry_round_trip() {
        let fixture = fixture(Duration::from_secs(3600));
        let registry = MacroRegistry::new();
        register(&registry, fixture.services.clone());

        let constructed = registry
            .construct(MACRO_NAME, &context(), &raw("2024-03-08", "2024-03-10"))
            .unwrap();
        assert_eq!(constructed.name(), MACRO_NAME);
    }
}
