//! Time-boxed, resumable fill engine
//!
//! A daily-history chart needs one value per series per calendar day.
//! Past days are materialized through point-in-time queries and cached;
//! the fill iterates the target range under a wall-clock budget and, when
//! the budget runs out, publishes a single continuation message so a
//! worker can resume where it stopped. Today is always computed live.

use crate::cache::DailyHistoryCache;
use crate::error::HistoryResult;
use chartmark_chart::{ChartData, Color, CombineMode, SeriesData};
use chartmark_data::{
    Clock, DataQuery, MessagePublisher, Project, QueryEngine, QueryOptions, Timer,
};
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use std::time::Duration;

/// Topic the fill publishes its continuation requests to
pub const FILL_TOPIC: &str = "daily-history-fill";

/// One daily-history series: a query plus display settings
#[derive(Debug, Clone)]
pub struct HistorySeries {
    /// Display label
    pub label: String,
    /// Query evaluated as-of each day
    pub query: String,
    /// Author-chosen color, or undefined for rotation assignment
    pub color: Color,
}

/// Result of one `fill` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Every target date is now cached
    Completed {
        /// Dates computed by this invocation (cached skips not counted)
        computed: usize,
    },
    /// The budget ran out; a continuation was published
    Suspended {
        /// Target dates processed before the budget ran out
        completed: usize,
        /// Target dates still to process
        remaining: usize,
    },
}

/// The daily-history engine for one configured chart
pub struct DailyHistoryChart {
    series: Vec<HistorySeries>,
    conditions: Option<String>,
    start: NaiveDate,
    end: NaiveDate,
    cache: DailyHistoryCache,
    engine: Arc<dyn QueryEngine>,
    clock: Arc<dyn Clock>,
    publisher: Arc<dyn MessagePublisher>,
}

impl DailyHistoryChart {
    /// Create the engine for a configured chart
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        series: Vec<HistorySeries>,
        conditions: Option<String>,
        start: NaiveDate,
        end: NaiveDate,
        cache: DailyHistoryCache,
        engine: Arc<dyn QueryEngine>,
        clock: Arc<dyn Clock>,
        publisher: Arc<dyn MessagePublisher>,
    ) -> Self {
        Self {
            series,
            conditions,
            start,
            end,
            cache,
            engine,
            clock,
            publisher,
        }
    }

    /// The cache this engine fills
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &DailyHistoryCache {
        &self.cache
    }

    /// Dates the batch fill must materialize: start through
    /// `min(end, today - 1)`, today itself excluded
    #[must_use]
    pub fn target_dates(&self) -> Vec<NaiveDate> {
        let today = self.clock.today();
        let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
            return Vec::new();
        };
        date_range(self.start, self.end.min(yesterday))
    }

    /// Materialize uncached target dates until done or out of budget
    ///
    /// The budget is checked before each date, not preemptively. On
    /// exhaustion exactly one continuation message goes out and the
    /// remaining dates stay uncached.
    ///
    /// # Errors
    /// Query and store failures propagate; dates cached before the failure
    /// stay cached.
    pub fn fill(&self, budget: Duration, timer: &dyn Timer) -> HistoryResult<FillOutcome> {
        let targets = self.target_dates();
        let queries = self.parse_queries()?;
        let mut computed = 0;

        for (position, day) in targets.iter().enumerate() {
            if timer.elapsed() >= budget {
                let remaining = targets.len() - position;
                tracing::info!(
                    namespace = self.cache.namespace(),
                    completed = position,
                    remaining,
                    "fill budget exhausted, publishing continuation"
                );
                self.publisher.publish(
                    FILL_TOPIC,
                    &serde_json::json!({ "namespace": self.cache.namespace() }).to_string(),
                );
                return Ok(FillOutcome::Suspended {
                    completed: position,
                    remaining,
                });
            }
            if self.cache.get(*day)?.is_some() {
                continue;
            }
            let values = day_values(&queries, *day)?;
            self.cache.put_if_absent(*day, &values)?;
            computed += 1;
        }

        Ok(FillOutcome::Completed { computed })
    }

    /// Whether the chart can render in full
    ///
    /// True once the start date is not in the future and every target date
    /// is cached. Today is never consulted in the store.
    ///
    /// # Errors
    /// Store failures propagate.
    pub fn ready(&self) -> HistoryResult<bool> {
        if self.start > self.clock.today() {
            return Ok(false);
        }
        let targets = self.target_dates();
        let cached = self.cache.cached_dates(&targets)?;
        Ok(cached.len() == targets.len())
    }

    /// Human-readable fill progress
    ///
    /// # Errors
    /// Store failures propagate.
    pub fn progress(&self) -> HistoryResult<String> {
        let targets = self.target_dates();
        let cached = self.cache.cached_dates(&targets)?;
        Ok(format!("{} of {} days computed", cached.len(), targets.len()))
    }

    /// Assemble the chart data: cached values for past days, live for today
    ///
    /// # Errors
    /// Query and store failures propagate.
    pub fn load(&self, project: &dyn Project) -> HistoryResult<ChartData> {
        let today = self.clock.today();
        let days = date_range(self.start, self.end.min(today));
        let mut queries: Option<Vec<Box<dyn DataQuery>>> = None;

        let mut per_series: Vec<Vec<f64>> = vec![Vec::with_capacity(days.len()); self.series.len()];
        for day in &days {
            let cached = if *day < today { self.cache.get(*day)? } else { None };
            let values = match cached {
                Some(values) if values.len() == self.series.len() => values,
                _ => {
                    if queries.is_none() {
                        queries = Some(self.parse_queries()?);
                    }
                    // queries was just populated above
                    day_values(queries.as_ref().unwrap_or(&Vec::new()), *day)?
                }
            };
            for (column, value) in per_series.iter_mut().zip(values) {
                column.push(value);
            }
        }

        let mut rotation = 0;
        let series = self
            .series
            .iter()
            .zip(per_series)
            .map(|(entry, values)| {
                let color = entry.color.resolve(rotation);
                if entry.color.is_undefined() {
                    rotation += 1;
                }
                SeriesData {
                    label: entry.label.clone(),
                    values,
                    color,
                    combine: CombineMode::OverlayBottom,
                    trend: None,
                }
            })
            .collect();

        Ok(ChartData {
            labels: days.iter().map(|d| project.format_date(*d)).collect(),
            series,
        })
    }

    fn parse_queries(&self) -> HistoryResult<Vec<Box<dyn DataQuery>>> {
        let options = QueryOptions {
            conditions: self.conditions.clone(),
        };
        self.series
            .iter()
            .map(|entry| Ok(self.engine.parse(&entry.query, &options)?))
            .collect()
    }
}

impl std::fmt::Debug for DailyHistoryChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyHistoryChart")
            .field("namespace", &self.cache.namespace())
            .field("start", &self.start)
            .field("end", &self.end)
            .field("series", &self.series.len())
            .finish()
    }
}

/// One value per query, evaluated as of a day
fn day_values(queries: &[Box<dyn DataQuery>], day: NaiveDate) -> HistoryResult<Vec<f64>> {
    queries
        .iter()
        .map(|query| {
            let rows = query.values(Some(day))?;
            Ok(rows.iter().map(|row| row.value).sum())
        })
        .collect()
}

fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        day += chrono::Duration::days(1);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartmark_data::{CacheStore, MemoryPublisher, Row};
    use chartmark_test_utils::{
        date, CountingStore, FakeProject, FixedClock, ScriptedQueryEngine, StepTimer,
    };
    use pretty_assertions::assert_eq;

    fn engine_under_test(
        store: &Arc<CountingStore>,
        publisher: &Arc<MemoryPublisher>,
        query_engine: &ScriptedQueryEngine,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> DailyHistoryChart {
        DailyHistoryChart::new(
            vec![HistorySeries {
                label: "Open".to_string(),
                query: "open".to_string(),
                color: Color::Undefined,
            }],
            None,
            start,
            end,
            DailyHistoryCache::new(Arc::clone(store) as Arc<dyn CacheStore>, "page-1-abc"),
            Arc::new(query_engine.clone()),
            Arc::new(FixedClock::new(today)),
            Arc::clone(publisher) as Arc<dyn MessagePublisher>,
        )
    }

    fn scripted_engine() -> ScriptedQueryEngine {
        let engine = ScriptedQueryEngine::new();
        engine.script("open", vec![Row::new("ignored", 2.0), Row::new("x", 3.0)]);
        engine
    }

    #[test]
    fn budget_of_three_iterations_persists_three_dates_and_one_continuation() {
        let store = Arc::new(CountingStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let queries = scripted_engine();
        let chart = engine_under_test(
            &store,
            &publisher,
            &queries,
            date(2024, 3, 1),
            date(2024, 3, 10),
            date(2024, 3, 11),
        );

        let timer = StepTimer::new(Duration::from_secs(1));
        let outcome = chart.fill(Duration::from_millis(3500), &timer).unwrap();

        assert_eq!(
            outcome,
            FillOutcome::Suspended {
                completed: 3,
                remaining: 7
            }
        );
        assert_eq!(store.entry_count(), 3);
        assert_eq!(publisher.count_for(FILL_TOPIC), 1);
        assert!(publisher.messages()[0].1.contains("page-1-abc"));
    }

    #[test]
    fn resumed_fill_recomputes_nothing() {
        let store = Arc::new(CountingStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let queries = scripted_engine();
        let chart = engine_under_test(
            &store,
            &publisher,
            &queries,
            date(2024, 3, 1),
            date(2024, 3, 10),
            date(2024, 3, 11),
        );

        let timer = StepTimer::new(Duration::from_secs(1));
        chart.fill(Duration::from_millis(3500), &timer).unwrap();
        assert_eq!(queries.call_count(), 3);

        // generous budget: the resumed fill finishes the range
        let timer = StepTimer::new(Duration::from_millis(1));
        let outcome = chart.fill(Duration::from_secs(3600), &timer).unwrap();
        assert_eq!(outcome, FillOutcome::Completed { computed: 7 });
        assert_eq!(store.entry_count(), 10);

        // days 1-3 were evaluated exactly once across both fills
        assert_eq!(chart.target_dates().len(), 10);
        assert_eq!(queries.call_count_as_of(date(2024, 3, 1)), 1);
        assert_eq!(queries.call_count_as_of(date(2024, 3, 3)), 1);
        assert_eq!(queries.call_count(), 10);
        // no further continuation after completion
        assert_eq!(publisher.count_for(FILL_TOPIC), 1);
    }

    #[test]
    fn ready_flips_only_when_the_range_is_complete() {
        let store = Arc::new(CountingStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let queries = scripted_engine();
        let chart = engine_under_test(
            &store,
            &publisher,
            &queries,
            date(2024, 3, 1),
            date(2024, 3, 10),
            date(2024, 3, 11),
        );

        assert!(!chart.ready().unwrap());
        let timer = StepTimer::new(Duration::from_secs(1));
        chart.fill(Duration::from_millis(3500), &timer).unwrap();
        assert!(!chart.ready().unwrap());
        assert_eq!(chart.progress().unwrap(), "3 of 10 days computed");

        let timer = StepTimer::new(Duration::from_millis(1));
        chart.fill(Duration::from_secs(3600), &timer).unwrap();
        assert!(chart.ready().unwrap());
        assert_eq!(chart.progress().unwrap(), "10 of 10 days computed");
    }

    #[test]
    fn future_start_date_is_never_ready() {
        let store = Arc::new(CountingStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let queries = scripted_engine();
        let chart = engine_under_test(
            &store,
            &publisher,
            &queries,
            date(2024, 4, 1),
            date(2024, 4, 10),
            date(2024, 3, 11),
        );
        assert!(!chart.ready().unwrap());
    }

    #[test]
    fn today_is_never_cached() {
        let store = Arc::new(CountingStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let queries = scripted_engine();
        let today = date(2024, 3, 10);
        let chart = engine_under_test(
            &store,
            &publisher,
            &queries,
            date(2024, 3, 8),
            today,
            today,
        );

        let timer = StepTimer::new(Duration::from_millis(1));
        let outcome = chart.fill(Duration::from_secs(3600), &timer).unwrap();
        // only the 8th and 9th are batch-fill targets
        assert_eq!(outcome, FillOutcome::Completed { computed: 2 });
        assert_eq!(store.entry_count(), 2);
        assert!(chart.ready().unwrap());
        assert!(store.get(&chart.cache().key(today)).unwrap().is_none());
    }

    #[test]
    fn failed_fill_leaves_cached_dates_intact() {
        let store = Arc::new(CountingStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let queries = scripted_engine();
        let chart = engine_under_test(
            &store,
            &publisher,
            &queries,
            date(2024, 3, 1),
            date(2024, 3, 10),
            date(2024, 3, 11),
        );
        let timer = StepTimer::new(Duration::from_secs(1));
        chart.fill(Duration::from_millis(3500), &timer).unwrap();
        assert_eq!(store.entry_count(), 3);

        // same namespace, but a query the engine rejects
        let broken = DailyHistoryChart::new(
            vec![HistorySeries {
                label: "Broken".to_string(),
                query: "".to_string(),
                color: Color::Undefined,
            }],
            None,
            date(2024, 3, 1),
            date(2024, 3, 10),
            DailyHistoryCache::new(Arc::clone(&store) as Arc<dyn CacheStore>, "page-1-abc"),
            Arc::new(queries.clone()),
            Arc::new(FixedClock::new(date(2024, 3, 11))),
            Arc::clone(&publisher) as Arc<dyn MessagePublisher>,
        );
        let timer = StepTimer::new(Duration::from_millis(1));
        assert!(broken.fill(Duration::from_secs(3600), &timer).is_err());
        assert_eq!(store.entry_count(), 3);
    }

    #[test]
    fn load_serves_cached_days_and_computes_today_live() {
        let store = Arc::new(CountingStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let queries = scripted_engine();
        let today = date(2024, 3, 3);
        let chart = engine_under_test(
            &store,
            &publisher,
            &queries,
            date(2024, 3, 1),
            today,
            today,
        );

        let timer = StepTimer::new(Duration::from_millis(1));
        chart.fill(Duration::from_secs(3600), &timer).unwrap();
        let calls_after_fill = queries.call_count();

        let project = FakeProject::new("alpha");
        let data = chart.load(&project).unwrap();
        assert_eq!(data.labels, vec!["2024-03-01", "2024-03-02", "2024-03-03"]);
        // the scripted query sums to 5 per day
        assert_eq!(data.series[0].values, vec![5.0, 5.0, 5.0]);
        // only today was evaluated during load
        assert_eq!(queries.call_count(), calls_after_fill + 1);
        assert_eq!(queries.call_count_as_of(today), 1);
    }
}
