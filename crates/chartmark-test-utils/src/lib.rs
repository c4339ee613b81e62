//! Testing utilities for the chartmark workspace
//!
//! Shared fakes and fixtures: scripted query engine with call counting,
//! fixed project/clock, failing and counting cache stores, step timer.

#![allow(missing_docs)]

use chartmark_data::{
    CacheStore, CacheStoreError, CardContext, Clock, ContentProvider, DataQuery, Project,
    PropertyDefinition, QueryEngine, QueryError, QueryOptions, Row, Timer, TypedValue,
};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Initialize tracing once for a test binary (respects `RUST_LOG`)
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ---------------------------------------------------------------------------
// Project / card
// ---------------------------------------------------------------------------

pub struct FakeProject {
    pub identifier: String,
    pub precision: u32,
    pub variables: HashMap<String, TypedValue>,
    pub card_names: HashMap<u64, String>,
}

impl FakeProject {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            precision: 2,
            variables: HashMap::new(),
            card_names: HashMap::new(),
        }
    }

    pub fn with_variable(mut self, name: &str, value: TypedValue) -> Self {
        self.variables.insert(name.to_ascii_lowercase(), value);
        self
    }

    pub fn with_card(mut self, number: u64, name: &str) -> Self {
        self.card_names.insert(number, name.to_string());
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }
}

impl Project for FakeProject {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn parse_date(&self, raw: &str) -> Result<NaiveDate, String> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| raw.to_string())
    }

    fn format_date(&self, date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    fn format_number(&self, value: f64) -> String {
        format!("{value:.prec$}", prec = self.precision as usize)
    }

    fn precision(&self) -> u32 {
        self.precision
    }

    fn variable(&self, name: &str) -> Option<TypedValue> {
        self.variables.get(&name.to_ascii_lowercase()).cloned()
    }

    fn card_name(&self, number: u64) -> Option<String> {
        self.card_names.get(&number).cloned()
    }
}

pub struct FakeCard {
    pub number: u64,
    pub properties: HashMap<String, TypedValue>,
}

impl FakeCard {
    pub fn new(number: u64) -> Self {
        Self {
            number,
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: TypedValue) -> Self {
        self.properties.insert(name.to_ascii_lowercase(), value);
        self
    }
}

impl CardContext for FakeCard {
    fn number(&self) -> u64 {
        self.number
    }

    fn property_value(&self, name: &str) -> Option<TypedValue> {
        self.properties.get(&name.to_ascii_lowercase()).cloned()
    }
}

// ---------------------------------------------------------------------------
// Content provider
// ---------------------------------------------------------------------------

pub struct FakeProvider {
    pub id: Option<String>,
    version: Mutex<u64>,
    pub rendered: Vec<String>,
}

impl FakeProvider {
    pub fn persisted(id: &str, project: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            version: Mutex::new(1),
            rendered: vec![project.to_string()],
        }
    }

    pub fn unpersisted(project: &str) -> Self {
        Self {
            id: None,
            version: Mutex::new(0),
            rendered: vec![project.to_string()],
        }
    }

    pub fn with_rendered_project(mut self, project: &str) -> Self {
        self.rendered.push(project.to_string());
        self
    }

    pub fn bump_version(&self) {
        *self.version.lock() += 1;
    }
}

impl ContentProvider for FakeProvider {
    fn cache_id(&self) -> Option<String> {
        self.id.clone()
    }

    fn version(&self) -> u64 {
        *self.version.lock()
    }

    fn rendered_projects(&self) -> Vec<String> {
        self.rendered.clone()
    }
}

// ---------------------------------------------------------------------------
// Query engine
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ScriptState {
    rows: HashMap<String, Vec<Row>>,
    as_of_rows: HashMap<(String, NaiveDate), Vec<Row>>,
    properties: HashMap<String, PropertyDefinition>,
    time_dependent: HashMap<String, bool>,
    calls: Mutex<Vec<(String, Option<NaiveDate>)>>,
}

/// Query engine returning scripted rows and counting every evaluation
#[derive(Clone, Default)]
pub struct ScriptedQueryEngine {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the current-state result of a query
    pub fn script(&self, query: &str, rows: Vec<Row>) {
        self.state.lock().rows.insert(query.to_string(), rows);
    }

    /// Script a point-in-time result of a query
    pub fn script_as_of(&self, query: &str, as_of: NaiveDate, rows: Vec<Row>) {
        self.state
            .lock()
            .as_of_rows
            .insert((query.to_string(), as_of), rows);
    }

    /// Script the property definition of a query's first column
    pub fn script_property(&self, query: &str, property: PropertyDefinition) {
        self.state
            .lock()
            .properties
            .insert(query.to_string(), property);
    }

    /// Mark a query as depending on the current wall clock
    pub fn script_time_dependent(&self, query: &str) {
        self.state
            .lock()
            .time_dependent
            .insert(query.to_string(), true);
    }

    /// Number of `values` evaluations, across all queries
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.lock().len()
    }

    /// Number of `values` evaluations as of a specific date
    pub fn call_count_as_of(&self, as_of: NaiveDate) -> usize {
        self.state
            .lock()
            .calls
            .lock()
            .iter()
            .filter(|(_, d)| *d == Some(as_of))
            .count()
    }
}

impl QueryEngine for ScriptedQueryEngine {
    fn parse(&self, query: &str, _options: &QueryOptions) -> Result<Box<dyn DataQuery>, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::parse("empty query"));
        }
        Ok(Box::new(ScriptedQuery {
            state: Arc::clone(&self.state),
            query: query.to_string(),
        }))
    }
}

struct ScriptedQuery {
    state: Arc<Mutex<ScriptState>>,
    query: String,
}

impl DataQuery for ScriptedQuery {
    fn values(&self, as_of: Option<NaiveDate>) -> Result<Vec<Row>, QueryError> {
        let state = self.state.lock();
        state.calls.lock().push((self.query.clone(), as_of));
        let rows = match as_of {
            Some(date) => state
                .as_of_rows
                .get(&(self.query.clone(), date))
                .or_else(|| state.rows.get(&self.query))
                .cloned(),
            None => state.rows.get(&self.query).cloned(),
        };
        Ok(rows.unwrap_or_default())
    }

    fn restrict_with(&self, conditions: &str) -> Result<Box<dyn DataQuery>, QueryError> {
        if conditions.trim().is_empty() {
            return Err(QueryError::parse("empty conditions"));
        }
        // scripted results are keyed by the base query
        Ok(Box::new(ScriptedQuery {
            state: Arc::clone(&self.state),
            query: self.query.clone(),
        }))
    }

    fn column_property(&self) -> Option<PropertyDefinition> {
        self.state.lock().properties.get(&self.query).cloned()
    }

    fn is_time_dependent(&self) -> bool {
        self.state
            .lock()
            .time_dependent
            .get(&self.query)
            .copied()
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Cache stores
// ---------------------------------------------------------------------------

/// Store whose every operation fails, for outage-degradation tests
#[derive(Debug, Default)]
pub struct FailingStore;

impl CacheStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, CacheStoreError> {
        Err(CacheStoreError::unavailable("store is down"))
    }

    fn put(&self, _key: &str, _value: &str) -> Result<(), CacheStoreError> {
        Err(CacheStoreError::unavailable("store is down"))
    }
}

/// In-memory store counting reads and writes
#[derive(Default)]
pub struct CountingStore {
    entries: Mutex<HashMap<String, String>>,
    gets: Mutex<usize>,
    puts: Mutex<usize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_count(&self) -> usize {
        *self.gets.lock()
    }

    pub fn put_count(&self) -> usize {
        *self.puts.lock()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl CacheStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        *self.gets.lock() += 1;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        *self.puts.lock() += 1;
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Clock / timer
// ---------------------------------------------------------------------------

/// Clock pinned to a fixed date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub today: NaiveDate,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// Timer advancing by a fixed step on every `elapsed` call
///
/// Makes budget exhaustion deterministic: with a step of 1s and a budget
/// of 3.5s the fill loop admits exactly three iterations.
pub struct StepTimer {
    step: Duration,
    total: Mutex<Duration>,
}

impl StepTimer {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            total: Mutex::new(Duration::ZERO),
        }
    }
}

impl Timer for StepTimer {
    fn elapsed(&self) -> Duration {
        let mut total = self.total.lock();
        *total += self.step;
        *total
    }
}
