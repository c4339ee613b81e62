//! Per-date value cache
//!
//! One store entry per (namespace, date) holding the JSON array of
//! per-series values for that day. Past dates are immutable once written;
//! today is never written or read, it is always recomputed live.

use crate::error::HistoryResult;
use chartmark_data::{CacheStore, CacheStoreError};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

/// Daily value cache scoped to one chart's namespace
#[derive(Clone)]
pub struct DailyHistoryCache {
    store: Arc<dyn CacheStore>,
    namespace: String,
}

impl DailyHistoryCache {
    /// Create a cache over a store, scoped to a namespace
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Namespace this cache is scoped to
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Store key for a date
    #[must_use]
    pub fn key(&self, date: NaiveDate) -> String {
        format!("daily-history/{}/{}", self.namespace, date.format("%Y-%m-%d"))
    }

    /// Cached per-series values for a date
    ///
    /// # Errors
    /// Store failures propagate; an undecodable entry is reported as
    /// [`CacheStoreError::Corrupt`].
    pub fn get(&self, date: NaiveDate) -> HistoryResult<Option<Vec<f64>>> {
        let key = self.key(date);
        match self.store.get(&key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|err| CacheStoreError::corrupt(key, err.to_string()).into()),
        }
    }

    /// Write a date's values unless the date is already cached
    ///
    /// Read-before-write keeps retries idempotent under at-least-once
    /// message delivery. Returns whether a write happened.
    ///
    /// # Errors
    /// Store failures propagate.
    pub fn put_if_absent(&self, date: NaiveDate, values: &[f64]) -> HistoryResult<bool> {
        let key = self.key(date);
        if self.store.get(&key)?.is_some() {
            tracing::debug!(%key, "date already cached, skipping write");
            return Ok(false);
        }
        // serializing a float slice cannot fail
        let encoded = serde_json::to_string(values).unwrap_or_default();
        self.store.put(&key, &encoded)?;
        Ok(true)
    }

    /// The subset of `dates` that is already cached
    ///
    /// # Errors
    /// Store failures propagate.
    pub fn cached_dates(&self, dates: &[NaiveDate]) -> HistoryResult<HashSet<NaiveDate>> {
        let keys: Vec<String> = dates.iter().map(|d| self.key(*d)).collect();
        let found = self.store.get_multi(&keys)?;
        Ok(dates
            .iter()
            .copied()
            .filter(|d| found.contains_key(&self.key(*d)))
            .collect())
    }
}

impl std::fmt::Debug for DailyHistoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyHistoryCache")
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartmark_test_utils::{date, CountingStore};

    fn cache(store: &Arc<CountingStore>) -> DailyHistoryCache {
        DailyHistoryCache::new(Arc::clone(store) as Arc<dyn CacheStore>, "page-1-abc")
    }

    #[test]
    fn key_layout() {
        let store = Arc::new(CountingStore::new());
        let cache = cache(&store);
        assert_eq!(
            cache.key(date(2024, 3, 5)),
            "daily-history/page-1-abc/2024-03-05"
        );
    }

    #[test]
    fn round_trips_values() {
        let store = Arc::new(CountingStore::new());
        let cache = cache(&store);
        let day = date(2024, 3, 5);

        assert_eq!(cache.get(day).unwrap(), None);
        assert!(cache.put_if_absent(day, &[1.0, 2.5]).unwrap());
        assert_eq!(cache.get(day).unwrap(), Some(vec![1.0, 2.5]));
    }

    #[test]
    fn second_write_is_a_no_op() {
        let store = Arc::new(CountingStore::new());
        let cache = cache(&store);
        let day = date(2024, 3, 5);

        assert!(cache.put_if_absent(day, &[1.0]).unwrap());
        assert!(!cache.put_if_absent(day, &[9.0]).unwrap());
        // first write wins
        assert_eq!(cache.get(day).unwrap(), Some(vec![1.0]));
        assert_eq!(store.put_count(), 1);
    }

    #[test]
    fn corrupt_entry_is_reported() {
        let store = Arc::new(CountingStore::new());
        let cache = cache(&store);
        let day = date(2024, 3, 5);

        store.put(&cache.key(day), "not json").unwrap();
        let err = cache.get(day).unwrap_err();
        assert!(err.to_string().contains("corrupt cache entry"));
    }

    #[test]
    fn cached_dates_reports_the_cached_subset() {
        let store = Arc::new(CountingStore::new());
        let cache = cache(&store);
        let days = [date(2024, 3, 1), date(2024, 3, 2), date(2024, 3, 3)];

        cache.put_if_absent(days[1], &[1.0]).unwrap();
        let cached = cache.cached_dates(&days).unwrap();
        assert_eq!(cached.len(), 1);
        assert!(cached.contains(&days[1]));
    }
}
