//! Cache store seam and the in-memory moka implementation
//!
//! A cache store is a plain string key-value map. Both the rendered-output
//! cache and the daily-history cache go through this trait. Every method is
//! fallible: callers are required to catch store errors and fall back to
//! uncached execution, so an outage never fails a render.

use crate::error::CacheStoreError;
use moka::sync::Cache;
use std::collections::HashMap;

/// Key-value cache store
pub trait CacheStore: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    /// Returns [`CacheStoreError`] when the backend is unreachable or the
    /// entry cannot be decoded.
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Write a value
    ///
    /// The write must be atomic at entry granularity: a concurrent reader
    /// sees either the previous value or the new one, never a torn entry.
    ///
    /// # Errors
    /// Returns [`CacheStoreError`] when the backend is unreachable.
    fn put(&self, key: &str, value: &str) -> Result<(), CacheStoreError>;

    /// Read several values at once
    ///
    /// Missing keys are simply absent from the result map.
    ///
    /// # Errors
    /// Returns [`CacheStoreError`] when the backend is unreachable.
    fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, String>, CacheStoreError> {
        let mut found = HashMap::new();
        for key in keys {
            if let Some(value) = self.get(key)? {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }
}

/// In-memory cache store backed by moka
///
/// Whole-string values are stored per key, so writes are atomic at entry
/// granularity by construction.
#[derive(Debug, Clone)]
pub struct MokaStore {
    inner: Cache<String, String>,
}

impl MokaStore {
    /// Create a store with the given max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Approximate number of entries
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MokaStore {
    /// Create a store with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl CacheStore for MokaStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        Ok(self.inner.get(key))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        self.inner.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let store = MokaStore::new(100);
        store.put("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn get_missing_is_none() {
        let store = MokaStore::new(100);
        assert_eq!(store.get("absent").unwrap(), None);
    }

    #[test]
    fn get_multi_skips_missing() {
        let store = MokaStore::new(100);
        store.put("a", "1").unwrap();
        store.put("c", "3").unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let found = store.get_multi(&keys).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found.get("a"), Some(&"1".to_string()));
        assert!(!found.contains_key("b"));
    }

    #[test]
    fn overwrite_replaces_value() {
        let store = MokaStore::new(100);
        store.put("k", "old").unwrap();
        store.put("k", "new").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("new".to_string()));
    }
}
