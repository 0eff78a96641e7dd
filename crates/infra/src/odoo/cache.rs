//! TTL cache for call results
//!
//! Keys are the canonical JSON serialization of the full call signature.
//! Expiry is checked on read; there is no background sweeper.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::time::{Clock, SystemClock};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// Thread-safe result cache with a fixed TTL.
pub struct ResultCache<C: Clock = SystemClock> {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
    clock: C,
}

impl ResultCache<SystemClock> {
    /// Create a cache using the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> ResultCache<C> {
    /// Create a cache with a custom clock (useful for testing).
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), ttl, clock }
    }

    /// Fresh value for `key`, or `None` on a miss or an expired entry.
    pub fn get(&self, key: &str) -> Option<Value> {
        {
            let entries = self.entries.read().expect("cache lock poisoned");
            match entries.get(key) {
                Some(entry) if self.clock.now().duration_since(entry.stored_at) < self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: remove it so the map does not grow unbounded.
        self.entries.write().expect("cache lock poisoned").remove(key);
        None
    }

    /// Store `value` under `key`, overwriting any previous entry.
    pub fn insert(&self, key: String, value: Value) {
        let entry = CacheEntry { value, stored_at: self.clock.now() };
        self.entries.write().expect("cache lock poisoned").insert(key, entry);
    }

    /// Current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Clock + Clone> Clone for ResultCache<C> {
    fn clone(&self) -> Self {
        Self { entries: Arc::clone(&self.entries), ttl: self.ttl, clock: self.clock.clone() }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::time::MockClock;

    #[test]
    fn returns_fresh_entries() {
        let clock = MockClock::new();
        let cache = ResultCache::with_clock(Duration::from_secs(30), clock.clone());

        cache.insert("k".to_string(), json!([1, 2, 3]));
        clock.advance(Duration::from_secs(29));

        assert_eq!(cache.get("k"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn expired_entries_miss_and_are_removed() {
        let clock = MockClock::new();
        let cache = ResultCache::with_clock(Duration::from_secs(30), clock.clone());

        cache.insert("k".to_string(), json!("value"));
        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "expired entry must not linger in the map");
    }

    #[test]
    fn keys_do_not_collide() {
        let cache = ResultCache::new(Duration::from_secs(30));

        cache.insert("a".to_string(), json!(1));
        cache.insert("b".to_string(), json!(2));

        assert_eq!(cache.get("a"), Some(json!(1)));
        assert_eq!(cache.get("b"), Some(json!(2)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn insert_overwrites_previous_value() {
        let cache = ResultCache::new(Duration::from_secs(30));

        cache.insert("k".to_string(), json!(1));
        cache.insert("k".to_string(), json!(2));

        assert_eq!(cache.get("k"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clones_share_storage() {
        let cache = ResultCache::new(Duration::from_secs(30));
        let other = cache.clone();

        cache.insert("k".to_string(), json!("shared"));

        assert_eq!(other.get("k"), Some(json!("shared")));
    }
}
