//! Short-lived cache for identical requests.
//!
//! The Dashboard API counts every request against the project's rate
//! budget, so a response is kept briefly and handed back to repeat
//! requests with the same canonical key. The cache is owned by the client
//! instance; two clients never share entries.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde_json::Value;

/// Number of responses kept by default.
pub const DEFAULT_CAPACITY: usize = 1;

/// How long a cached response stays valid by default.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Bounded TTL cache mapping a canonical request key to a parsed response.
///
/// Entries expire a fixed interval after insertion; looking up an expired
/// entry removes it. Inserting at capacity evicts the least-recently-used
/// entry, so with the default capacity of one any request with a different
/// key evicts the previous response.
#[derive(Debug)]
pub struct ResponseCache {
    entries: LruCache<String, (Value, Instant)>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a cache holding up to `capacity` responses for `ttl` each.
    /// A zero capacity is treated as one.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Look up a response, removing it if it has expired.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some((value, expires_at)) if Instant::now() < *expires_at => Some(value.clone()),
            Some(_) => {
                self.entries.pop(key);
                None
            }
            None => None,
        }
    }

    /// Store a response under its canonical key.
    pub fn insert(&mut self, key: String, value: Value) {
        let expires_at = Instant::now() + self.ttl;
        self.entries.put(key, (value, expires_at));
    }

    /// Number of entries currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

/// Canonical cache key for a request: the full URL, the query parameters
/// sorted by name then value, and the API key the request authenticates
/// with. Parameter order on the wire does not affect the key.
pub(crate) fn request_key(url: &str, params: &[(&str, String)], api_key: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort();

    let mut key = String::with_capacity(url.len() + api_key.len() + 16 * params.len());
    key.push_str(url);
    key.push('?');
    for (name, value) in sorted {
        key.push_str(name);
        key.push('=');
        key.push_str(value);
        key.push('&');
    }
    key.push_str(api_key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_within_ttl() {
        let mut cache = ResponseCache::default();
        cache.insert("k".to_owned(), json!({"ok": true}));
        assert_eq!(cache.get("k"), Some(json!({"ok": true})));
    }

    #[test]
    fn test_expired_entry_is_removed_on_lookup() {
        let mut cache = ResponseCache::new(1, Duration::from_millis(10));
        cache.insert("k".to_owned(), json!(1));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_single_slot_eviction() {
        let mut cache = ResponseCache::new(1, Duration::from_secs(60));
        cache.insert("first".to_owned(), json!(1));
        cache.insert("second".to_owned(), json!(2));

        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_larger_capacity_keeps_both() {
        let mut cache = ResponseCache::new(4, Duration::from_secs(60));
        cache.insert("a".to_owned(), json!(1));
        cache.insert("b".to_owned(), json!(2));
        assert_eq!(cache.get("a"), Some(json!(1)));
        assert_eq!(cache.get("b"), Some(json!(2)));
    }

    #[test]
    fn test_zero_capacity_is_clamped_to_one() {
        let mut cache = ResponseCache::new(0, Duration::from_secs(60));
        cache.insert("k".to_owned(), json!(1));
        assert_eq!(cache.get("k"), Some(json!(1)));
    }

    #[test]
    fn test_request_key_ignores_parameter_order() {
        let forward = [
            ("start", "20200101".to_owned()),
            ("end", "20200107".to_owned()),
        ];
        let reversed = [
            ("end", "20200107".to_owned()),
            ("start", "20200101".to_owned()),
        ];
        assert_eq!(
            request_key("https://x/users", &forward, "key"),
            request_key("https://x/users", &reversed, "key"),
        );
    }

    #[test]
    fn test_request_key_distinguishes_credentials_and_params() {
        let params = [("start", "20200101".to_owned())];
        let other = [("start", "20200102".to_owned())];
        assert_ne!(
            request_key("https://x/users", &params, "key-a"),
            request_key("https://x/users", &params, "key-b"),
        );
        assert_ne!(
            request_key("https://x/users", &params, "key-a"),
            request_key("https://x/users", &other, "key-a"),
        );
    }
}
