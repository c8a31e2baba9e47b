use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::storage::traits::CacheStore;

/// In-process object cache with per-entry expiry.
///
/// Expired entries are dropped lazily on read; `flush` clears the whole
/// namespace at once. Concurrent readers and writers of the same key are
/// safe; a cache-miss race resolves last-writer-wins, which is acceptable
/// because both writers computed the same value from the same inputs.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries, for tests and diagnostics.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap();
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }

    fn flush(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_and_flush() {
        let cache = InMemoryCacheStore::new();
        cache.set("a", "1".to_string(), Duration::from_secs(60));
        cache.set("b", "2".to_string(), Duration::from_secs(60));

        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert_eq!(cache.len(), 2);

        cache.flush();
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = InMemoryCacheStore::new();
        cache.set("a", "1".to_string(), Duration::from_secs(0));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_overwrite_is_last_writer_wins() {
        let cache = InMemoryCacheStore::new();
        cache.set("a", "1".to_string(), Duration::from_secs(60));
        cache.set("a", "2".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("a"), Some("2".to_string()));
    }
}
