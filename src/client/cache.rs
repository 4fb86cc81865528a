use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Cached GET responses keyed by request path (including the query string).
///
/// Mutations invalidate by path prefix, so a write to `/api/tasks` drops every
/// cached task list whatever range it was fetched with.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    /// Drop every entry whose key starts with `prefix`; returns how many.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!(prefix, dropped, "invalidated cached queries");
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_drops_every_key_under_prefix() {
        let cache = QueryCache::new();
        cache.put("/api/tasks", &vec![1, 2]);
        cache.put("/api/tasks?start=2026-03-01&end=2026-03-31", &vec![1]);
        cache.put("/api/rules", &Vec::<i32>::new());

        assert_eq!(cache.invalidate("/api/tasks"), 2);
        assert_eq!(cache.get::<Vec<i32>>("/api/tasks"), None);
        assert_eq!(cache.get::<Vec<i32>>("/api/rules"), Some(vec![]));
    }

    #[test]
    fn null_responses_are_cached_too() {
        let cache = QueryCache::new();
        cache.put("/api/notes/2026-03-10", &Option::<String>::None);
        assert_eq!(cache.get::<Option<String>>("/api/notes/2026-03-10"), Some(None));
        assert_eq!(cache.len(), 1);
    }
}
