use moka::future::Cache;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheSettings;

/// Fingerprint of a cacheable upstream call
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    namespace: &'static str,
    fingerprint: String,
}

impl CacheKey {
    pub fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            fingerprint: String::new(),
        }
    }

    /// Append a request field to the fingerprint
    #[must_use]
    pub fn part(mut self, value: &str) -> Self {
        if !self.fingerprint.is_empty() {
            self.fingerprint.push('\u{1f}');
        }
        self.fingerprint.push_str(value);
        self
    }

    /// Append a credential by hash only, so it is never held in the cache
    #[must_use]
    pub fn secret(self, value: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        self.part(&format!("{:016x}", hasher.finish()))
    }
}

/// TTL cache for upstream responses.
///
/// Constructed once at start-up and shared through the request context.
/// Entries are last-write-wins and expire after the configured TTL; capacity
/// overflow evicts by moka's TinyLFU policy.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<CacheKey, Arc<Value>>,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(settings: &CacheSettings) -> Self {
        let entries = Cache::builder()
            .max_capacity(settings.max_entries)
            .time_to_live(Duration::from_secs(settings.ttl_secs))
            .build();

        Self {
            entries,
            enabled: settings.enabled,
        }
    }

    /// Cached value for `key`, if present and not expired
    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        self.entries.get(key).await.map(|arc| (*arc).clone())
    }

    pub async fn insert(&self, key: CacheKey, value: Value) {
        if self.enabled {
            self.entries.insert(key, Arc::new(value)).await;
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            entries: self.entries.entry_count(),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(&CacheSettings::default())
    }
}

/// Cache statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: u64,
}
