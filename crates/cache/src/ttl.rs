//! Generic TTL cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A read-through cache with TTL expiry and explicit invalidation.
///
/// Shared mutable state: any request may read or write it concurrently. Two
/// callers missing the same key will both run their loaders and the last
/// insert wins, which is acceptable because both loaded from the
/// authoritative store. Consistency on write paths comes from explicit
/// invalidation, not from expiry.
pub struct TtlCache<V> {
    name: &'static str,
    default_ttl: Duration,
    entries: Arc<RwLock<HashMap<String, Entry<V>>>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            default_ttl: self.default_ttl,
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache. `name` labels the hit/miss metrics.
    pub fn new(name: &'static str, default_ttl: Duration) -> Self {
        Self {
            name,
            default_ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the cached value for `key`, if present and not expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    metrics::counter!("cache_hits_total", "cache" => self.name).increment(1);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    metrics::counter!("cache_misses_total", "cache" => self.name).increment(1);
                    return None;
                }
            }
        }

        // Expired: drop it so the map does not grow unbounded.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key)
            && entry.expires_at <= now
        {
            entries.remove(key);
        }
        metrics::counter!("cache_misses_total", "cache" => self.name).increment(1);
        None
    }

    /// Inserts a value with the default TTL.
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl).await;
    }

    /// Inserts a value with an explicit TTL.
    pub async fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Returns the value for `key`, running `loader` to populate the cache
    /// on a miss. A hit never invokes the loader; a loader error is returned
    /// as-is and nothing is cached.
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_load_with_ttl(key, self.default_ttl, loader)
            .await
    }

    /// Same as [`TtlCache::get_or_load`] with an explicit TTL for the loaded
    /// value.
    pub async fn get_or_load_with_ttl<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = loader().await?;
        self.insert_with_ttl(key, value.clone(), ttl).await;
        Ok(value)
    }

    /// Removes a single key. Returns true if an entry was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.entries.write().await.remove(key).is_some();
        if removed {
            tracing::debug!(cache = self.name, key, "cache entry invalidated");
        }
        removed
    }

    /// Removes every key starting with `prefix`. Returns the number removed.
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(cache = self.name, prefix, removed, "cache prefix invalidated");
        }
        removed
    }

    /// Removes everything.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of entries, including ones that have expired but not yet been
    /// swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
