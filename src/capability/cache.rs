//! Cache capability and in-process implementations.
//!
//! Cache failures never fail a caller: the repository logs and degrades to
//! direct store reads. Disabling caching swaps in [`NullCache`] at
//! construction time; nothing is replaced at runtime.

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Cache operation failure
#[derive(Debug, thiserror::Error)]
#[error("Cache error: {0}")]
pub struct CacheError(pub String);

/// Asynchronous cache capability.
///
/// Values are JSON so heterogeneous payloads (documents, find results,
/// counts) share one interface. Named sets back the always-cached
/// soft-deleted id set.
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()>;

    async fn remove(&self, key: &str) -> CacheResult<()>;

    /// Batch get; absent keys are simply missing from the result map
    async fn get_all(&self, keys: &[String]) -> CacheResult<HashMap<String, Value>>;

    /// Batch set with a shared expiry
    async fn set_all(&self, values: HashMap<String, Value>, ttl: Option<Duration>) -> CacheResult<()>;

    async fn remove_all(&self, keys: &[String]) -> CacheResult<()>;

    /// Add members to a named set
    async fn set_add(&self, key: &str, members: &[String]) -> CacheResult<()>;

    /// Read all members of a named set
    async fn set_members(&self, key: &str) -> CacheResult<Vec<String>>;
}

/// Disabled-cache implementation: every read misses, every write succeeds
/// without storing anything.
#[derive(Debug, Clone, Default)]
pub struct NullCache;

#[async_trait]
impl CacheClient for NullCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> CacheResult<()> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn get_all(&self, _keys: &[String]) -> CacheResult<HashMap<String, Value>> {
        Ok(HashMap::new())
    }

    async fn set_all(&self, _values: HashMap<String, Value>, _ttl: Option<Duration>) -> CacheResult<()> {
        Ok(())
    }

    async fn remove_all(&self, _keys: &[String]) -> CacheResult<()> {
        Ok(())
    }

    async fn set_add(&self, _key: &str, _members: &[String]) -> CacheResult<()> {
        Ok(())
    }

    async fn set_members(&self, _key: &str) -> CacheResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// In-process cache backed by Moka, with named sets in a side map
#[derive(Clone)]
pub struct MemoryCache {
    cache: Cache<String, Value>,
    sets: Arc<DashMap<String, Vec<String>>>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(default_ttl)
            .build();

        Self {
            cache,
            sets: Arc::new(DashMap::new()),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: Value, _ttl: Option<Duration>) -> CacheResult<()> {
        // Per-entry TTL would need an expiry policy; the builder-level TTL
        // is enough for the in-process implementation.
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn get_all(&self, keys: &[String]) -> CacheResult<HashMap<String, Value>> {
        let mut found = HashMap::new();
        for key in keys {
            if let Some(value) = self.cache.get(key).await {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    async fn set_all(&self, values: HashMap<String, Value>, _ttl: Option<Duration>) -> CacheResult<()> {
        for (key, value) in values {
            self.cache.insert(key, value).await;
        }
        Ok(())
    }

    async fn remove_all(&self, keys: &[String]) -> CacheResult<()> {
        for key in keys {
            self.cache.invalidate(key).await;
        }
        Ok(())
    }

    async fn set_add(&self, key: &str, members: &[String]) -> CacheResult<()> {
        let mut entry = self.sets.entry(key.to_string()).or_default();
        for member in members {
            if !entry.contains(member) {
                entry.push(member.clone());
            }
        }
        Ok(())
    }

    async fn set_members(&self, key: &str) -> CacheResult<Vec<String>> {
        Ok(self.sets.get(key).map(|e| e.clone()).unwrap_or_default())
    }
}

/// Cache view that prefixes every key with an entity-type scope, so
/// repositories for different document types never collide.
#[derive(Clone)]
pub struct ScopedCache {
    inner: Arc<dyn CacheClient>,
    scope: String,
}

impl ScopedCache {
    pub fn new(inner: Arc<dyn CacheClient>, scope: impl Into<String>) -> Self {
        Self {
            inner,
            scope: scope.into(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.scope, key)
    }

    fn unscoped<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(&self.scope)
            .and_then(|k| k.strip_prefix(':'))
            .unwrap_or(key)
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        self.inner.get(&self.scoped(key)).await
    }

    pub async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        self.inner.set(&self.scoped(key), value, ttl).await
    }

    pub async fn remove(&self, key: &str) -> CacheResult<()> {
        self.inner.remove(&self.scoped(key)).await
    }

    pub async fn get_all(&self, keys: &[String]) -> CacheResult<HashMap<String, Value>> {
        let scoped: Vec<String> = keys.iter().map(|k| self.scoped(k)).collect();
        let found = self.inner.get_all(&scoped).await?;
        Ok(found
            .into_iter()
            .map(|(k, v)| (self.unscoped(&k).to_string(), v))
            .collect())
    }

    pub async fn set_all(&self, values: HashMap<String, Value>, ttl: Option<Duration>) -> CacheResult<()> {
        let scoped = values
            .into_iter()
            .map(|(k, v)| (self.scoped(&k), v))
            .collect();
        self.inner.set_all(scoped, ttl).await
    }

    pub async fn remove_all(&self, keys: &[String]) -> CacheResult<()> {
        let scoped: Vec<String> = keys.iter().map(|k| self.scoped(k)).collect();
        self.inner.remove_all(&scoped).await
    }

    pub async fn set_add(&self, key: &str, members: &[String]) -> CacheResult<()> {
        self.inner.set_add(&self.scoped(key), members).await
    }

    pub async fn set_members(&self, key: &str) -> CacheResult<Vec<String>> {
        self.inner.set_members(&self.scoped(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_cache_basic_operations() {
        let cache = MemoryCache::new(100, Duration::from_secs(60));

        cache.set("key1", json!("value1"), None).await.unwrap();
        assert_eq!(cache.get("key1").await.unwrap(), Some(json!("value1")));

        cache.remove("key1").await.unwrap();
        assert_eq!(cache.get("key1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_batch() {
        let cache = MemoryCache::new(100, Duration::from_secs(60));

        let mut values = HashMap::new();
        values.insert("a".to_string(), json!(1));
        values.insert("b".to_string(), json!(2));
        cache.set_all(values, None).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let found = cache.get_all(&keys).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found["a"], json!(1));
    }

    #[tokio::test]
    async fn test_named_sets_deduplicate() {
        let cache = MemoryCache::new(100, Duration::from_secs(60));

        cache.set_add("deleted", &["x".to_string(), "y".to_string()]).await.unwrap();
        cache.set_add("deleted", &["y".to_string(), "z".to_string()]).await.unwrap();

        let members = cache.set_members("deleted").await.unwrap();
        assert_eq!(members, vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_null_cache_always_misses() {
        let cache = NullCache;
        cache.set("key", json!("value"), None).await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scoped_cache_isolates_scopes() {
        let inner = Arc::new(MemoryCache::new(100, Duration::from_secs(60)));
        let employees = ScopedCache::new(inner.clone(), "Employee");
        let orders = ScopedCache::new(inner.clone(), "Order");

        employees.set("1", json!("alice"), None).await.unwrap();
        assert_eq!(orders.get("1").await.unwrap(), None);
        assert_eq!(employees.get("1").await.unwrap(), Some(json!("alice")));

        // the underlying key carries the scope
        assert_eq!(inner.get("Employee:1").await.unwrap(), Some(json!("alice")));
    }
}
