use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Parameters that identify a request, ordered by name.
pub type QueryParams = BTreeMap<String, Value>;

/// Builds [`QueryParams`], skipping `None` values so optional filters drop out.
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    params: QueryParams,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        if !value.is_null() {
            self.params.insert(name.to_string(), value);
        }
        self
    }

    pub fn build(self) -> QueryParams {
        self.params
    }
}

/// Namespaced, deterministic cache key, e.g. `priceDistribution:{"region":"West"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(namespace: &str, params: &QueryParams) -> Self {
        // BTreeMap serializes in key order, so insertion order never matters.
        let body = serde_json::to_string(params).unwrap_or_default();
        CacheKey(format!("{namespace}:{body}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub capacity: usize,
    pub ttl: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy {
            capacity: 64,
            ttl: Some(Duration::from_secs(30 * 60)),
        }
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Per-view session cache bounded by entry count and age.
#[derive(Clone)]
pub struct FetchCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<CacheKey, CacheEntry<V>>>>,
    policy: CachePolicy,
}

impl<V> FetchCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_policy(CachePolicy::default())
    }

    pub fn with_policy(policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            policy,
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let mut cache = self.inner.lock().await;
        let expired = match cache.get(key) {
            None => {
                debug!(%key, "Cache MISS");
                return None;
            }
            Some(entry) => self
                .policy
                .ttl
                .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl),
        };

        if expired {
            trace!(%key, ttl = ?self.policy.ttl, "Cache entry expired");
            cache.remove(key);
            return None;
        }

        debug!(%key, "Cache HIT");
        cache.get(key).map(|entry| entry.value.clone())
    }

    pub async fn put(&self, key: CacheKey, value: V) {
        let mut cache = self.inner.lock().await;
        if self.policy.capacity == 0 {
            return;
        }

        if !cache.contains_key(&key) && cache.len() >= self.policy.capacity {
            let oldest = cache
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                trace!(key = %oldest, capacity = self.policy.capacity, "Cache EVICT");
                cache.remove(&oldest);
            }
        }

        debug!(%key, "Cache PUT");
        cache.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V> Default for FetchCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
