use moka::future::Cache;
use moka::Expiry;
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Entry<V> {
    value: V,
    ttl: Duration,
}

struct PerEntryTtl;

impl<V> Expiry<String, Entry<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory get-or-compute cache with a TTL per entry.
///
/// Keys are prefixed with the owning scope, so several caches can share a
/// naming scheme without colliding. Concurrent misses on the same key are
/// coalesced: one caller runs `compute`, the others wait for its result.
pub struct TtlCache<V> {
    scope: String,
    inner: Cache<String, Entry<V>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(scope: impl Into<String>, max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self {
            scope: scope.into(),
            inner,
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}.{}", self.scope, key)
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.get(&self.scoped(key)).await.map(|e| e.value)
    }

    pub async fn get_or_compute<F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let key = self.scoped(key);
        self.inner
            .get_with(key, async move {
                let value = compute().await;
                Entry { value, ttl }
            })
            .await
            .value
    }
}

impl<T> TtlCache<Option<T>>
where
    T: Clone + Send + Sync + 'static,
{
    /// Same as [`TtlCache::get_or_compute`], except a `None` result is handed
    /// back without being stored, so the next call computes again.
    pub async fn get_or_compute_some<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let key = self.scoped(key);
        self.inner
            .optionally_get_with(key, async move {
                compute().await.map(|v| Entry {
                    value: Some(v),
                    ttl,
                })
            })
            .await
            .and_then(|e| e.value)
    }
}
