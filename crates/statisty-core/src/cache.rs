//! Time-bounded memoization for provider lookups.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Defines how a single lookup interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a fresh entry if present, otherwise compute and store. (Default)
    #[default]
    Use,
    /// Always compute and overwrite the stored entry.
    Refresh,
    /// Compute without reading or writing the cache.
    Bypass,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

type Slot<V> = Arc<Mutex<Option<CacheEntry<V>>>>;

/// Keyed TTL cache with one async lock per key.
///
/// Concurrent misses on the same key run the producer once; the others wait
/// on that key's lock and then read the stored value. Different keys never
/// wait on each other. Expired entries stay in the map until the key is
/// written again or [`TtlCache::clear_expired`] runs.
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    slots: DashMap<K, Slot<V>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            default_ttl,
        }
    }

    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the cached value for `key` if younger than `ttl`, otherwise
    /// awaits `producer` and stores its output.
    ///
    /// # Errors
    ///
    /// Producer errors are returned unchanged and nothing is stored, so the
    /// next call for the key runs the producer again.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, ttl: Duration, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_compute_with(key, ttl, CacheMode::Use, producer)
            .await
    }

    pub async fn get_or_compute_with<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        mode: CacheMode,
        producer: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if mode == CacheMode::Bypass {
            return producer().await;
        }

        let slot = self.slot(key.clone());
        let mut entry = slot.lock().await;

        if mode == CacheMode::Use {
            if let Some(cached) = entry.as_ref().filter(|cached| cached.is_fresh(ttl)) {
                tracing::debug!(key = ?key, "cache hit");
                return Ok(cached.value.clone());
            }
        }

        tracing::debug!(key = ?key, mode = ?mode, "cache miss");
        let value = producer().await?;
        *entry = Some(CacheEntry {
            value: value.clone(),
            inserted_at: Instant::now(),
        });
        Ok(value)
    }

    /// Fresh value for `key`, if any. Waits while a producer runs for the key.
    pub async fn get(&self, key: &K, ttl: Duration) -> Option<V> {
        let slot = self.slots.get(key).map(|slot| Arc::clone(slot.value()))?;
        let entry = slot.lock().await;
        entry
            .as_ref()
            .filter(|cached| cached.is_fresh(ttl))
            .map(|cached| cached.value.clone())
    }

    pub fn invalidate(&self, key: &K) {
        self.slots.remove(key);
    }

    /// Drops entries older than `ttl`. Slots with a producer in flight are kept.
    pub fn clear_expired(&self, ttl: Duration) {
        self.slots.retain(|_, slot| match slot.try_lock() {
            Ok(entry) => entry.as_ref().is_some_and(|cached| cached.is_fresh(ttl)),
            Err(_) => true,
        });
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, key: K) -> Slot<V> {
        Arc::clone(self.slots.entry(key).or_default().value())
    }
}
