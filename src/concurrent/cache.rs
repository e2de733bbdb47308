//! Thread-safe adaptive cache.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use parking_lot::Mutex;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

use crate::cache::{AdaptiveCache, ChurnAdvice};
use crate::clock::Clock;
use crate::config::{AdaptiveCacheConfig, TrimLimits};
use crate::error::Result;
use crate::housekeeping::{Housekeeping, HousekeepingReport};
use crate::meta::AccessMeta;
use crate::metrics::{CacheStatistics, ContainerMetrics};
use crate::trim::TrimOutcome;

/// An [`AdaptiveCache`] behind a single `parking_lot::Mutex`.
///
/// Every method locks once. Values are returned as clones so that no lock
/// is held after a call returns; use [`get_with`](Self::get_with) to read a
/// value in place.
pub struct ConcurrentAdaptiveCache<K, V, S = DefaultHashBuilder> {
    inner: Mutex<AdaptiveCache<K, V, S>>,
}

impl<K: Hash + Eq + Clone, V> ConcurrentAdaptiveCache<K, V, DefaultHashBuilder> {
    /// Creates a cache from `config`, see [`AdaptiveCache::init`].
    pub fn init(config: AdaptiveCacheConfig, clock: Option<Arc<dyn Clock>>) -> Self {
        Self::from_cache(AdaptiveCache::init(config, clock))
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher + Clone> ConcurrentAdaptiveCache<K, V, S> {
    /// Creates a cache with a custom hash builder.
    pub fn with_hasher(
        config: AdaptiveCacheConfig,
        clock: Option<Arc<dyn Clock>>,
        hash_builder: S,
    ) -> Self {
        Self::from_cache(AdaptiveCache::with_hasher(config, clock, hash_builder))
    }

    /// Wraps an existing cache.
    pub fn from_cache(cache: AdaptiveCache<K, V, S>) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }

    /// Unwraps the cache.
    pub fn into_inner(self) -> AdaptiveCache<K, V, S> {
        self.inner.into_inner()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Returns `true` if `key` is present. Does not touch the key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().contains_key(key)
    }

    /// Returns a clone of the value for `key`, touching it.
    ///
    /// # Errors
    ///
    /// [`ContainerError::KeyNotFound`](crate::ContainerError::KeyNotFound)
    /// if the key is absent.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Returns a clone of the value for `key`, touching it.
    pub fn try_get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.inner.lock().try_get(key).cloned()
    }

    /// Applies `f` to the value for `key` under the lock, touching it.
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        self.inner.lock().try_get(key).map(f)
    }

    /// Inserts or overwrites `key`, returning the previous value.
    pub fn set(&self, key: K, value: V) -> Option<V> {
        self.inner.lock().set(key, value)
    }

    /// Removes `key`. Returns `false` if it was absent.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().remove(key)
    }

    /// Removes every entry, see [`AdaptiveCache::clear`].
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Enables or disables access tracking.
    pub fn set_tracking_enabled(&self, enabled: bool) {
        self.inner.lock().set_tracking_enabled(enabled);
    }

    /// Returns `true` while access tracking is enabled.
    pub fn is_tracking_enabled(&self) -> bool {
        self.inner.lock().is_tracking_enabled()
    }

    /// Returns a copy of the access metadata for `key`.
    pub fn access_meta<Q>(&self, key: &Q) -> Option<AccessMeta>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().access_meta(key).copied()
    }

    /// Trims the cache, see [`AdaptiveCache::trim_excess`].
    pub fn trim_excess(&self, limits: &TrimLimits) -> usize {
        self.inner.lock().trim_excess(limits)
    }

    /// Trims the cache, see [`AdaptiveCache::trim_excess_detailed`].
    pub fn trim_excess_detailed(&self, limits: &TrimLimits) -> TrimOutcome {
        self.inner.lock().trim_excess_detailed(limits)
    }

    /// Returns churn advice, see [`AdaptiveCache::churn_advice`].
    pub fn churn_advice(
        &self,
        min_change_count: Option<u64>,
        max_change_count: Option<u64>,
    ) -> ChurnAdvice {
        self.inner
            .lock()
            .churn_advice(min_change_count, max_change_count)
    }

    /// Starts a new churn window.
    pub fn restart_changes(&self) {
        self.inner.lock().restart_changes();
    }

    /// Runs one housekeeping pass under a single lock.
    pub fn run_housekeeping(&self, housekeeping: &mut Housekeeping) -> HousekeepingReport {
        let mut cache = self.inner.lock();
        housekeeping.run(&mut *cache)
    }

    /// Returns a copy of the statistics.
    pub fn statistics(&self) -> CacheStatistics {
        self.inner.lock().statistics().clone()
    }

    /// Zeroes the hit and miss counters.
    pub fn reset_counters(&self) {
        self.inner.lock().reset_counters();
    }

    /// Verifies the tracker against the entries.
    pub fn check_invariants(&self) -> Result<()> {
        self.inner.lock().check_invariants()
    }

    /// Runs `f` with exclusive access to the cache.
    pub fn with_lock<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AdaptiveCache<K, V, S>) -> R,
    {
        let mut cache = self.inner.lock();
        f(&mut *cache)
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher + Clone> ContainerMetrics
    for ConcurrentAdaptiveCache<K, V, S>
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.inner.lock().metrics()
    }

    fn container_name(&self) -> &'static str {
        "ConcurrentAdaptiveCache"
    }
}

impl<K, V, S> fmt::Debug for ConcurrentAdaptiveCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(cache) => f
                .debug_struct("ConcurrentAdaptiveCache")
                .field("inner", &*cache)
                .finish(),
            None => f
                .debug_struct("ConcurrentAdaptiveCache")
                .field("inner", &"<locked>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ContainerError;
    use std::thread;

    fn shared() -> Arc<ConcurrentAdaptiveCache<String, usize>> {
        Arc::new(ConcurrentAdaptiveCache::init(
            AdaptiveCacheConfig::default(),
            Some(Arc::new(ManualClock::new())),
        ))
    }

    #[test]
    fn test_basic_operations() {
        let cache = shared();
        assert_eq!(cache.set("a".to_string(), 1), None);
        assert_eq!(cache.get("a"), Ok(1));
        assert_eq!(cache.get("b"), Err(ContainerError::KeyNotFound));
        assert_eq!(cache.get_with("a", |v| v * 10), Some(10));
        assert_eq!(cache.access_meta("a").map(|m| m.access_count), Some(3));
        assert!(cache.remove("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_parallel_writers() {
        let cache = shared();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..250 {
                        cache.set(format!("{t}-{i}"), i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.statistics().change_count, 1000);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_with_lock_compound() {
        let cache = shared();
        let inserted = cache.with_lock(|inner| {
            if inner.contains_key("k") {
                false
            } else {
                inner.set("k".to_string(), 5);
                true
            }
        });
        assert!(inserted);
        assert_eq!(cache.metrics()["entries"], 1.0);
        assert_eq!(cache.container_name(), "ConcurrentAdaptiveCache");
    }
}
