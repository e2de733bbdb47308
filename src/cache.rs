//! Adaptive Cache Implementation.
//!
//! An [`AdaptiveCache`] is a plain key/value map with three additions:
//!
//! - **Access tracking.** While tracking is enabled, every lookup and insert
//!   *touches* the key: its last access time and access count are recorded in
//!   an [`EvictionTracker`]. Tracking can be switched off at runtime, which
//!   discards everything it knew.
//! - **Trimming.** [`trim_excess`](AdaptiveCache::trim_excess) shrinks the
//!   cache back under a maximum size, preferring victims that are old and
//!   rarely (or suspiciously often) used. See [`crate::trim`] for the victim
//!   cascade.
//! - **Churn advice.** The cache counts structural changes over a sliding
//!   window. [`churn_advice`](AdaptiveCache::churn_advice) turns that count
//!   into a suggestion to enable or disable the cache.
//!
//! The cache never evicts on its own. Its owner decides when to trim and
//! what to do with churn advice, typically through
//! [`Housekeeping`](crate::housekeeping::Housekeeping).
//!
//! # Time
//!
//! All timing goes through an injected [`Clock`]. With the default
//! [`MonotonicClock`](crate::clock::MonotonicClock) two touches in quick
//! succession usually land in different time buckets; with a
//! [`ManualClock`](crate::clock::ManualClock) they share one until the clock
//! is advanced.
//!
//! # Performance Characteristics
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `get` / `try_get` / `set` / `remove` | O(1) map work + O(log B) bucket move |
//! | `trim_excess` | O(N) worst case (linear scans in later stages) |
//! | `churn_advice` | O(1) |
//!
//! B is the number of distinct access times currently tracked.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

use crate::clock::{default_clock, Clock, Timestamp};
use crate::config::{AdaptiveCacheConfig, TrimLimits};
use crate::error::{ContainerError, Result};
use crate::meta::AccessMeta;
use crate::metrics::{CacheStatistics, ContainerMetrics};
use crate::tracker::{EvictionTracker, Tracking};
use crate::trim::{select_victims, TrimOutcome};

/// Suggestion produced by [`AdaptiveCache::churn_advice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChurnAdvice {
    /// Nothing changed during a whole window; caching is cheap here.
    EnableSuggested,
    /// The cache changed at least as often as both thresholds.
    DisableSuggested,
    /// No window has elapsed, or the change count was unremarkable.
    NoOpinion,
}

/// A self-trimming, access-tracked key/value cache.
///
/// # Examples
///
/// ```
/// use script_containers::config::{AdaptiveCacheConfig, TrimLimits};
/// use script_containers::AdaptiveCache;
///
/// let mut cache: AdaptiveCache<&str, u32> =
///     AdaptiveCache::init(AdaptiveCacheConfig::default(), None);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.set("c", 3);
///
/// assert_eq!(cache.get("a"), Ok(&1));
/// assert_eq!(cache.access_meta("a").map(|meta| meta.access_count), Some(2));
///
/// assert_eq!(cache.trim_excess(&TrimLimits::with_max_count(2)), 1);
/// assert_eq!(cache.len(), 2);
/// ```
pub struct AdaptiveCache<K, V, S = DefaultHashBuilder> {
    /// Cooldown and churn window in effect.
    config: AdaptiveCacheConfig,

    /// The cached entries.
    map: HashMap<K, V, S>,

    /// Access tracking state, if enabled.
    tracking: Tracking<K, S>,

    /// Trim, churn and lookup counters.
    stats: CacheStatistics,

    clock: Arc<dyn Clock>,

    /// Kept to build a fresh tracker when tracking is re-enabled.
    hash_builder: S,
}

impl<K: Hash + Eq + Clone, V> AdaptiveCache<K, V, DefaultHashBuilder> {
    /// Creates a cache from `config`.
    ///
    /// `clock` defaults to a [`MonotonicClock`](crate::clock::MonotonicClock)
    /// started at construction time.
    pub fn init(config: AdaptiveCacheConfig, clock: Option<Arc<dyn Clock>>) -> Self {
        Self::with_hasher(config, clock, DefaultHashBuilder::default())
    }

    /// Creates a cache with the default configuration and clock.
    pub fn new() -> Self {
        Self::init(AdaptiveCacheConfig::default(), None)
    }
}

impl<K: Hash + Eq + Clone, V> Default for AdaptiveCache<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher + Clone> AdaptiveCache<K, V, S> {
    /// Creates a cache that hashes keys with `hash_builder`.
    ///
    /// # Examples
    ///
    /// ```
    /// use script_containers::config::AdaptiveCacheConfig;
    /// use script_containers::AdaptiveCache;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let cache: AdaptiveCache<String, u32, _> = AdaptiveCache::with_hasher(
    ///     AdaptiveCacheConfig::default(),
    ///     None,
    ///     RandomState::new(),
    /// );
    /// assert!(cache.is_empty());
    /// ```
    pub fn with_hasher(
        config: AdaptiveCacheConfig,
        clock: Option<Arc<dyn Clock>>,
        hash_builder: S,
    ) -> Self {
        let tracking = if config.tracking {
            Tracking::Enabled(EvictionTracker::with_hasher(
                config.capacity,
                hash_builder.clone(),
            ))
        } else {
            Tracking::Disabled
        };

        Self {
            config,
            map: HashMap::with_capacity_and_hasher(config.capacity, hash_builder.clone()),
            tracking,
            stats: CacheStatistics::default(),
            clock: clock.unwrap_or_else(default_clock),
            hash_builder,
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns `true` if `key` is present. Does not touch the key.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Returns the value for `key`, touching it.
    ///
    /// # Errors
    ///
    /// [`ContainerError::KeyNotFound`] if the key is absent.
    pub fn get<Q>(&mut self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.try_get(key).ok_or(ContainerError::KeyNotFound)
    }

    /// Returns the value for `key`, touching it, or `None` if absent.
    pub fn try_get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if !self.map.contains_key(key) {
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.touch_present(key);
        self.map.get(key)
    }

    /// Inserts or overwrites `key`, returning the previous value.
    ///
    /// Always touches the key (when tracking) and counts as one change.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let now = self.clock.now();

        if let Some(tracker) = self.tracking.tracker_mut() {
            let count = tracker.touch(key.clone(), now);
            self.stats.observe_access_count(count);
        }

        let previous = self.map.insert(key, value);
        self.stats.observe_size(self.map.len());
        self.stats.record_change(now);
        previous
    }

    /// Removes `key` and its access metadata.
    ///
    /// Returns `false` (and counts no change) if the key was absent.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.map.remove(key).is_none() {
            return false;
        }

        if let Some(tracker) = self.tracking.tracker_mut() {
            tracker.remove(key);
        }
        self.stats.record_change(self.clock.now());
        true
    }

    /// Removes every entry and resets the statistics (except hit/miss
    /// counters). Tracking stays enabled if it was.
    pub fn clear(&mut self) {
        self.map.clear();
        if let Some(tracker) = self.tracking.tracker_mut() {
            tracker.clear();
        }
        self.stats.reset();
    }

    /// Iterates entries in arbitrary order without touching them.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.map.iter()
    }

    /// Iterates keys in arbitrary order without touching them.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.map.keys()
    }

    /// Enables or disables access tracking.
    ///
    /// Disabling drops all access metadata. Enabling a disabled cache starts
    /// with no metadata; keys are picked up again as they are touched.
    /// Enabling an already tracking cache changes nothing.
    pub fn set_tracking_enabled(&mut self, enabled: bool) {
        match (enabled, self.tracking.is_enabled()) {
            (true, false) => {
                self.tracking = Tracking::Enabled(EvictionTracker::with_hasher(
                    self.map.len(),
                    self.hash_builder.clone(),
                ));
                tracing::debug!(entries = self.map.len(), "access tracking enabled");
            }
            (false, true) => {
                let dropped = self.tracking.tracker().map_or(0, EvictionTracker::len);
                self.tracking = Tracking::Disabled;
                tracing::debug!(dropped, "access tracking disabled");
            }
            _ => {}
        }
    }

    /// Returns `true` while access tracking is enabled.
    #[inline]
    pub fn is_tracking_enabled(&self) -> bool {
        self.tracking.is_enabled()
    }

    /// Returns the tracking state.
    #[inline]
    pub fn tracking(&self) -> &Tracking<K, S> {
        &self.tracking
    }

    /// Returns the access metadata for `key` without touching it.
    pub fn access_meta<Q>(&self, key: &Q) -> Option<&AccessMeta>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.tracking.tracker()?.meta(key)
    }

    /// Returns the trim cooldown.
    #[inline]
    pub fn trim_interval(&self) -> Option<Duration> {
        self.config.trim_interval
    }

    /// Changes the trim cooldown. `None` lets every trim run.
    #[inline]
    pub fn set_trim_interval(&mut self, interval: Option<Duration>) {
        self.config.trim_interval = interval;
    }

    /// Returns the churn window.
    #[inline]
    pub fn change_window(&self) -> Option<Duration> {
        self.config.change_window
    }

    /// Changes the churn window. `None` silences churn advice.
    #[inline]
    pub fn set_change_window(&mut self, window: Option<Duration>) {
        self.config.change_window = window;
    }

    /// Returns the cache statistics.
    #[inline]
    pub fn statistics(&self) -> &CacheStatistics {
        &self.stats
    }

    /// Zeroes the hit and miss counters.
    #[inline]
    pub fn reset_counters(&mut self) {
        self.stats.reset_counters();
    }

    /// Trims the cache back towards `limits.max_count`.
    ///
    /// Returns the number of entries removed. See
    /// [`trim_excess_detailed`](Self::trim_excess_detailed).
    pub fn trim_excess(&mut self, limits: &TrimLimits) -> usize {
        self.trim_excess_detailed(limits).removed
    }

    /// Trims the cache back towards `limits.max_count` and reports how.
    ///
    /// Nothing happens (and no trim is recorded) when:
    ///
    /// - `max_count` is `None` or the cache holds at most `max_count` entries
    /// - a previous trim ran no longer than the trim interval ago
    /// - the bounds leave nothing to remove
    ///
    /// Otherwise the number to remove is the excess over `max_count`, raised
    /// to `min_remove`, lowered to `max_remove` and lowered again so that at
    /// least `min_count` entries remain. Victims come from the cascade in
    /// [`crate::trim`].
    pub fn trim_excess_detailed(&mut self, limits: &TrimLimits) -> TrimOutcome {
        let mut outcome = TrimOutcome::default();

        let Some(max_count) = limits.max_count else {
            return outcome;
        };
        let before = self.map.len();
        if before <= max_count {
            return outcome;
        }

        let now = self.clock.now();
        if let (Some(interval), Some(last)) = (self.config.trim_interval, self.stats.last_trim) {
            if now.saturating_since(last) <= interval {
                tracing::trace!(%last, ?interval, "trim skipped during cooldown");
                return outcome;
            }
        }

        outcome.possible = before - max_count;
        let mut remove = outcome.possible;
        if let Some(min_remove) = limits.min_remove {
            remove = remove.max(min_remove);
        }
        if let Some(max_remove) = limits.max_remove {
            remove = remove.min(max_remove);
        }
        if let Some(min_count) = limits.min_count {
            remove = remove.min(before.saturating_sub(min_count));
        }
        if remove == 0 {
            return outcome;
        }
        outcome.requested = remove;

        let victims = select_victims(self.tracking.tracker(), self.map.keys(), limits, remove);
        outcome.stage = Some(victims.stage);

        for key in &victims.keys {
            if self.remove(key) {
                outcome.removed += 1;
            }
        }

        if outcome.removed != remove {
            tracing::debug!(
                min_access_count = ?limits.min_access_count,
                max_access_count = ?limits.max_access_count,
                requested = remove,
                found = victims.found,
                removed = outcome.removed,
                before,
                after = self.map.len(),
                trim_count = self.stats.trim_count,
                "trim removed a different number of entries than requested"
            );
        }

        self.stats.record_trim(now, outcome.removed);
        outcome
    }

    /// Reports whether the change rate suggests enabling or disabling the
    /// cache.
    ///
    /// Returns [`ChurnAdvice::NoOpinion`] without side effects when both
    /// thresholds are `None`, when the churn window is disabled, when no
    /// change has opened a window yet, or while the window is still open.
    /// Once the window has elapsed the advice is computed and a new window
    /// starts now with a zero count, whatever the advice.
    pub fn churn_advice(
        &mut self,
        min_change_count: Option<u64>,
        max_change_count: Option<u64>,
    ) -> ChurnAdvice {
        if min_change_count.is_none() && max_change_count.is_none() {
            return ChurnAdvice::NoOpinion;
        }
        let (Some(window), Some(epoch)) = (self.config.change_window, self.stats.change_epoch)
        else {
            return ChurnAdvice::NoOpinion;
        };

        let now = self.clock.now();
        if now.saturating_since(epoch) <= window {
            return ChurnAdvice::NoOpinion;
        }

        let changes = self.stats.change_count;
        let advice = if changes == 0 {
            ChurnAdvice::EnableSuggested
        } else if min_change_count.map_or(true, |min| changes >= min)
            && max_change_count.map_or(true, |max| changes >= max)
        {
            ChurnAdvice::DisableSuggested
        } else {
            ChurnAdvice::NoOpinion
        };

        self.stats.restart_changes(Some(now));
        tracing::debug!(changes, ?advice, "churn window elapsed");
        advice
    }

    /// Starts a new churn window now with a zero change count.
    pub fn restart_changes(&mut self) {
        let now = self.clock.now();
        self.stats.restart_changes(Some(now));
    }

    /// Verifies that the tracker agrees with the entries.
    ///
    /// # Errors
    ///
    /// [`ContainerError::InvalidOperation`] describing the first violation.
    pub fn check_invariants(&self) -> Result<()> {
        if let Some(tracker) = self.tracking.tracker() {
            tracker.check_invariants()?;
            if tracker.len() > self.map.len() {
                return Err(ContainerError::InvalidOperation(format!(
                    "{} tracked keys for {} entries",
                    tracker.len(),
                    self.map.len()
                )));
            }
            if tracker.iter().any(|(key, _)| !self.map.contains_key(key)) {
                return Err(ContainerError::InvalidOperation(
                    "tracked key missing from the cache".to_string(),
                ));
            }
            if let Some(over) = tracker
                .iter()
                .map(|(_, meta)| meta.access_count)
                .find(|count| *count > self.stats.max_access_count)
            {
                return Err(ContainerError::InvalidOperation(format!(
                    "access count {over} above watermark {}",
                    self.stats.max_access_count
                )));
            }
        }

        if self.map.len() > self.stats.max_size {
            return Err(ContainerError::InvalidOperation(format!(
                "{} entries above size watermark {}",
                self.map.len(),
                self.stats.max_size
            )));
        }

        Ok(())
    }

    /// Returns the current time of the cache's clock.
    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Touches a key known to be present, creating its metadata if this is
    /// its first touch since tracking was enabled.
    fn touch_present<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(tracker) = self.tracking.tracker_mut() else {
            return;
        };

        let now = self.clock.now();
        let count = match tracker.touch_existing(key, now) {
            Some(count) => count,
            None => match self.map.get_key_value(key) {
                Some((stored, _)) => tracker.touch(stored.clone(), now),
                None => return,
            },
        };
        self.stats.observe_access_count(count);
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher + Clone> ContainerMetrics for AdaptiveCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.stats.to_btreemap();
        metrics.insert("entries".to_string(), self.map.len() as f64);
        metrics.insert(
            "tracked_keys".to_string(),
            self.tracking.tracker().map_or(0, EvictionTracker::len) as f64,
        );
        metrics.insert(
            "time_buckets".to_string(),
            self.tracking
                .tracker()
                .map_or(0, EvictionTracker::bucket_count) as f64,
        );
        metrics
    }

    fn container_name(&self) -> &'static str {
        self.stats.container_name()
    }
}

impl<K, V, S> fmt::Debug for AdaptiveCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveCache")
            .field("len", &self.map.len())
            .field("tracking", &self.tracking)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::trim::TrimStage;

    fn cache_with_clock(tracking: bool) -> (AdaptiveCache<String, i32>, ManualClock) {
        let clock = ManualClock::new();
        let config = AdaptiveCacheConfig {
            tracking,
            ..AdaptiveCacheConfig::default()
        };
        let cache = AdaptiveCache::init(config, Some(Arc::new(clock.clone())));
        (cache, clock)
    }

    #[test]
    fn test_get_missing_key() {
        let (mut cache, _) = cache_with_clock(true);
        assert_eq!(cache.get("nope"), Err(ContainerError::KeyNotFound));
        assert_eq!(cache.try_get("nope"), None);
        assert_eq!(cache.statistics().misses, 2);
    }

    #[test]
    fn test_set_touches_and_counts_change() {
        let (mut cache, _) = cache_with_clock(true);
        assert_eq!(cache.set("a".to_string(), 1), None);
        assert_eq!(cache.set("a".to_string(), 2), Some(1));

        assert_eq!(cache.access_meta("a").unwrap().access_count, 2);
        assert_eq!(cache.statistics().change_count, 2);
        assert_eq!(cache.statistics().max_size, 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lazy_meta_after_enabling() {
        let (mut cache, clock) = cache_with_clock(false);
        cache.set("k".to_string(), 7);
        assert!(cache.access_meta("k").is_none());

        cache.set_tracking_enabled(true);
        clock.advance(Duration::from_secs(1));
        for _ in 0..3 {
            assert_eq!(cache.get("k"), Ok(&7));
        }

        let meta = cache.access_meta("k").unwrap();
        assert_eq!(meta.access_count, 3);
        assert_eq!(meta.last_access, Some(clock.now()));
        assert_eq!(cache.statistics().max_access_count, 3);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_disable_discards_metadata() {
        let (mut cache, _) = cache_with_clock(true);
        cache.set("x".to_string(), 1);
        cache.set_tracking_enabled(false);
        assert!(!cache.is_tracking_enabled());
        assert!(cache.access_meta("x").is_none());

        cache.set_tracking_enabled(true);
        assert!(cache.access_meta("x").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_enable_twice_keeps_metadata() {
        let (mut cache, _) = cache_with_clock(true);
        cache.set("x".to_string(), 1);
        cache.set_tracking_enabled(true);
        assert_eq!(cache.access_meta("x").unwrap().access_count, 1);
    }

    #[test]
    fn test_contains_key_does_not_touch() {
        let (mut cache, _) = cache_with_clock(true);
        cache.set("a".to_string(), 1);
        for _ in 0..3 {
            assert!(cache.contains_key("a"));
        }
        assert!(!cache.contains_key("b"));

        assert_eq!(cache.access_meta("a").unwrap().access_count, 1);
        assert_eq!(cache.statistics().hits, 0);
        assert_eq!(cache.statistics().misses, 0);
    }

    #[test]
    fn test_remove_absent_is_not_a_change() {
        let (mut cache, _) = cache_with_clock(true);
        assert!(!cache.remove("ghost"));
        assert_eq!(cache.statistics().change_count, 0);

        cache.set("real".to_string(), 1);
        assert!(cache.remove("real"));
        assert_eq!(cache.statistics().change_count, 2);
        assert!(cache.tracking().tracker().unwrap().is_empty());
    }

    #[test]
    fn test_clear_resets_statistics() {
        let (mut cache, _) = cache_with_clock(true);
        cache.set("a".to_string(), 1);
        let _ = cache.get("a");
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.is_tracking_enabled());
        assert_eq!(cache.statistics().change_count, 0);
        assert_eq!(cache.statistics().change_epoch, None);
        assert_eq!(cache.statistics().max_size, 0);
        assert_eq!(cache.statistics().hits, 1);
    }

    #[test]
    fn test_trim_respects_cooldown() {
        let (mut cache, clock) = cache_with_clock(false);
        for i in 0..10 {
            cache.set(format!("k{i}"), i);
        }

        assert_eq!(cache.trim_excess(&TrimLimits::with_max_count(8)), 2);
        assert_eq!(cache.trim_excess(&TrimLimits::with_max_count(5)), 0);

        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.trim_excess(&TrimLimits::with_max_count(5)), 0);

        clock.advance(Duration::from_nanos(1));
        assert_eq!(cache.trim_excess(&TrimLimits::with_max_count(5)), 3);
        assert_eq!(cache.statistics().trim_count, 2);
        assert_eq!(cache.statistics().last_trim_count, 3);
    }

    #[test]
    fn test_trim_clamps() {
        let (mut cache, _) = cache_with_clock(false);
        cache.set_trim_interval(None);
        for i in 0..10 {
            cache.set(format!("k{i}"), i);
        }

        let outcome = cache.trim_excess_detailed(&TrimLimits {
            min_remove: Some(3),
            ..TrimLimits::with_max_count(9)
        });
        assert_eq!(outcome.possible, 1);
        assert_eq!(outcome.requested, 3);
        assert_eq!(outcome.removed, 3);
        assert_eq!(outcome.stage, Some(TrimStage::First));

        let outcome = cache.trim_excess_detailed(&TrimLimits {
            min_count: Some(6),
            ..TrimLimits::with_max_count(2)
        });
        assert_eq!(outcome.requested, 1);
        assert_eq!(cache.len(), 6);

        let outcome = cache.trim_excess_detailed(&TrimLimits {
            min_count: Some(6),
            ..TrimLimits::with_max_count(2)
        });
        assert!(!outcome.ran());
        assert_eq!(cache.statistics().trim_count, 2);
    }

    #[test]
    fn test_trim_evicts_untouched_first() {
        let (mut cache, clock) = cache_with_clock(true);
        cache.set_trim_interval(None);
        for key in ["a", "b", "c", "d"] {
            cache.set(key.to_string(), 0);
            clock.advance(Duration::from_secs(1));
        }
        let _ = cache.get("a");

        let outcome = cache.trim_excess_detailed(&TrimLimits::with_max_count(3));
        assert_eq!(outcome.stage, Some(TrimStage::Oldest));
        assert!(!cache.contains_key("b"));
        assert!(cache.contains_key("a"));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_trim_counts_as_change() {
        let (mut cache, _) = cache_with_clock(false);
        for i in 0..4 {
            cache.set(format!("k{i}"), i);
        }
        cache.restart_changes();
        cache.trim_excess(&TrimLimits::with_max_count(2));
        assert_eq!(cache.statistics().change_count, 2);
    }

    #[test]
    fn test_churn_advice_window() {
        let (mut cache, clock) = cache_with_clock(true);
        assert_eq!(cache.churn_advice(Some(1), None), ChurnAdvice::NoOpinion);

        cache.restart_changes();
        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.churn_advice(Some(1), None), ChurnAdvice::NoOpinion);

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.churn_advice(Some(1), None), ChurnAdvice::EnableSuggested);

        for i in 0..5 {
            cache.set(format!("k{i}"), i);
        }
        clock.advance(Duration::from_secs(31));
        assert_eq!(cache.churn_advice(Some(3), Some(5)), ChurnAdvice::DisableSuggested);

        cache.set("one".to_string(), 1);
        clock.advance(Duration::from_secs(31));
        assert_eq!(cache.churn_advice(Some(3), Some(5)), ChurnAdvice::NoOpinion);
        assert_eq!(cache.statistics().change_count, 0);
    }

    #[test]
    fn test_churn_without_thresholds_keeps_window() {
        let (mut cache, clock) = cache_with_clock(true);
        cache.set("a".to_string(), 1);
        clock.advance(Duration::from_secs(120));
        assert_eq!(cache.churn_advice(None, None), ChurnAdvice::NoOpinion);
        assert_eq!(cache.statistics().change_count, 1);
    }

    #[test]
    fn test_metrics_report() {
        let (mut cache, _) = cache_with_clock(true);
        cache.set("a".to_string(), 1);
        let _ = cache.get("a");
        let _ = cache.get("b");

        let metrics = cache.metrics();
        assert_eq!(metrics["entries"], 1.0);
        assert_eq!(metrics["tracked_keys"], 1.0);
        assert_eq!(metrics["hits"], 1.0);
        assert_eq!(metrics["misses"], 1.0);
        assert_eq!(cache.container_name(), "AdaptiveCache");
    }
}
