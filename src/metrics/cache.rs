//! Adaptive Cache Statistics
//!
//! Counters and watermarks kept by every cache. Trim, churn and watermark
//! fields are reset by `clear`; the hit/miss counters are reset only by
//! `reset_counters`.

use std::collections::BTreeMap;

use super::ContainerMetrics;
use crate::clock::Timestamp;

/// Statistics for an [`AdaptiveCache`](crate::AdaptiveCache).
///
/// Between resets every counter and watermark only grows.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStatistics {
    /// When the last trim that actually ran started.
    pub last_trim: Option<Timestamp>,

    /// How many entries that trim removed.
    pub last_trim_count: usize,

    /// Number of trims that ran.
    pub trim_count: u64,

    /// Total entries removed by trimming.
    pub trimmed_total: u64,

    /// Start of the current churn window, `None` until the first change.
    pub change_epoch: Option<Timestamp>,

    /// Structural changes (inserts, overwrites, removals) in the current window.
    pub change_count: u64,

    /// Largest entry count observed.
    pub max_size: usize,

    /// Largest per-key access count observed.
    pub max_access_count: u64,

    /// Successful `get`/`try_get` calls.
    pub hits: u64,

    /// `get`/`try_get` calls on absent keys.
    pub misses: u64,
}

impl CacheStatistics {
    /// Records a lookup that found its key.
    #[inline]
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a lookup on an absent key.
    #[inline]
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts one structural change, opening a churn window if none is open.
    #[inline]
    pub fn record_change(&mut self, now: Timestamp) {
        self.change_epoch.get_or_insert(now);
        self.change_count += 1;
    }

    /// Starts a fresh churn window at `now`.
    #[inline]
    pub fn restart_changes(&mut self, now: Option<Timestamp>) {
        self.change_epoch = now;
        self.change_count = 0;
    }

    /// Records a completed trim.
    pub fn record_trim(&mut self, at: Timestamp, removed: usize) {
        self.last_trim = Some(at);
        self.last_trim_count = removed;
        self.trim_count += 1;
        self.trimmed_total += removed as u64;
    }

    /// Raises the size watermark to `len` if it is higher.
    #[inline]
    pub fn observe_size(&mut self, len: usize) {
        self.max_size = self.max_size.max(len);
    }

    /// Raises the access-count watermark to `count` if it is higher.
    #[inline]
    pub fn observe_access_count(&mut self, count: u64) {
        self.max_access_count = self.max_access_count.max(count);
    }

    /// Resets everything `clear` resets, keeping hits and misses.
    pub fn reset(&mut self) {
        *self = CacheStatistics {
            hits: self.hits,
            misses: self.misses,
            ..CacheStatistics::default()
        };
    }

    /// Zeroes the hit and miss counters.
    pub fn reset_counters(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Fraction of lookups that hit, 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let requests = self.hits + self.misses;
        if requests > 0 {
            self.hits as f64 / requests as f64
        } else {
            0.0
        }
    }

    /// Converts the statistics to a BTreeMap for reporting.
    ///
    /// Unset timestamps are omitted rather than reported as zero.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("hits".to_string(), self.hits as f64);
        metrics.insert("misses".to_string(), self.misses as f64);
        metrics.insert("requests".to_string(), (self.hits + self.misses) as f64);
        metrics.insert("hit_rate".to_string(), self.hit_rate());

        metrics.insert("trim_count".to_string(), self.trim_count as f64);
        metrics.insert("last_trim_count".to_string(), self.last_trim_count as f64);
        metrics.insert("trimmed_total".to_string(), self.trimmed_total as f64);
        if let Some(at) = self.last_trim {
            metrics.insert("last_trim_nanos".to_string(), at.as_nanos() as f64);
        }

        metrics.insert("change_count".to_string(), self.change_count as f64);
        if let Some(at) = self.change_epoch {
            metrics.insert("change_epoch_nanos".to_string(), at.as_nanos() as f64);
        }

        metrics.insert("max_size".to_string(), self.max_size as f64);
        metrics.insert("max_access_count".to_string(), self.max_access_count as f64);

        metrics
    }
}

impl ContainerMetrics for CacheStatistics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn container_name(&self) -> &'static str {
        "AdaptiveCache"
    }
}
