//! Eviction Tracker
//!
//! The tracker records, for every key it knows about, the last access time and
//! the number of accesses ([`AccessMeta`]), and keeps a second, time-ordered
//! index from timestamp to the set of keys last touched at that instant. The
//! time index is what makes "oldest first" scans cheap: walking the
//! `BTreeMap` from its smallest key visits keys from least to most recently
//! used without sorting.
//!
//! ```text
//! accessed:  "a" -> (t1, 4)   "b" -> (t1, 1)   "c" -> (t3, 2)
//! buckets:   t1 -> {"a", "b"}    t3 -> {"c"}
//! ```
//!
//! # Invariants
//!
//! - A key is in at most one bucket, and that bucket's timestamp equals the
//!   key's `last_access`.
//! - No bucket is ever empty; a bucket is removed when its last key leaves.
//!
//! Every mutation moves a key between buckets in the same call that updates
//! its metadata, so both invariants hold between any two public calls.
//!
//! The tracker has its own lifecycle, independent of the container it
//! shadows. A cache holds it through [`Tracking`], which makes the
//! enabled/disabled state explicit instead of relying on empty maps.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::{HashMap, HashSet};

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::{HashMap, HashSet};

use crate::clock::Timestamp;
use crate::error::{ContainerError, Result};
use crate::meta::AccessMeta;

/// Access metadata plus the time-ordered bucket index for a set of keys.
pub struct EvictionTracker<K, S = DefaultHashBuilder> {
    /// Last access time and count per key.
    accessed: HashMap<K, AccessMeta, S>,

    /// Keys grouped by last access time, oldest bucket first.
    buckets: BTreeMap<Timestamp, HashSet<K, S>>,

    /// Hasher used for every bucket set.
    hash_builder: S,
}

impl<K: Hash + Eq + Clone> EvictionTracker<K, DefaultHashBuilder> {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::with_hasher(0, DefaultHashBuilder::default())
    }
}

impl<K: Hash + Eq + Clone> Default for EvictionTracker<K, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, S: BuildHasher + Clone> EvictionTracker<K, S> {
    /// Creates an empty tracker sized for `capacity` keys.
    pub fn with_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            accessed: HashMap::with_capacity_and_hasher(capacity, hash_builder.clone()),
            buckets: BTreeMap::new(),
            hash_builder,
        }
    }

    /// Number of tracked keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.accessed.len()
    }

    /// Returns `true` if no key is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.accessed.is_empty()
    }

    /// Number of distinct access times currently indexed.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the metadata recorded for `key`, if it is tracked.
    #[inline]
    pub fn meta<Q>(&self, key: &Q) -> Option<&AccessMeta>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.accessed.get(key)
    }

    /// Returns the time of the oldest bucket, if any key has been touched.
    #[inline]
    pub fn oldest_access(&self) -> Option<Timestamp> {
        self.buckets.keys().next().copied()
    }

    /// Records an access to `key` at `at`, starting to track it if needed.
    ///
    /// Returns the key's new access count.
    pub fn touch(&mut self, key: K, at: Timestamp) -> u64 {
        if let Some(meta) = self.accessed.get_mut(&key) {
            let previous = meta.touch(at);
            let count = meta.access_count;
            self.rebucket(key, previous, at);
            return count;
        }

        self.accessed.insert(key.clone(), AccessMeta::new(at, 1));
        self.rebucket(key, None, at);
        1
    }

    /// Records an access to `key` only if it is already tracked.
    ///
    /// Returns the new access count, or `None` if the key is untracked (in
    /// which case nothing changes).
    pub fn touch_existing<Q>(&mut self, key: &Q, at: Timestamp) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let meta = self.accessed.get_mut(key)?;
        let previous = meta.touch(at);
        let count = meta.access_count;
        if previous == Some(at) {
            return Some(count);
        }

        // Reuse the owned key from the old bucket; only clone when there was none.
        let stored = match previous.and_then(|from| self.take_from_bucket(key, from)) {
            Some(stored) => stored,
            None => match self.accessed.get_key_value(key) {
                Some((stored, _)) => stored.clone(),
                None => return Some(count),
            },
        };
        self.enter_bucket(stored, at);
        Some(count)
    }

    /// Stops tracking `key`, returning its last metadata.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<AccessMeta>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let meta = self.accessed.remove(key)?;
        if let Some(at) = meta.last_access {
            self.leave_bucket(key, at);
        }
        Some(meta)
    }

    /// Forgets every key. The tracker stays usable.
    pub fn clear(&mut self) {
        self.accessed.clear();
        self.buckets.clear();
    }

    /// Iterates tracked keys with their metadata, in hash order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &AccessMeta)> + '_ {
        self.accessed.iter()
    }

    /// Iterates buckets from the oldest access time to the newest.
    pub fn buckets(&self) -> impl Iterator<Item = (Timestamp, &HashSet<K, S>)> + '_ {
        self.buckets.iter().map(|(at, keys)| (*at, keys))
    }

    /// Verifies both bucket invariants.
    pub fn check_invariants(&self) -> Result<()> {
        let mut bucketed = 0usize;

        for (at, keys) in &self.buckets {
            if keys.is_empty() {
                return Err(ContainerError::InvalidOperation(format!(
                    "empty time bucket at {at}"
                )));
            }
            for key in keys {
                match self.accessed.get(key) {
                    Some(meta) if meta.last_access == Some(*at) => {}
                    Some(_) => {
                        return Err(ContainerError::InvalidOperation(format!(
                            "key in bucket {at} has a different last access time"
                        )));
                    }
                    None => {
                        return Err(ContainerError::InvalidOperation(format!(
                            "untracked key in bucket {at}"
                        )));
                    }
                }
            }
            bucketed += keys.len();
        }

        let timed = self
            .accessed
            .values()
            .filter(|meta| meta.last_access.is_some())
            .count();
        if timed != bucketed {
            return Err(ContainerError::InvalidOperation(format!(
                "{timed} timed keys but {bucketed} bucket entries"
            )));
        }

        Ok(())
    }

    /// Moves `key` from the bucket for `from` (if any) into the bucket for `to`.
    fn rebucket(&mut self, key: K, from: Option<Timestamp>, to: Timestamp) {
        if let Some(from) = from {
            if from == to {
                return;
            }
            self.leave_bucket(&key, from);
        }
        self.enter_bucket(key, to);
    }

    fn enter_bucket(&mut self, key: K, at: Timestamp) {
        let hash_builder = &self.hash_builder;
        self.buckets
            .entry(at)
            .or_insert_with(|| HashSet::with_hasher(hash_builder.clone()))
            .insert(key);
    }

    fn leave_bucket<Q>(&mut self, key: &Q, at: Timestamp)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take_from_bucket(key, at);
    }

    fn take_from_bucket<Q>(&mut self, key: &Q, at: Timestamp) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let keys = self.buckets.get_mut(&at)?;
        let taken = keys.take(key);
        if keys.is_empty() {
            self.buckets.remove(&at);
        }
        taken
    }
}

impl<K, S> Clone for EvictionTracker<K, S>
where
    K: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            accessed: self.accessed.clone(),
            buckets: self.buckets.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, S> fmt::Debug for EvictionTracker<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionTracker")
            .field("tracked", &self.accessed.len())
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

/// Whether a cache is currently recording accesses.
///
/// Disabling drops the tracker and everything it knew; enabling starts a new,
/// empty one. There is no way back to a discarded tracker.
pub enum Tracking<K, S = DefaultHashBuilder> {
    /// Accesses are recorded in the contained tracker.
    Enabled(EvictionTracker<K, S>),
    /// No access information is kept.
    Disabled,
}

impl<K, S> Tracking<K, S> {
    /// Returns `true` for [`Tracking::Enabled`].
    #[inline]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Tracking::Enabled(_))
    }

    /// Returns the tracker when enabled.
    #[inline]
    pub fn tracker(&self) -> Option<&EvictionTracker<K, S>> {
        match self {
            Tracking::Enabled(tracker) => Some(tracker),
            Tracking::Disabled => None,
        }
    }

    /// Returns the tracker mutably when enabled.
    #[inline]
    pub fn tracker_mut(&mut self) -> Option<&mut EvictionTracker<K, S>> {
        match self {
            Tracking::Enabled(tracker) => Some(tracker),
            Tracking::Disabled => None,
        }
    }
}

impl<K: Clone, S: Clone> Clone for Tracking<K, S> {
    fn clone(&self) -> Self {
        match self {
            Tracking::Enabled(tracker) => Tracking::Enabled(tracker.clone()),
            Tracking::Disabled => Tracking::Disabled,
        }
    }
}

impl<K, S> fmt::Debug for Tracking<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tracking::Enabled(tracker) => f.debug_tuple("Enabled").field(tracker).finish(),
            Tracking::Disabled => f.write_str("Disabled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(nanos: u64) -> Timestamp {
        Timestamp::from_nanos(nanos)
    }

    #[test]
    fn test_touch_creates_and_counts() {
        let mut tracker = EvictionTracker::new();
        assert_eq!(tracker.touch("a", ts(1)), 1);
        assert_eq!(tracker.touch("a", ts(2)), 2);
        assert_eq!(tracker.touch("b", ts(2)), 1);

        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.bucket_count(), 1);
        assert_eq!(tracker.meta("a").unwrap().access_count, 2);
        assert_eq!(tracker.oldest_access(), Some(ts(2)));
        tracker.check_invariants().unwrap();
    }

    #[test]
    fn test_touch_moves_between_buckets() {
        let mut tracker = EvictionTracker::new();
        tracker.touch("a", ts(1));
        tracker.touch("b", ts(1));
        tracker.touch("a", ts(5));

        let buckets: Vec<_> = tracker
            .buckets()
            .map(|(at, keys)| (at, keys.len()))
            .collect();
        assert_eq!(buckets, vec![(ts(1), 1), (ts(5), 1)]);

        // Moving the last key out of a bucket deletes the bucket.
        tracker.touch("b", ts(7));
        assert_eq!(tracker.oldest_access(), Some(ts(5)));
        assert_eq!(tracker.bucket_count(), 2);
        tracker.check_invariants().unwrap();
    }

    #[test]
    fn test_touch_same_timestamp_keeps_bucket() {
        let mut tracker = EvictionTracker::new();
        tracker.touch("a", ts(3));
        tracker.touch("a", ts(3));
        assert_eq!(tracker.bucket_count(), 1);
        assert_eq!(tracker.meta("a").unwrap().access_count, 2);
        tracker.check_invariants().unwrap();
    }

    #[test]
    fn test_touch_existing_ignores_untracked() {
        let mut tracker: EvictionTracker<String> = EvictionTracker::new();
        assert_eq!(tracker.touch_existing("missing", ts(1)), None);
        assert!(tracker.is_empty());

        tracker.touch("x".to_string(), ts(1));
        assert_eq!(tracker.touch_existing("x", ts(2)), Some(2));
        assert_eq!(tracker.meta("x").unwrap().last_access, Some(ts(2)));
        tracker.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_cleans_bucket() {
        let mut tracker = EvictionTracker::new();
        tracker.touch(1u32, ts(1));
        tracker.touch(2u32, ts(2));

        let meta = tracker.remove(&1).unwrap();
        assert_eq!(meta.access_count, 1);
        assert_eq!(tracker.bucket_count(), 1);
        assert_eq!(tracker.remove(&1), None);
        tracker.check_invariants().unwrap();
    }

    #[test]
    fn test_clear() {
        let mut tracker = EvictionTracker::new();
        tracker.touch('a', ts(1));
        tracker.clear();
        assert!(tracker.is_empty());
        assert_eq!(tracker.bucket_count(), 0);
        tracker.touch('a', ts(2));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_tracking_sum_type() {
        let mut tracking: Tracking<&str> = Tracking::Enabled(EvictionTracker::new());
        assert!(tracking.is_enabled());
        tracking.tracker_mut().unwrap().touch("k", ts(1));
        assert_eq!(tracking.tracker().unwrap().len(), 1);

        tracking = Tracking::Disabled;
        assert!(!tracking.is_enabled());
        assert!(tracking.tracker().is_none());
    }
}
