//! Trim Victim Selection
//!
//! Picks the keys a trim removes. Candidates come from up to three stages,
//! each run only while the previous ones found fewer keys than needed:
//!
//! | Stage | Source | Order |
//! |-------|--------|-------|
//! | [`TrimStage::Worst`] | tracked keys with an out-of-range access count | oldest bucket first |
//! | [`TrimStage::Oldest`] | every tracked key, whole buckets at a time | oldest bucket first |
//! | [`TrimStage::First`] | every key in the cache | cache iteration order |
//!
//! The first stage only runs when an access-count bound is given, and the
//! first two only when tracking is enabled. Keys found by an earlier stage
//! are not added twice.
//!
//! There is no separate age-blind pass over out-of-range keys. Every tracked
//! key sits in exactly one time bucket, so when the worst stage comes up
//! short it has already seen every out-of-range key there is.
//!
//! A stage may overshoot: [`TrimStage::Oldest`] always takes a whole bucket.
//! The surplus is dropped from the end, so the victims are the first keys
//! found, not the worst ones overall.

use std::fmt;
use std::hash::{BuildHasher, Hash};

#[cfg(feature = "hashbrown")]
use hashbrown::HashSet;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashSet;

use crate::config::TrimLimits;
use crate::tracker::EvictionTracker;

/// The cascade stage that supplied the last victims of a trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrimStage {
    /// Keys with an out-of-range access count, oldest first.
    Worst,
    /// Least recently used keys.
    Oldest,
    /// Cache iteration order.
    First,
}

impl fmt::Display for TrimStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrimStage::Worst => "worst",
            TrimStage::Oldest => "oldest",
            TrimStage::First => "first",
        };
        f.write_str(name)
    }
}

/// What a call to
/// [`AdaptiveCache::trim_excess_detailed`](crate::AdaptiveCache::trim_excess_detailed)
/// did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimOutcome {
    /// Entries actually removed.
    pub removed: usize,
    /// Entries the trim tried to remove after applying every bound.
    pub requested: usize,
    /// Excess over `max_count` before the removal bounds were applied.
    pub possible: usize,
    /// Deepest stage consulted, `None` when no trim ran.
    pub stage: Option<TrimStage>,
}

impl TrimOutcome {
    /// Returns `true` if the trim ran (even if it removed nothing).
    #[inline]
    pub fn ran(&self) -> bool {
        self.stage.is_some()
    }
}

/// Keys chosen for removal by [`select_victims`].
#[derive(Debug)]
pub(crate) struct Victims<K> {
    /// Keys to remove, at most the requested number.
    pub keys: Vec<K>,
    /// Candidates found before truncation.
    pub found: usize,
    /// Deepest stage run.
    pub stage: TrimStage,
}

/// Candidate list with first-seen order and no duplicates.
struct Candidates<'a, K> {
    keys: Vec<&'a K>,
    seen: HashSet<&'a K>,
    limit: usize,
}

impl<'a, K: Hash + Eq> Candidates<'a, K> {
    fn new(limit: usize) -> Self {
        Self {
            keys: Vec::with_capacity(limit),
            seen: HashSet::with_capacity(limit),
            limit,
        }
    }

    #[inline]
    fn push(&mut self, key: &'a K) {
        if self.seen.insert(key) {
            self.keys.push(key);
        }
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.keys.len() >= self.limit
    }
}

/// Runs the cascade until `limit` candidates are found or every stage ran.
///
/// `base_keys` is only iterated if the last stage is reached.
pub(crate) fn select_victims<'a, K, S, I>(
    tracker: Option<&'a EvictionTracker<K, S>>,
    base_keys: I,
    limits: &TrimLimits,
    limit: usize,
) -> Victims<K>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Clone,
    I: IntoIterator<Item = &'a K>,
{
    let mut candidates = Candidates::new(limit);
    let mut stage = TrimStage::First;

    if let Some(tracker) = tracker {
        let (min, max) = (limits.min_access_count, limits.max_access_count);

        if limits.has_access_range() {
            stage = TrimStage::Worst;
            'buckets: for (_, keys) in tracker.buckets() {
                for key in keys {
                    if tracker
                        .meta(key)
                        .is_some_and(|meta| meta.is_out_of_range(min, max))
                    {
                        candidates.push(key);
                        if candidates.is_full() {
                            break 'buckets;
                        }
                    }
                }
            }
        }

        if !candidates.is_full() {
            stage = TrimStage::Oldest;
            for (_, keys) in tracker.buckets() {
                keys.iter().for_each(|key| candidates.push(key));
                if candidates.is_full() {
                    break;
                }
            }
        }

        if candidates.is_full() {
            return finish(candidates, stage);
        }
    }

    stage = TrimStage::First;
    for key in base_keys {
        candidates.push(key);
        if candidates.is_full() {
            break;
        }
    }

    finish(candidates, stage)
}

fn finish<K: Clone>(candidates: Candidates<'_, K>, stage: TrimStage) -> Victims<K> {
    let Candidates { keys, limit, .. } = candidates;
    let found = keys.len();
    let keys = keys.into_iter().take(limit).cloned().collect();

    Victims { keys, found, stage }
}
