//! Periodic Cache Housekeeping
//!
//! A cache owner usually wants two things done every so often: trim the
//! cache back under its size limit, and stop using the cache while it churns
//! too much (start again once it calms down). [`Housekeeping`] does both
//! with one call to [`run`](Housekeeping::run) and keeps the "is the cache in
//! use" flag the owner consults before each lookup.
//!
//! When housekeeping turns the cache off it can also clear it, and it opens
//! a fresh churn window so that a quiet window later suggests turning the
//! cache back on.
//!
//! # Examples
//!
//! ```
//! use script_containers::clock::ManualClock;
//! use script_containers::config::{AdaptiveCacheConfig, HousekeepingConfig, TrimLimits};
//! use script_containers::housekeeping::Housekeeping;
//! use script_containers::AdaptiveCache;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut cache: AdaptiveCache<u32, u32> =
//!     AdaptiveCache::init(AdaptiveCacheConfig::default(), Some(Arc::new(clock.clone())));
//! let mut housekeeping = Housekeeping::new(HousekeepingConfig {
//!     limits: TrimLimits::with_max_count(100),
//!     min_change_count: Some(50),
//!     ..HousekeepingConfig::default()
//! });
//!
//! for i in 0..60 {
//!     cache.set(i, i);
//! }
//! clock.advance(Duration::from_secs(31));
//!
//! let report = housekeeping.run(&mut cache);
//! assert!(!report.enabled);
//! assert_eq!(report.cleared, 60);
//! assert!(cache.is_empty());
//! ```

use std::hash::{BuildHasher, Hash};

use crate::cache::{AdaptiveCache, ChurnAdvice};
use crate::config::HousekeepingConfig;
use crate::trim::TrimOutcome;

/// What one housekeeping pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HousekeepingReport {
    /// Result of the trim (a default outcome when the cache was off).
    pub trim: TrimOutcome,
    /// Churn advice returned by the cache.
    pub advice: ChurnAdvice,
    /// Whether the cache was in use before the pass.
    pub was_enabled: bool,
    /// Whether the cache is in use after the pass.
    pub enabled: bool,
    /// Entries dropped because the cache was turned off.
    pub cleared: usize,
}

impl HousekeepingReport {
    /// Returns `true` if the pass turned the cache on or off.
    #[inline]
    pub fn toggled(&self) -> bool {
        self.was_enabled != self.enabled
    }
}

/// Trims a cache and turns it on or off following its churn advice.
#[derive(Debug, Clone)]
pub struct Housekeeping {
    config: HousekeepingConfig,
    enabled: bool,
}

impl Housekeeping {
    /// Creates a driver for a cache that starts in use.
    pub fn new(config: HousekeepingConfig) -> Self {
        Self {
            config,
            enabled: true,
        }
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &HousekeepingConfig {
        &self.config
    }

    /// Returns `true` while the cache should be consulted.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Overrides the in-use flag.
    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Runs one pass: trim (only while in use), then apply churn advice.
    pub fn run<K, V, S>(&mut self, cache: &mut AdaptiveCache<K, V, S>) -> HousekeepingReport
    where
        K: Hash + Eq + Clone,
        S: BuildHasher + Clone,
    {
        let was_enabled = self.enabled;
        let trim = if was_enabled {
            cache.trim_excess_detailed(&self.config.limits)
        } else {
            TrimOutcome::default()
        };

        let advice = cache.churn_advice(self.config.min_change_count, self.config.max_change_count);
        let mut cleared = 0;

        match advice {
            ChurnAdvice::DisableSuggested if was_enabled => {
                self.enabled = false;
                if self.config.clear_on_disable {
                    cleared = cache.len();
                    cache.clear();
                    cache.restart_changes();
                }
                tracing::debug!(cleared, "cache disabled after excess churn");
            }
            ChurnAdvice::EnableSuggested if !was_enabled => {
                self.enabled = true;
                tracing::debug!("cache enabled after a quiet window");
            }
            _ => {}
        }

        HousekeepingReport {
            trim,
            advice,
            was_enabled,
            enabled: self.enabled,
            cleared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{AdaptiveCacheConfig, TrimLimits};
    use std::sync::Arc;
    use std::time::Duration;

    fn setup(config: HousekeepingConfig) -> (Housekeeping, AdaptiveCache<u32, u32>, ManualClock) {
        let clock = ManualClock::new();
        let cache = AdaptiveCache::init(
            AdaptiveCacheConfig::default(),
            Some(Arc::new(clock.clone())),
        );
        (Housekeeping::new(config), cache, clock)
    }

    #[test]
    fn test_trims_while_enabled() {
        let (mut housekeeping, mut cache, _) = setup(HousekeepingConfig {
            limits: TrimLimits::with_max_count(5),
            ..HousekeepingConfig::default()
        });
        for i in 0..8 {
            cache.set(i, i);
        }

        let report = housekeeping.run(&mut cache);
        assert_eq!(report.trim.removed, 3);
        assert_eq!(report.advice, ChurnAdvice::NoOpinion);
        assert!(!report.toggled());
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn test_disable_then_reenable() {
        let (mut housekeeping, mut cache, clock) = setup(HousekeepingConfig {
            min_change_count: Some(3),
            ..HousekeepingConfig::default()
        });
        for i in 0..4 {
            cache.set(i, i);
        }
        clock.advance(Duration::from_secs(31));

        let report = housekeeping.run(&mut cache);
        assert_eq!(report.advice, ChurnAdvice::DisableSuggested);
        assert!(report.toggled());
        assert!(!housekeeping.is_enabled());
        assert_eq!(report.cleared, 4);

        // A quiet window suggests turning the cache back on.
        clock.advance(Duration::from_secs(31));
        let report = housekeeping.run(&mut cache);
        assert_eq!(report.advice, ChurnAdvice::EnableSuggested);
        assert!(report.enabled);
    }

    #[test]
    fn test_disable_without_clearing() {
        let (mut housekeeping, mut cache, clock) = setup(HousekeepingConfig {
            max_change_count: Some(2),
            clear_on_disable: false,
            ..HousekeepingConfig::default()
        });
        cache.set(1, 1);
        cache.set(2, 2);
        clock.advance(Duration::from_secs(31));

        let report = housekeeping.run(&mut cache);
        assert!(!report.enabled);
        assert_eq!(report.cleared, 0);
        assert_eq!(cache.len(), 2);
    }
}
