//! Configuration for the adaptive cache.
//!
//! # Examples
//!
//! ```
//! use script_containers::config::AdaptiveCacheConfig;
//! use script_containers::AdaptiveCache;
//!
//! // Untracked cache: trimming falls back to iteration order.
//! let config = AdaptiveCacheConfig {
//!     tracking: false,
//!     ..AdaptiveCacheConfig::default()
//! };
//! let cache: AdaptiveCache<&str, u32> = AdaptiveCache::init(config, None);
//! assert!(!cache.is_tracking_enabled());
//! ```

use std::fmt;
use std::time::Duration;

/// Default minimum time between two trims that actually run.
pub const DEFAULT_TRIM_INTERVAL: Duration = Duration::from_secs(60);

/// Default length of the churn observation window.
pub const DEFAULT_CHANGE_WINDOW: Duration = Duration::from_secs(30);

/// Configuration for an [`AdaptiveCache`](crate::AdaptiveCache).
///
/// # Fields
///
/// - `capacity`: Initial capacity hint for the base map (not a limit)
/// - `tracking`: Whether access tracking starts enabled
/// - `trim_interval`: Cooldown between trims; `None` disables the cooldown
/// - `change_window`: Churn observation window; `None` disables churn advice
#[derive(Clone, Copy)]
pub struct AdaptiveCacheConfig {
    /// Number of entries to preallocate room for.
    pub capacity: usize,
    /// Start with an [`EvictionTracker`](crate::tracker::EvictionTracker).
    pub tracking: bool,
    /// Minimum time after a trim before the next one may run.
    pub trim_interval: Option<Duration>,
    /// How long changes are counted before churn advice is given.
    pub change_window: Option<Duration>,
}

impl Default for AdaptiveCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            tracking: true,
            trim_interval: Some(DEFAULT_TRIM_INTERVAL),
            change_window: Some(DEFAULT_CHANGE_WINDOW),
        }
    }
}

impl fmt::Debug for AdaptiveCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveCacheConfig")
            .field("capacity", &self.capacity)
            .field("tracking", &self.tracking)
            .field("trim_interval", &self.trim_interval)
            .field("change_window", &self.change_window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = AdaptiveCacheConfig::default();
        assert_eq!(config.capacity, 0);
        assert!(config.tracking);
        assert_eq!(config.trim_interval, Some(Duration::from_secs(60)));
        assert_eq!(config.change_window, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_cache_config_override() {
        let config = AdaptiveCacheConfig {
            trim_interval: None,
            ..AdaptiveCacheConfig::default()
        };
        assert!(config.trim_interval.is_none());
        assert!(format!("{config:?}").contains("trim_interval: None"));
    }
}
