//! Configuration for periodic cache housekeeping.

use std::fmt;

use super::trim::TrimLimits;

/// Configuration for [`Housekeeping`](crate::housekeeping::Housekeeping).
///
/// # Fields
///
/// - `limits`: Bounds passed to every trim
/// - `min_change_count` / `max_change_count`: Churn thresholds; a window
///   with at least both counts of changes suggests disabling the cache
/// - `clear_on_disable`: Empty the cache when housekeeping turns it off
#[derive(Clone, Copy)]
pub struct HousekeepingConfig {
    /// Bounds used for each trim.
    pub limits: TrimLimits,
    /// Lower churn threshold.
    pub min_change_count: Option<u64>,
    /// Upper churn threshold.
    pub max_change_count: Option<u64>,
    /// Clear the cache when it is disabled.
    pub clear_on_disable: bool,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            limits: TrimLimits::UNBOUNDED,
            min_change_count: None,
            max_change_count: None,
            clear_on_disable: true,
        }
    }
}

impl fmt::Debug for HousekeepingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HousekeepingConfig")
            .field("limits", &self.limits)
            .field("min_change_count", &self.min_change_count)
            .field("max_change_count", &self.max_change_count)
            .field("clear_on_disable", &self.clear_on_disable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_housekeeping_config_defaults() {
        let config = HousekeepingConfig::default();
        assert_eq!(config.limits, TrimLimits::UNBOUNDED);
        assert!(config.min_change_count.is_none());
        assert!(config.max_change_count.is_none());
        assert!(config.clear_on_disable);
    }
}
