//! Per-Key Access Metadata
//!
//! The eviction tracker keeps one [`AccessMeta`] per tracked key: when the key
//! was last touched and how many times it has been touched since tracking
//! began (or since the key was inserted, whichever is later).
//!
//! # Usage
//!
//! ```
//! use script_containers::meta::AccessMeta;
//! use script_containers::clock::Timestamp;
//!
//! let mut meta = AccessMeta::default();
//! assert_eq!(meta.access_count, 0);
//! assert!(meta.last_access.is_none());
//!
//! let previous = meta.touch(Timestamp::from_nanos(10));
//! assert!(previous.is_none());
//! assert_eq!(meta.access_count, 1);
//! assert_eq!(meta.last_access, Some(Timestamp::from_nanos(10)));
//! ```

use crate::clock::Timestamp;

/// Last access time and access count for one tracked key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessMeta {
    /// Time of the most recent touch, `None` if the key was never touched.
    pub last_access: Option<Timestamp>,
    /// Number of touches recorded for the key.
    pub access_count: u64,
}

impl AccessMeta {
    /// Creates metadata for a key touched `access_count` times, last at `at`.
    #[inline]
    pub fn new(at: Timestamp, access_count: u64) -> Self {
        Self {
            last_access: Some(at),
            access_count,
        }
    }

    /// Records one access at `at` and returns the previous access time.
    ///
    /// The caller uses the returned time to move the key between time
    /// buckets.
    #[inline]
    pub fn touch(&mut self, at: Timestamp) -> Option<Timestamp> {
        self.access_count = self.access_count.saturating_add(1);
        self.last_access.replace(at)
    }

    /// Returns `true` if the access count lies outside `[min, max]`.
    ///
    /// A `None` bound is unbounded on that side, so with both bounds unset
    /// no key is ever out of range.
    #[inline]
    pub fn is_out_of_range(&self, min: Option<u64>, max: Option<u64>) -> bool {
        min.is_some_and(|min| self.access_count < min)
            || max.is_some_and(|max| self.access_count > max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_returns_previous_time() {
        let mut meta = AccessMeta::new(Timestamp::from_nanos(5), 1);
        assert_eq!(
            meta.touch(Timestamp::from_nanos(9)),
            Some(Timestamp::from_nanos(5))
        );
        assert_eq!(meta.access_count, 2);
        assert_eq!(meta.last_access, Some(Timestamp::from_nanos(9)));
    }

    #[test]
    fn test_out_of_range() {
        let meta = AccessMeta::new(Timestamp::from_nanos(0), 3);

        assert!(!meta.is_out_of_range(None, None));
        assert!(!meta.is_out_of_range(Some(3), Some(3)));
        assert!(meta.is_out_of_range(Some(4), None));
        assert!(meta.is_out_of_range(None, Some(2)));
        assert!(!meta.is_out_of_range(Some(1), None));
    }
}
