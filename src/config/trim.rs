//! Bounds for a single trim pass.
//!
//! A trim removes `len - max_count` entries, adjusted by the other bounds in
//! this order:
//!
//! 1. raised to `min_remove`
//! 2. lowered to `max_remove`
//! 3. lowered so that at least `min_count` entries remain
//!
//! `min_access_count` and `max_access_count` define the "acceptable" access
//! count range; tracked keys outside it are preferred victims.

use std::fmt;

/// The six bounds accepted by
/// [`AdaptiveCache::trim_excess`](crate::AdaptiveCache::trim_excess).
///
/// Every bound is optional and `None` means unbounded. With `max_count`
/// unset a trim never runs.
///
/// # Examples
///
/// ```
/// use script_containers::config::TrimLimits;
///
/// let limits = TrimLimits {
///     max_remove: Some(10),
///     min_access_count: Some(2),
///     ..TrimLimits::with_max_count(100)
/// };
/// assert_eq!(limits.max_count, Some(100));
/// assert_eq!(limits.min_count, None);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimLimits {
    /// Never trim below this many entries.
    pub min_count: Option<usize>,
    /// Trim only when the cache holds more than this many entries.
    pub max_count: Option<usize>,
    /// Remove at least this many entries once a trim runs.
    pub min_remove: Option<usize>,
    /// Remove at most this many entries per trim.
    pub max_remove: Option<usize>,
    /// Keys touched fewer times than this are preferred victims.
    pub min_access_count: Option<u64>,
    /// Keys touched more times than this are preferred victims.
    pub max_access_count: Option<u64>,
}

impl TrimLimits {
    /// No bounds at all. Trimming with these limits is a no-op.
    pub const UNBOUNDED: TrimLimits = TrimLimits {
        min_count: None,
        max_count: None,
        min_remove: None,
        max_remove: None,
        min_access_count: None,
        max_access_count: None,
    };

    /// Only a maximum size; everything else unbounded.
    pub const fn with_max_count(max_count: usize) -> Self {
        TrimLimits {
            max_count: Some(max_count),
            ..Self::UNBOUNDED
        }
    }

    /// Returns `true` if either access-count bound is set.
    #[inline]
    pub fn has_access_range(&self) -> bool {
        self.min_access_count.is_some() || self.max_access_count.is_some()
    }
}

impl fmt::Debug for TrimLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrimLimits")
            .field("min_count", &self.min_count)
            .field("max_count", &self.max_count)
            .field("min_remove", &self.min_remove)
            .field("max_remove", &self.max_remove)
            .field("min_access_count", &self.min_access_count)
            .field("max_access_count", &self.max_access_count)
            .finish()
    }
}
