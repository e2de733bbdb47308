#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Container Selection Guide
//!
//! | Type | Keyed by | Lookups mutate? | Use for |
//! |------|----------|-----------------|---------|
//! | [`EntityRegistry`] | name and token | no | Commands, procedures, channels, plugins |
//! | [`AdaptiveCache`] | key | yes (touch) | Compiled expressions, parsed scripts, lookups worth memoizing |
//!
//! ## Performance Characteristics
//!
//! | Container | Get | Insert | Remove | Trim |
//! |-----------|-----|--------|--------|------|
//! | `EntityRegistry` | O(1) | O(1) | O(1) | n/a |
//! | `AdaptiveCache` | O(1) + O(log B) | O(1) + O(log B) | O(1) + O(log B) | O(N) |
//!
//! B is the number of distinct access times the cache's tracker holds.
//!
//! ## Housekeeping
//!
//! Neither container acts on its own. A cache owner periodically calls
//! [`AdaptiveCache::trim_excess`] and [`AdaptiveCache::churn_advice`], or
//! hands both to a [`Housekeeping`] driver:
//!
//! ```rust
//! use script_containers::config::{AdaptiveCacheConfig, HousekeepingConfig, TrimLimits};
//! use script_containers::{AdaptiveCache, Housekeeping};
//!
//! let mut cache: AdaptiveCache<u64, u64> =
//!     AdaptiveCache::init(AdaptiveCacheConfig::default(), None);
//! let mut housekeeping = Housekeeping::new(HousekeepingConfig {
//!     limits: TrimLimits::with_max_count(1_000),
//!     ..HousekeepingConfig::default()
//! });
//!
//! for i in 0..1_200 {
//!     cache.set(i, i * i);
//! }
//! let report = housekeeping.run(&mut cache);
//! assert_eq!(report.trim.removed, 200);
//! assert!(housekeeping.is_enabled());
//! ```
//!
//! ## Modules
//!
//! - [`registry`]: the entity registry
//! - [`cache`]: the adaptive cache
//! - [`tracker`]: per-key access tracking with time buckets
//! - [`trim`]: the trim victim cascade
//! - [`housekeeping`]: periodic trim and churn-driven enable/disable
//! - [`token`]: tokens, token allocators and the token index
//! - [`entity`]: capability traits and flag filters for registry values
//! - [`pattern`]: glob patterns for listings
//! - [`clock`]: time sources
//! - [`config`]: configuration structures
//! - [`metrics`]: metrics reporting
//! - [`concurrent`]: lock-wrapped containers (requires `concurrent` feature)

/// Adaptive cache implementation.
///
/// A key/value cache with optional access tracking, bounded trimming and
/// churn advice.
pub mod cache;

/// Time sources for access tracking, trim cooldowns and churn windows.
pub mod clock;

/// Container configuration structures.
pub mod config;

/// Entity capability traits and flag filters.
pub mod entity;

/// Error type shared by both container families.
pub mod error;

/// Periodic cache housekeeping.
pub mod housekeeping;

/// Per-key access metadata.
pub mod meta;

/// Container metrics system.
///
/// Provides a uniform `BTreeMap<String, f64>` report for both container
/// families and their concurrent wrappers.
pub mod metrics;

/// Glob patterns for registry listings.
pub mod pattern;

/// Entity registry implementation.
///
/// A name-keyed, token-indexed, versioned store of shared entities.
pub mod registry;

/// Tokens and the token index.
pub mod token;

/// Access tracking with time buckets.
pub mod tracker;

/// Trim victim selection.
pub mod trim;

/// Concurrent container wrappers.
///
/// Provides lock-wrapped versions of both containers for sharing across
/// threads.
///
/// Available when the `concurrent` feature is enabled.
#[cfg(feature = "concurrent")]
pub mod concurrent;

// Re-export container types
pub use cache::{AdaptiveCache, ChurnAdvice};
pub use housekeeping::{Housekeeping, HousekeepingReport};
pub use registry::EntityRegistry;

// Re-export supporting types
pub use error::{ContainerError, Result};
pub use meta::AccessMeta;
pub use token::Token;
pub use trim::{TrimOutcome, TrimStage};

#[cfg(feature = "concurrent")]
pub use concurrent::{ConcurrentAdaptiveCache, ConcurrentEntityRegistry};
