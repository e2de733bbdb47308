//! Container Configuration Module
//!
//! This module provides configuration structures for both container families
//! and for the cache housekeeping routine. Each has its own dedicated struct
//! with public fields.
//!
//! # Design Philosophy
//!
//! Configuration structs have all public fields for simple instantiation:
//!
//! - **Simple**: Just create the struct with all fields set, or start from
//!   `Default` and override what differs
//! - **No builders**: No constructors or builder methods needed
//!
//! Optional bounds are `Option`s. `None` always means "unbounded" (or "never",
//! for time intervals); there are no negative sentinels.
//!
//! | Config | Used by | Description |
//! |--------|---------|-------------|
//! | `AdaptiveCacheConfig` | [`AdaptiveCache`](crate::AdaptiveCache) | Capacity, tracking, cooldown and churn window |
//! | `EntityRegistryConfig` | [`EntityRegistry`](crate::EntityRegistry) | Capacity and zero-token policy |
//! | `TrimLimits` | [`AdaptiveCache::trim_excess`](crate::AdaptiveCache::trim_excess) | The six trim bounds |
//! | `HousekeepingConfig` | [`Housekeeping`](crate::housekeeping::Housekeeping) | Trim limits plus churn thresholds |
//!
//! # Examples
//!
//! ```
//! use script_containers::config::{AdaptiveCacheConfig, TrimLimits};
//! use script_containers::AdaptiveCache;
//! use std::time::Duration;
//!
//! let config = AdaptiveCacheConfig {
//!     capacity: 128,
//!     trim_interval: Some(Duration::from_secs(5)),
//!     ..AdaptiveCacheConfig::default()
//! };
//! let mut cache: AdaptiveCache<String, i32> = AdaptiveCache::init(config, None);
//! cache.set("answer".to_string(), 42);
//!
//! let removed = cache.trim_excess(&TrimLimits::with_max_count(1));
//! assert_eq!(removed, 0);
//! ```

pub mod cache;
pub mod housekeeping;
pub mod registry;
pub mod trim;

pub use cache::AdaptiveCacheConfig;
pub use housekeeping::HousekeepingConfig;
pub use registry::EntityRegistryConfig;
pub use trim::TrimLimits;
