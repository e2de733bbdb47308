//! Concurrent Container Wrappers
//!
//! The core containers take `&mut self` for every mutation and leave
//! synchronization to their owner. This module provides the two owners most
//! embedders want: one lock around one container.
//!
//! | Type | Lock | Reads return |
//! |------|------|--------------|
//! | [`ConcurrentAdaptiveCache`] | `parking_lot::Mutex` | clones of `V` |
//! | [`ConcurrentEntityRegistry`] | `parking_lot::RwLock` | `Arc<V>` clones |
//!
//! ## Why a Mutex for the cache?
//!
//! A cache lookup is a write: it touches the key, moving it between time
//! buckets and bumping its access count, and it updates the hit counters.
//! A reader-writer lock would take the write side on every call anyway.
//!
//! ## Why an RwLock for the registry?
//!
//! Registry lookups (by name, by token, listings) are pure reads and vastly
//! outnumber definitions and renames, so readers proceed in parallel.
//!
//! # Thread Safety
//!
//! Both wrappers are `Send + Sync` when their keys and values are, and are
//! meant to be shared through an `Arc`. No guard escapes a method call;
//! compound operations go through `with_lock` / `read` / `write`, which run a
//! closure under the lock.
//!
//! # Example
//!
//! ```
//! use script_containers::concurrent::ConcurrentAdaptiveCache;
//! use script_containers::config::AdaptiveCacheConfig;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache: Arc<ConcurrentAdaptiveCache<String, usize>> =
//!     Arc::new(ConcurrentAdaptiveCache::init(AdaptiveCacheConfig::default(), None));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let cache = Arc::clone(&cache);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 let key = format!("key_{t}_{i}");
//!                 cache.set(key.clone(), i);
//!                 assert_eq!(cache.try_get(&key), Some(i));
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(cache.len(), 400);
//! ```

mod cache;
mod registry;

pub use self::cache::ConcurrentAdaptiveCache;
pub use self::registry::ConcurrentEntityRegistry;
