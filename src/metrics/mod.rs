//! Container Metrics System
//!
//! Both container families report their counters through the
//! [`ContainerMetrics`] trait as a `BTreeMap<String, f64>`. BTreeMap keeps the
//! keys in a fixed order, so two reports can be diffed line by line and test
//! assertions do not depend on hash order.
//!
//! The numbers come from two places:
//!
//! - [`CacheStatistics`]: trim, churn, watermark and hit/miss counters kept by
//!   every [`AdaptiveCache`](crate::AdaptiveCache)
//! - [`RegistryMetrics`]: a snapshot of an
//!   [`EntityRegistry`](crate::EntityRegistry)'s sizes, version and mutation
//!   counters

use std::collections::BTreeMap;

pub mod cache;
pub mod registry;

pub use cache::CacheStatistics;
pub use registry::RegistryMetrics;

/// Uniform metrics reporting for containers and their concurrent wrappers.
pub trait ContainerMetrics {
    /// Returns all metrics as key-value pairs, keys in sorted order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short name identifying the container kind (e.g. "AdaptiveCache").
    fn container_name(&self) -> &'static str;
}
