//! Configuration for the entity registry.

use std::fmt;

/// Configuration for an [`EntityRegistry`](crate::EntityRegistry).
///
/// # Fields
///
/// - `capacity`: Initial capacity hint for the name map and the token index
/// - `allow_zero`: Whether values whose token is zero are indexed by token
///
/// With `allow_zero` off, a zero-token value is still stored by name; it is
/// simply absent from the token index.
///
/// # Examples
///
/// ```
/// use script_containers::config::EntityRegistryConfig;
///
/// let config = EntityRegistryConfig {
///     allow_zero: false,
///     ..EntityRegistryConfig::default()
/// };
/// assert_eq!(config.capacity, 0);
/// ```
#[derive(Clone, Copy)]
pub struct EntityRegistryConfig {
    /// Number of entities to preallocate room for.
    pub capacity: usize,
    /// Index values whose token is zero.
    pub allow_zero: bool,
}

impl Default for EntityRegistryConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            allow_zero: true,
        }
    }
}

impl fmt::Debug for EntityRegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistryConfig")
            .field("capacity", &self.capacity)
            .field("allow_zero", &self.allow_zero)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_defaults() {
        let config = EntityRegistryConfig::default();
        assert_eq!(config.capacity, 0);
        assert!(config.allow_zero);
    }
}
