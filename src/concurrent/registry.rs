//! Thread-safe entity registry.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use parking_lot::RwLock;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

use crate::config::EntityRegistryConfig;
use crate::entity::{FlagFilter, HasFlags, HasToken};
use crate::error::Result;
use crate::metrics::ContainerMetrics;
use crate::registry::EntityRegistry;
use crate::token::{Token, TokenAllocator};

/// An [`EntityRegistry`] behind a `parking_lot::RwLock`.
///
/// Lookups take the read lock and return `Arc<V>` clones, so an entity
/// found by a reader stays alive even if a writer removes it right after.
pub struct ConcurrentEntityRegistry<K, V, S = DefaultHashBuilder> {
    inner: RwLock<EntityRegistry<K, V, S>>,
}

impl<K: Hash + Eq, V: HasToken> ConcurrentEntityRegistry<K, V, DefaultHashBuilder> {
    /// Creates a registry from `config`, see [`EntityRegistry::init`].
    pub fn init(config: EntityRegistryConfig, allocator: Option<Arc<dyn TokenAllocator>>) -> Self {
        Self::from_registry(EntityRegistry::init(config, allocator))
    }
}

impl<K: Hash + Eq, V: HasToken, S: BuildHasher + Clone> ConcurrentEntityRegistry<K, V, S> {
    /// Wraps an existing registry.
    pub fn from_registry(registry: EntityRegistry<K, V, S>) -> Self {
        Self {
            inner: RwLock::new(registry),
        }
    }

    /// Unwraps the registry.
    pub fn into_inner(self) -> EntityRegistry<K, V, S> {
        self.inner.into_inner()
    }

    /// Returns the number of entities.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns the current version.
    pub fn version(&self) -> u64 {
        self.inner.read().version()
    }

    /// Returns `true` if an entity is stored under `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.read().contains_key(key)
    }

    /// Returns the entity stored under `key`.
    ///
    /// # Errors
    ///
    /// [`ContainerError::KeyNotFound`](crate::ContainerError::KeyNotFound)
    /// if there is none.
    pub fn get<Q>(&self, key: &Q) -> Result<Arc<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.read().get(key).map(Arc::clone)
    }

    /// Returns the entity stored under `key`, if any.
    pub fn try_get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.read().try_get(key).map(Arc::clone)
    }

    /// Returns the entity indexed under `token`, if any.
    pub fn lookup_by_token(&self, token: Token) -> Option<Arc<V>> {
        self.inner.read().lookup_by_token(token).map(Arc::clone)
    }

    /// Returns the entity indexed under `token`.
    ///
    /// # Errors
    ///
    /// [`ContainerError::KeyNotFound`](crate::ContainerError::KeyNotFound)
    /// if no entity has that token.
    pub fn get_by_token(&self, token: Token) -> Result<Arc<V>> {
        self.inner.read().get_by_token(token).map(Arc::clone)
    }

    /// Returns `true` if some entity is indexed under `token`.
    pub fn contains_token(&self, token: Token) -> bool {
        self.inner.read().contains_token(token)
    }

    /// Adds a new entity, see [`EntityRegistry::add`].
    pub fn add(&self, key: K, value: impl Into<Arc<V>>, token: Option<Token>) -> Result<()> {
        self.inner.write().add(key, value, token)
    }

    /// Mints a token and adds the value built from it.
    pub fn add_new<F>(&self, key: K, build: F) -> Result<Token>
    where
        F: FnOnce(Token) -> V,
    {
        self.inner.write().add_new(key, build)
    }

    /// Inserts or replaces the entity under `key`.
    pub fn set(&self, key: K, value: impl Into<Arc<V>>) -> Option<Arc<V>> {
        self.inner.write().set(key, value)
    }

    /// Removes the entity under `key`, see [`EntityRegistry::remove`].
    pub fn remove<Q>(&self, key: &Q, token: Option<Token>) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.write().remove(key, token)
    }

    /// Moves an entity to a new name, keeping its token.
    pub fn rename<Q>(&self, old_key: &Q, new_key: K) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.write().rename(old_key, new_key)
    }

    /// Removes every entity.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Verifies the token index against the name map.
    pub fn check_invariants(&self) -> Result<()> {
        self.inner.read().check_invariants()
    }

    /// Returns a consistent copy of the registry.
    pub fn snapshot(&self) -> EntityRegistry<K, V, S>
    where
        K: Clone,
    {
        self.inner.read().clone()
    }

    /// Runs `f` with shared access to the registry.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EntityRegistry<K, V, S>) -> R,
    {
        let registry = self.inner.read();
        f(&*registry)
    }

    /// Runs `f` with exclusive access to the registry.
    pub fn write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut EntityRegistry<K, V, S>) -> R,
    {
        let mut registry = self.inner.write();
        f(&mut *registry)
    }
}

impl<K, V, S> ConcurrentEntityRegistry<K, V, S>
where
    K: Hash + Eq + Ord + Clone + AsRef<str>,
    V: HasToken + HasFlags,
    S: BuildHasher + Clone,
{
    /// Lists matching names, see [`EntityRegistry::list`].
    pub fn list(
        &self,
        filter: &FlagFilter<V::Flags>,
        pattern: Option<&str>,
        no_case: bool,
    ) -> Result<Vec<K>> {
        self.inner.read().list(filter, pattern, no_case)
    }
}

impl<K, V, S> ConcurrentEntityRegistry<K, V, S>
where
    K: Hash + Eq + AsRef<str>,
    V: HasToken,
    S: BuildHasher + Clone,
{
    /// Copies matching entities into a name-ordered map.
    pub fn to_map(&self, pattern: Option<&str>, no_case: bool) -> Result<BTreeMap<String, Arc<V>>> {
        self.inner.read().to_map(pattern, no_case)
    }

    /// Formats matching names as a script list.
    pub fn to_list_string(&self, pattern: Option<&str>, no_case: bool) -> Result<String> {
        self.inner.read().to_list_string(pattern, no_case)
    }
}

impl<K: Hash + Eq, V: HasToken, S: BuildHasher + Clone> ContainerMetrics
    for ConcurrentEntityRegistry<K, V, S>
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.inner.read().metrics()
    }

    fn container_name(&self) -> &'static str {
        "ConcurrentEntityRegistry"
    }
}

impl<K, V, S> fmt::Debug for ConcurrentEntityRegistry<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(registry) => f
                .debug_struct("ConcurrentEntityRegistry")
                .field("inner", &*registry)
                .finish(),
            None => f
                .debug_struct("ConcurrentEntityRegistry")
                .field("inner", &"<locked>")
                .finish(),
        }
    }
}
