//! Entity Registry Implementation.
//!
//! An [`EntityRegistry`] is the symbol table behind commands, procedures,
//! plugins and other named interpreter entities. It keeps two indices over
//! the same values:
//!
//! ```text
//! name map:     "puts"  ──┐            token index:  17 ──┐
//!               "set"   ──┼──▶ Arc<V> ◀──────────────  42 ──┘
//! ```
//!
//! Both maps hold clones of one `Arc<V>` per entity, so the value found by
//! token is the value found by name (`Arc::ptr_eq`). The name map also
//! remembers the token each entity was indexed under, which is what removal
//! and replacement unindex. Every mutating call updates both maps before
//! returning.
//!
//! # Versioning
//!
//! Each structural change (`add`, `remove`, `set`, `clear`) bumps the
//! version by one; `rename` bumps it twice because it is an insert followed
//! by a removal. Callers cache lookups keyed on [`version`](EntityRegistry::version)
//! and drop them when it moves.
//!
//! # Tokens
//!
//! A value is indexed under its own [`HasToken::token`] unless an explicit
//! token is given to [`add`](EntityRegistry::add). With
//! [`allow_zero`](crate::config::EntityRegistryConfig::allow_zero) off,
//! zero-token values are kept by name only.
//!
//! A token maps to one entity at a time. Indexing a second entity under a
//! token that is already taken moves the token to the newcomer; the previous
//! holder stays reachable by name only.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::{HashMap, HashSet};

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::{HashMap, HashSet};

use crate::config::EntityRegistryConfig;
use crate::entity::{FlagFilter, HasFlags, HasToken};
use crate::error::{ContainerError, Result};
use crate::metrics::{ContainerMetrics, RegistryMetrics};
use crate::pattern::{matches_optional, KeyPattern};
use crate::token::{shared_allocator, Token, TokenAllocator, TokenIndex};

/// Counts of successful mutations, reported through the metrics.
#[derive(Debug, Default, Clone, Copy)]
struct MutationCounters {
    adds: u64,
    removes: u64,
    renames: u64,
    overwrites: u64,
}

/// A stored entity and the token it is indexed under.
struct Slot<V> {
    value: Arc<V>,
    token: Option<Token>,
}

impl<V> Clone for Slot<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            token: self.token,
        }
    }
}

/// A name-keyed, token-indexed, versioned store of shared entities.
///
/// # Examples
///
/// ```
/// use script_containers::entity::HasToken;
/// use script_containers::token::Token;
/// use script_containers::EntityRegistry;
///
/// #[derive(Debug)]
/// struct Command {
///     token: Token,
/// }
///
/// impl HasToken for Command {
///     fn token(&self) -> Token {
///         self.token
///     }
/// }
///
/// let mut commands: EntityRegistry<String, Command> = EntityRegistry::new();
/// commands
///     .add("puts".to_string(), Command { token: Token::new(100) }, None)
///     .unwrap();
///
/// let by_token = commands.lookup_by_token(Token::new(100)).unwrap().clone();
/// assert!(commands.rename("puts", "print".to_string()));
/// assert!(std::sync::Arc::ptr_eq(commands.get("print").unwrap(), &by_token));
/// assert!(commands.get("puts").is_err());
/// ```
pub struct EntityRegistry<K, V, S = DefaultHashBuilder> {
    config: EntityRegistryConfig,

    /// Name to value and indexed token.
    map: HashMap<K, Slot<V>, S>,

    /// Token to value, sharing the `Arc`s in `map`.
    tokens: TokenIndex<V, S>,

    /// Bumped by every structural change.
    version: u64,

    allocator: Arc<dyn TokenAllocator>,

    counters: MutationCounters,
}

impl<K: Hash + Eq, V: HasToken> EntityRegistry<K, V, DefaultHashBuilder> {
    /// Creates a registry from `config`.
    ///
    /// `allocator` defaults to the process-wide
    /// [`shared_allocator`](crate::token::shared_allocator).
    pub fn init(config: EntityRegistryConfig, allocator: Option<Arc<dyn TokenAllocator>>) -> Self {
        Self::with_hasher(config, allocator, DefaultHashBuilder::default())
    }

    /// Creates a registry with the default configuration and allocator.
    pub fn new() -> Self {
        Self::init(EntityRegistryConfig::default(), None)
    }
}

impl<K: Hash + Eq, V: HasToken> Default for EntityRegistry<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V: HasToken, S: BuildHasher + Clone> EntityRegistry<K, V, S> {
    /// Creates a registry that hashes names and tokens with `hash_builder`.
    pub fn with_hasher(
        config: EntityRegistryConfig,
        allocator: Option<Arc<dyn TokenAllocator>>,
        hash_builder: S,
    ) -> Self {
        Self {
            config,
            map: HashMap::with_capacity_and_hasher(config.capacity, hash_builder.clone()),
            tokens: TokenIndex::with_hasher(config.capacity, hash_builder),
            version: 0,
            allocator: allocator.unwrap_or_else(shared_allocator),
            counters: MutationCounters::default(),
        }
    }

    /// Returns the number of entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of entities reachable by token.
    #[inline]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Returns the current version.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns `true` if both registries are at the same version.
    ///
    /// A clone starts at its source's version, so this tells whether either
    /// side changed since the clone was taken (assuming only one did).
    #[inline]
    pub fn same_version(&self, other: &Self) -> bool {
        self.version == other.version
    }

    /// Returns whether zero-token values are indexed.
    #[inline]
    pub fn allow_zero(&self) -> bool {
        self.config.allow_zero
    }

    /// Returns `true` if an entity is stored under `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Returns the entity stored under `key`.
    ///
    /// # Errors
    ///
    /// [`ContainerError::KeyNotFound`] if there is none.
    pub fn get<Q>(&self, key: &Q) -> Result<&Arc<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.try_get(key).ok_or(ContainerError::KeyNotFound)
    }

    /// Returns the entity stored under `key`, if any.
    #[inline]
    pub fn try_get<Q>(&self, key: &Q) -> Option<&Arc<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key).map(|slot| &slot.value)
    }

    /// Returns the token the entity under `key` is indexed under.
    ///
    /// `None` if `key` is absent, its token is zero and zero tokens are not
    /// indexed, or another entity has since taken the token over.
    #[inline]
    pub fn indexed_token<Q>(&self, key: &Q) -> Option<Token>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key).and_then(|slot| slot.token)
    }

    /// Returns the entity indexed under `token`, if any.
    #[inline]
    pub fn lookup_by_token(&self, token: Token) -> Option<&Arc<V>> {
        self.tokens.get(token)
    }

    /// Returns the entity indexed under `token`.
    ///
    /// # Errors
    ///
    /// [`ContainerError::KeyNotFound`] if no entity has that token.
    pub fn get_by_token(&self, token: Token) -> Result<&Arc<V>> {
        self.tokens.get(token).ok_or(ContainerError::KeyNotFound)
    }

    /// Returns `true` if some entity is indexed under `token`.
    #[inline]
    pub fn contains_token(&self, token: Token) -> bool {
        self.tokens.contains(token)
    }

    /// Adds a new entity.
    ///
    /// The value is indexed under `token` when given, otherwise under its
    /// own token.
    ///
    /// # Errors
    ///
    /// [`ContainerError::DuplicateKey`] if `key` is taken. Nothing changes
    /// in that case, the version included.
    pub fn add(&mut self, key: K, value: impl Into<Arc<V>>, token: Option<Token>) -> Result<()> {
        if self.map.contains_key(&key) {
            return Err(ContainerError::DuplicateKey);
        }

        let value = value.into();
        let token = self.index(token.unwrap_or_else(|| value.token()), &value);
        self.map.insert(key, Slot { value, token });

        self.bump_version();
        self.counters.adds += 1;
        Ok(())
    }

    /// Mints a token from the registry's allocator.
    #[inline]
    pub fn next_token(&self) -> Token {
        self.allocator.next_token()
    }

    /// Mints a token, builds the value from it and adds the value.
    ///
    /// No token is consumed when `key` is already taken.
    ///
    /// # Errors
    ///
    /// [`ContainerError::DuplicateKey`] if `key` is taken.
    pub fn add_new<F>(&mut self, key: K, build: F) -> Result<Token>
    where
        F: FnOnce(Token) -> V,
    {
        if self.map.contains_key(&key) {
            return Err(ContainerError::DuplicateKey);
        }

        let value = build(self.next_token());
        let token = value.token();
        self.add(key, value, None)?;
        Ok(token)
    }

    /// Inserts or replaces the entity under `key`, returning the old one.
    ///
    /// The old value leaves the token index under the token it was indexed
    /// under, then the new one is indexed under its own token.
    pub fn set(&mut self, key: K, value: impl Into<Arc<V>>) -> Option<Arc<V>> {
        let value = value.into();

        let previous = self.map.remove(&key);
        if let Some(previous) = &previous {
            self.unindex(previous);
            self.counters.overwrites += 1;
        } else {
            self.counters.adds += 1;
        }

        let token = self.index(value.token(), &value);
        self.map.insert(key, Slot { value, token });

        self.bump_version();
        previous.map(|slot| slot.value)
    }

    /// Removes the entity under `key`.
    ///
    /// The token the removed value was indexed under is always unindexed.
    /// An explicit `token` is unindexed as well, whatever entity it points
    /// at; that entity stays reachable by name.
    ///
    /// Returns `false` (and changes nothing) if `key` is absent.
    pub fn remove<Q>(&mut self, key: &Q, token: Option<Token>) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(key, token).is_some()
    }

    /// Like [`remove`](Self::remove), but returns the removed entity.
    pub fn take<Q>(&mut self, key: &Q, token: Option<Token>) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let removed = self.map.remove(key)?;
        self.unindex(&removed);

        if let Some(token) = token {
            if let Some(other) = self.tokens.remove(token) {
                self.release(token, &other);
            }
        }

        self.bump_version();
        self.counters.removes += 1;
        Some(removed.value)
    }

    /// Moves the entity under `old_key` to `new_key`, keeping its token.
    ///
    /// Returns `false` if `old_key` is absent or `new_key` is taken. A
    /// successful rename bumps the version twice.
    pub fn rename<Q>(&mut self, old_key: &Q, new_key: K) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.map.contains_key(&new_key) {
            return false;
        }
        let Some(slot) = self.map.get(old_key).cloned() else {
            return false;
        };

        self.map.insert(new_key, slot);
        self.bump_version();
        self.map.remove(old_key);
        self.bump_version();

        self.counters.renames += 1;
        true
    }

    /// Removes every entity and token. Bumps the version once.
    pub fn clear(&mut self) {
        self.map.clear();
        self.tokens.clear();
        self.bump_version();
    }

    /// Iterates names and entities in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<V>)> + '_ {
        self.map.iter().map(|(key, slot)| (key, &slot.value))
    }

    /// Iterates names in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.map.keys()
    }

    /// Iterates tokens and entities in arbitrary order.
    pub fn tokens(&self) -> impl Iterator<Item = (Token, &Arc<V>)> + '_ {
        self.tokens.iter()
    }

    /// Verifies that the token index and the name map agree.
    ///
    /// Every token entry must point at a stored entity, and every entity
    /// that records a token must be what the index holds under it.
    ///
    /// # Errors
    ///
    /// [`ContainerError::InvalidOperation`] describing the first violation.
    pub fn check_invariants(&self) -> Result<()> {
        let stored: HashSet<*const V> = self
            .map
            .values()
            .map(|slot| Arc::as_ptr(&slot.value))
            .collect();

        if let Some((token, _)) = self
            .tokens
            .iter()
            .find(|&(_, value)| !stored.contains(&Arc::as_ptr(value)))
        {
            return Err(ContainerError::InvalidOperation(format!(
                "token {token} points at an entity that is not stored"
            )));
        }

        for slot in self.map.values() {
            let Some(token) = slot.token else {
                continue;
            };
            if !self.indexes(token) {
                return Err(ContainerError::InvalidOperation(format!(
                    "entity indexed under disallowed token {token}"
                )));
            }
            if !self
                .tokens
                .get(token)
                .is_some_and(|indexed| Arc::ptr_eq(indexed, &slot.value))
            {
                return Err(ContainerError::InvalidOperation(format!(
                    "entity records token {token} but the index disagrees"
                )));
            }
        }

        let owned = self.map.values().filter(|slot| slot.token.is_some()).count();
        if owned != self.tokens.len() {
            return Err(ContainerError::InvalidOperation(format!(
                "{} token entries for {owned} indexed entities",
                self.tokens.len()
            )));
        }

        Ok(())
    }

    /// Returns a snapshot of the registry's counters.
    pub fn registry_metrics(&self) -> RegistryMetrics {
        RegistryMetrics {
            entries: self.map.len(),
            tokens: self.tokens.len(),
            version: self.version,
            adds: self.counters.adds,
            removes: self.counters.removes,
            renames: self.counters.renames,
            overwrites: self.counters.overwrites,
        }
    }

    #[inline]
    fn indexes(&self, token: Token) -> bool {
        self.config.allow_zero || !token.is_zero()
    }

    /// Indexes `value` under `token` if the zero policy allows it and returns
    /// the token it ended up under. Must run before `value`'s slot enters the
    /// name map.
    fn index(&mut self, token: Token, value: &Arc<V>) -> Option<Token> {
        if !self.indexes(token) {
            return None;
        }
        if let Some(displaced) = self.tokens.insert(token, Arc::clone(value)) {
            self.release(token, &displaced);
        }
        Some(token)
    }

    /// Unindexes the token `slot` was indexed under.
    fn unindex(&mut self, slot: &Slot<V>) {
        if let Some(token) = slot.token {
            self.tokens.remove_if_same(token, &slot.value);
        }
    }

    /// Forgets that the stored entity `value` owns `token`, after the index
    /// entry was taken away from it.
    fn release(&mut self, token: Token, value: &Arc<V>) {
        if let Some(slot) = self
            .map
            .values_mut()
            .find(|slot| slot.token == Some(token) && Arc::ptr_eq(&slot.value, value))
        {
            slot.token = None;
        }
    }

    #[inline]
    fn bump_version(&mut self) {
        self.version += 1;
    }
}

impl<K, V, S> EntityRegistry<K, V, S>
where
    K: Hash + Eq + Ord + Clone + AsRef<str>,
    V: HasToken + HasFlags,
    S: BuildHasher + Clone,
{
    /// Lists the names of entities passing `filter` and `pattern`, sorted.
    ///
    /// `pattern` is a glob matched against the whole name; `None` matches
    /// every name.
    ///
    /// # Errors
    ///
    /// [`ContainerError::InvalidPattern`] if `pattern` does not compile.
    pub fn list(
        &self,
        filter: &FlagFilter<V::Flags>,
        pattern: Option<&str>,
        no_case: bool,
    ) -> Result<Vec<K>> {
        let pattern = KeyPattern::optional(pattern, no_case)?;

        let mut keys: Vec<K> = self
            .map
            .iter()
            .filter(|(key, slot)| {
                filter.matches(slot.value.flags())
                    && matches_optional(pattern.as_ref(), key.as_ref())
            })
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }
}

impl<K, V, S> EntityRegistry<K, V, S>
where
    K: Hash + Eq + AsRef<str>,
    V: HasToken,
    S: BuildHasher + Clone,
{
    /// Copies matching entities into a name-ordered map.
    ///
    /// # Errors
    ///
    /// [`ContainerError::InvalidPattern`] if `pattern` does not compile.
    pub fn to_map(&self, pattern: Option<&str>, no_case: bool) -> Result<BTreeMap<String, Arc<V>>> {
        let pattern = KeyPattern::optional(pattern, no_case)?;

        Ok(self
            .map
            .iter()
            .filter(|(key, _)| matches_optional(pattern.as_ref(), key.as_ref()))
            .map(|(key, slot)| (key.as_ref().to_string(), Arc::clone(&slot.value)))
            .collect())
    }

    /// Formats matching names as a script list: sorted, space separated,
    /// with names that need it wrapped in braces.
    ///
    /// # Errors
    ///
    /// [`ContainerError::InvalidPattern`] if `pattern` does not compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use script_containers::entity::HasToken;
    /// use script_containers::token::Token;
    /// use script_containers::EntityRegistry;
    ///
    /// struct Proc;
    /// impl HasToken for Proc {
    ///     fn token(&self) -> Token {
    ///         Token::ZERO
    ///     }
    /// }
    ///
    /// let mut procs: EntityRegistry<String, Proc> = EntityRegistry::new();
    /// procs.add("main".to_string(), Proc, None).unwrap();
    /// procs.add("my proc".to_string(), Proc, None).unwrap();
    /// procs.add("max".to_string(), Proc, None).unwrap();
    ///
    /// assert_eq!(procs.to_list_string(Some("m*"), false).unwrap(), "main max {my proc}");
    /// ```
    pub fn to_list_string(&self, pattern: Option<&str>, no_case: bool) -> Result<String> {
        let names = self.to_map(pattern, no_case)?;

        let mut out = String::new();
        for name in names.keys() {
            if !out.is_empty() {
                out.push(' ');
            }
            push_list_element(&mut out, name);
        }
        Ok(out)
    }
}

/// Appends `element`, brace-quoted if it is empty or contains list syntax.
fn push_list_element(out: &mut String, element: &str) {
    let needs_braces = element.is_empty()
        || element
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '[' | ']' | '$' | '"' | ';' | '\\'));

    if needs_braces {
        out.push('{');
        out.push_str(element);
        out.push('}');
    } else {
        out.push_str(element);
    }
}

impl<K, V, S> Clone for EntityRegistry<K, V, S>
where
    K: Clone,
    S: Clone,
{
    /// Copies both indices and the version. Entities are shared, not
    /// duplicated.
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            map: self.map.clone(),
            tokens: self.tokens.clone(),
            version: self.version,
            allocator: Arc::clone(&self.allocator),
            counters: self.counters,
        }
    }
}

impl<K: Hash + Eq, V: HasToken, S: BuildHasher + Clone> ContainerMetrics
    for EntityRegistry<K, V, S>
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.registry_metrics().to_btreemap()
    }

    fn container_name(&self) -> &'static str {
        "EntityRegistry"
    }
}

impl<K, V, S> fmt::Debug for EntityRegistry<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("len", &self.map.len())
            .field("tokens", &self.tokens)
            .field("version", &self.version)
            .field("config", &self.config)
            .finish()
    }
}
