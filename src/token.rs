//! Tokens and the Token Index
//!
//! A [`Token`] is a process-local integer handle for a registry entity. It
//! stays valid across renames, so callers can hold on to a token instead of
//! a name that might change under them.
//!
//! Tokens are minted by a [`TokenAllocator`] that the registry receives at
//! construction. Registries sharing one allocator never hand out the same
//! token twice; registries with separate allocators are fully independent.
//!
//! [`TokenIndex`] is the registry's secondary map from token to value. It
//! holds clones of the same `Arc` the name map holds, so a value reached by
//! token is the very value reached by name.

use std::fmt;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Integer handle identifying a registry entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(i64);

impl Token {
    /// The zero token. Whether it is indexed depends on
    /// [`EntityRegistryConfig::allow_zero`](crate::config::EntityRegistryConfig::allow_zero).
    pub const ZERO: Token = Token(0);

    /// Wraps a raw token value.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Token(raw)
    }

    /// Returns the raw token value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns `true` for [`Token::ZERO`].
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for Token {
    fn from(raw: i64) -> Self {
        Token(raw)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Source of fresh tokens.
pub trait TokenAllocator: Send + Sync + fmt::Debug {
    /// Returns a token never returned before by this allocator.
    fn next_token(&self) -> Token;
}

/// Hands out 1, 2, 3, ... from an atomic counter.
///
/// # Examples
///
/// ```
/// use script_containers::token::{SequentialTokenAllocator, Token, TokenAllocator};
///
/// let allocator = SequentialTokenAllocator::new();
/// assert_eq!(allocator.next_token(), Token::new(1));
/// assert_eq!(allocator.next_token(), Token::new(2));
///
/// let resumed = SequentialTokenAllocator::starting_after(Token::new(100));
/// assert_eq!(resumed.next_token(), Token::new(101));
/// ```
#[derive(Debug, Default)]
pub struct SequentialTokenAllocator {
    last: AtomicI64,
}

impl SequentialTokenAllocator {
    /// Creates an allocator whose first token is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose first token follows `last`.
    pub fn starting_after(last: Token) -> Self {
        Self {
            last: AtomicI64::new(last.get()),
        }
    }

    /// Returns the most recently issued token, or the starting point.
    pub fn last_token(&self) -> Token {
        Token(self.last.load(Ordering::SeqCst))
    }
}

impl TokenAllocator for SequentialTokenAllocator {
    #[inline]
    fn next_token(&self) -> Token {
        Token(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// The allocator registries use when none is supplied.
///
/// It is shared by the whole process, so tokens from registries built with
/// the default are unique across all of them.
pub fn shared_allocator() -> Arc<dyn TokenAllocator> {
    static SHARED: OnceLock<Arc<SequentialTokenAllocator>> = OnceLock::new();
    let shared = SHARED.get_or_init(|| Arc::new(SequentialTokenAllocator::new()));
    Arc::clone(shared) as Arc<dyn TokenAllocator>
}

/// Token to value map holding shared references to registry values.
pub struct TokenIndex<V, S = DefaultHashBuilder> {
    map: HashMap<Token, Arc<V>, S>,
}

impl<V, S: BuildHasher> TokenIndex<V, S> {
    /// Creates an empty index sized for `capacity` tokens.
    pub fn with_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, hash_builder),
        }
    }

    /// Number of indexed tokens.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no token is indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the value indexed under `token`.
    #[inline]
    pub fn get(&self, token: Token) -> Option<&Arc<V>> {
        self.map.get(&token)
    }

    /// Returns `true` if `token` is indexed.
    #[inline]
    pub fn contains(&self, token: Token) -> bool {
        self.map.contains_key(&token)
    }

    /// Indexes `value` under `token`, returning whatever was there before.
    #[inline]
    pub fn insert(&mut self, token: Token, value: Arc<V>) -> Option<Arc<V>> {
        self.map.insert(token, value)
    }

    /// Unindexes `token` unconditionally.
    #[inline]
    pub fn remove(&mut self, token: Token) -> Option<Arc<V>> {
        self.map.remove(&token)
    }

    /// Unindexes `token` only if it points at `value` itself.
    ///
    /// Returns `true` if the entry was removed.
    pub fn remove_if_same(&mut self, token: Token, value: &Arc<V>) -> bool {
        match self.map.get(&token) {
            Some(indexed) if Arc::ptr_eq(indexed, value) => {
                self.map.remove(&token);
                true
            }
            _ => false,
        }
    }

    /// Removes every token.
    #[inline]
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Iterates tokens and values in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, &Arc<V>)> + '_ {
        self.map.iter().map(|(token, value)| (*token, value))
    }
}

impl<V, S: Clone> Clone for TokenIndex<V, S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<V, S> fmt::Debug for TokenIndex<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIndex")
            .field("len", &self.map.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_basics() {
        assert!(Token::ZERO.is_zero());
        assert_eq!(Token::default(), Token::ZERO);
        assert_eq!(Token::from(42).get(), 42);
        assert_eq!(Token::new(-7).to_string(), "-7");
    }

    #[test]
    fn test_sequential_allocator() {
        let allocator = SequentialTokenAllocator::new();
        assert_eq!(allocator.last_token(), Token::ZERO);
        let first = allocator.next_token();
        let second = allocator.next_token();
        assert_eq!(first, Token::new(1));
        assert_eq!(second, Token::new(2));
        assert_eq!(allocator.last_token(), second);
    }

    #[test]
    fn test_shared_allocator_is_shared() {
        let a = shared_allocator();
        let b = shared_allocator();
        let first = a.next_token();
        let second = b.next_token();
        assert!(second > first);
    }

    #[test]
    fn test_remove_if_same() {
        let mut index: TokenIndex<&str, DefaultHashBuilder> =
            TokenIndex::with_hasher(0, DefaultHashBuilder::default());
        let value = Arc::new("proc");
        let lookalike = Arc::new("proc");

        index.insert(Token::new(5), Arc::clone(&value));
        assert!(!index.remove_if_same(Token::new(5), &lookalike));
        assert!(index.contains(Token::new(5)));
        assert!(index.remove_if_same(Token::new(5), &value));
        assert!(index.is_empty());
        assert!(!index.remove_if_same(Token::new(5), &value));
    }
}
