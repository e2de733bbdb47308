//! Container Errors
//!
//! Name-keyed operations on both container families report failures through
//! [`ContainerError`]. Token-keyed lookups never fail; they signal absence
//! with `None` or `false`. Cache housekeeping (`trim_excess`, `churn_advice`)
//! is advisory and never returns an error.

/// Errors reported by [`AdaptiveCache`](crate::AdaptiveCache) and
/// [`EntityRegistry`](crate::EntityRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    /// A name-keyed (or token-keyed, via `get_by_token`) read found no entry.
    #[error("key not found")]
    KeyNotFound,

    /// `add` was called with a key that is already present.
    #[error("an entry with the same key already exists")]
    DuplicateKey,

    /// A listing pattern could not be compiled as a glob.
    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// The pattern as supplied by the caller.
        pattern: String,
        /// Why the glob compiler rejected it.
        message: String,
    },

    /// An internal index disagrees with the base container.
    ///
    /// Only produced by the explicit `check_invariants` methods; ordinary
    /// operations keep the indices in lock-step and never surface it.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result alias used throughout the crate.
pub type Result<T, E = ContainerError> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ContainerError::KeyNotFound.to_string(), "key not found");
        assert_eq!(
            ContainerError::DuplicateKey.to_string(),
            "an entry with the same key already exists"
        );

        let err = ContainerError::InvalidPattern {
            pattern: "[".to_string(),
            message: "invalid range pattern".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid pattern \"[\": invalid range pattern"
        );
    }
}
