//! Entity Capabilities
//!
//! Registry values expose two things the registry relies on: a stable
//! [`Token`] ([`HasToken`]) and a set of capability flags ([`HasFlags`]).
//! Flags are any [`bitflags`] type; [`FlagFilter`] selects entities by them.
//!
//! # Examples
//!
//! ```
//! use script_containers::entity::{FlagFilter, HasFlags};
//!
//! bitflags::bitflags! {
//!     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//!     struct CommandFlags: u32 {
//!         const CORE = 1 << 0;
//!         const SAFE = 1 << 1;
//!         const HIDDEN = 1 << 2;
//!     }
//! }
//!
//! // Safe commands that are not hidden.
//! let filter = FlagFilter {
//!     has: CommandFlags::SAFE,
//!     not_has: CommandFlags::HIDDEN,
//!     ..FlagFilter::any()
//! };
//! assert!(filter.matches(CommandFlags::CORE | CommandFlags::SAFE));
//! assert!(!filter.matches(CommandFlags::SAFE | CommandFlags::HIDDEN));
//! assert!(!filter.matches(CommandFlags::CORE));
//! ```

use std::fmt;
use std::sync::Arc;

use bitflags::Flags;

use crate::token::Token;

/// A value with a stable integer handle.
pub trait HasToken {
    /// The value's token. [`Token::ZERO`] when it has none.
    fn token(&self) -> Token;
}

/// A value carrying capability flags.
pub trait HasFlags {
    /// The flag set type.
    type Flags: Flags + Copy;

    /// The value's current flags.
    fn flags(&self) -> Self::Flags;
}

impl<T: HasToken + ?Sized> HasToken for Arc<T> {
    #[inline]
    fn token(&self) -> Token {
        (**self).token()
    }
}

impl<T: HasFlags + ?Sized> HasFlags for Arc<T> {
    type Flags = T::Flags;

    #[inline]
    fn flags(&self) -> Self::Flags {
        (**self).flags()
    }
}

/// Returns `true` if `flags` has all (`all`) or any (`!all`) bit of `mask`.
#[inline]
pub fn has_flags<F: Flags>(flags: F, mask: F, all: bool) -> bool {
    if all {
        flags.contains(mask)
    } else {
        flags.intersects(mask)
    }
}

/// Selects entities by required and forbidden flags.
///
/// An empty `has` or `not_has` imposes no constraint. `has_all` chooses
/// whether every bit of `has` must be present or just one; `not_has_all`
/// chooses whether an entity is rejected for having every bit of `not_has`
/// or just one.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FlagFilter<F> {
    /// Required flags.
    pub has: F,
    /// Forbidden flags.
    pub not_has: F,
    /// Require all of `has` rather than any.
    pub has_all: bool,
    /// Reject on all of `not_has` rather than any.
    pub not_has_all: bool,
}

impl<F: Flags> FlagFilter<F> {
    /// A filter matching every entity.
    pub fn any() -> Self {
        FlagFilter {
            has: F::empty(),
            not_has: F::empty(),
            has_all: false,
            not_has_all: false,
        }
    }

    /// Tests `flags` against the filter.
    pub fn matches(&self, flags: F) -> bool
    where
        F: Copy,
    {
        (self.has.is_empty() || has_flags(flags, self.has, self.has_all))
            && (self.not_has.is_empty() || !has_flags(flags, self.not_has, self.not_has_all))
    }
}

impl<F: Flags> Default for FlagFilter<F> {
    fn default() -> Self {
        Self::any()
    }
}

impl<F: fmt::Debug> fmt::Debug for FlagFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagFilter")
            .field("has", &self.has)
            .field("not_has", &self.not_has)
            .field("has_all", &self.has_all)
            .field("not_has_all", &self.not_has_all)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    bitflags::bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct Bits: u8 {
            const A = 1;
            const B = 2;
            const C = 4;
        }
    }

    #[test]
    fn test_has_flags_any_and_all() {
        assert!(has_flags(Bits::A, Bits::A | Bits::B, false));
        assert!(!has_flags(Bits::A, Bits::A | Bits::B, true));
        assert!(has_flags(Bits::A | Bits::B, Bits::A | Bits::B, true));
        assert!(!has_flags(Bits::C, Bits::A | Bits::B, false));
    }

    #[test]
    fn test_any_filter_matches_everything() {
        let filter = FlagFilter::<Bits>::default();
        assert!(filter.matches(Bits::empty()));
        assert!(filter.matches(Bits::all()));
    }

    #[test]
    fn test_not_has_modes() {
        let any_bit = FlagFilter {
            not_has: Bits::A | Bits::B,
            ..FlagFilter::any()
        };
        assert!(!any_bit.matches(Bits::A));
        assert!(any_bit.matches(Bits::C));

        let all_bits = FlagFilter {
            not_has_all: true,
            ..any_bit
        };
        assert!(all_bits.matches(Bits::A));
        assert!(!all_bits.matches(Bits::A | Bits::B));
    }

    #[test]
    fn test_has_all_mode() {
        let filter = FlagFilter {
            has: Bits::A | Bits::C,
            has_all: true,
            ..FlagFilter::any()
        };
        assert!(filter.matches(Bits::A | Bits::B | Bits::C));
        assert!(!filter.matches(Bits::A | Bits::B));
    }
}
