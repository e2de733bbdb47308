//! Key patterns for registry listings.
//!
//! Patterns are shell globs (`*`, `?`, `[...]`). `/` and a leading `.` are
//! ordinary characters, since keys are names, not paths.

use glob::{MatchOptions, Pattern};

use crate::error::{ContainerError, Result};

/// A compiled glob pattern with its case sensitivity.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    pattern: Pattern,
    options: MatchOptions,
}

impl KeyPattern {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// [`ContainerError::InvalidPattern`] if the glob is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use script_containers::pattern::KeyPattern;
    ///
    /// let pattern = KeyPattern::new("string*", true).unwrap();
    /// assert!(pattern.matches("StringMap"));
    /// assert!(!pattern.matches("list"));
    /// assert!(KeyPattern::new("[", false).is_err());
    /// ```
    pub fn new(pattern: &str, no_case: bool) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|err| ContainerError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.msg.to_string(),
        })?;

        Ok(Self {
            pattern: compiled,
            options: MatchOptions {
                case_sensitive: !no_case,
                require_literal_separator: false,
                require_literal_leading_dot: false,
            },
        })
    }

    /// Compiles `pattern` if there is one. `None` matches every key.
    pub fn optional(pattern: Option<&str>, no_case: bool) -> Result<Option<Self>> {
        pattern.map(|pattern| Self::new(pattern, no_case)).transpose()
    }

    /// Tests `key` against the pattern.
    #[inline]
    pub fn matches(&self, key: &str) -> bool {
        self.pattern.matches_with(key, self.options)
    }

    /// The pattern as written.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Tests `key` against an optional pattern.
#[inline]
pub(crate) fn matches_optional(pattern: Option<&KeyPattern>, key: &str) -> bool {
    pattern.map_or(true, |pattern| pattern.matches(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_sensitivity() {
        let exact = KeyPattern::new("Foo*", false).unwrap();
        assert!(exact.matches("FooBar"));
        assert!(!exact.matches("foobar"));

        let folded = KeyPattern::new("Foo*", true).unwrap();
        assert!(folded.matches("foobar"));
    }

    #[test]
    fn test_separators_are_ordinary() {
        let pattern = KeyPattern::new("a*z", false).unwrap();
        assert!(pattern.matches("a/b/z"));
        assert!(KeyPattern::new("*", false).unwrap().matches(".hidden"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = KeyPattern::new("[a-", false).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidPattern { ref pattern, .. } if pattern == "[a-"));
    }

    #[test]
    fn test_optional() {
        assert!(KeyPattern::optional(None, false).unwrap().is_none());
        let pattern = KeyPattern::optional(Some("x?"), false).unwrap();
        assert!(matches_optional(pattern.as_ref(), "xy"));
        assert!(!matches_optional(pattern.as_ref(), "xyz"));
        assert!(matches_optional(None, "anything"));
    }
}
