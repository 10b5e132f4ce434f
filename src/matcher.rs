//! Address predicates used by the search workers.

use std::fmt;

use crate::error::{Result, VanityError};
use crate::onion::{is_base32_char, ADDRESS_LEN};

/// Decides whether a candidate address is the one being searched for.
///
/// Addresses are passed lowercase and without the ".onion" suffix.
pub trait AddressMatcher: Sync {
    fn matches(&self, address: &str) -> bool;
}

impl<F> AddressMatcher for F
where
    F: Fn(&str) -> bool + Sync,
{
    fn matches(&self, address: &str) -> bool {
        self(address)
    }
}

/// A validated, lowercased address prefix
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrefixPattern {
    prefix: String,
}

impl PrefixPattern {
    /// Validate a user-supplied prefix.
    ///
    /// Matching is case-insensitive, so upper-case input is folded. Anything
    /// outside `a-z2-7` could never match and is rejected up front.
    pub fn new(prefix: &str) -> Result<Self> {
        let prefix = prefix.to_ascii_lowercase();

        if let Some(c) = prefix.chars().find(|c| !is_base32_char(*c)) {
            return Err(VanityError::InvalidPrefix {
                reason: format!("'{}' is not in the base32 alphabet (a-z, 2-7)", c),
                prefix,
            });
        }
        if prefix.len() > ADDRESS_LEN {
            return Err(VanityError::InvalidPrefix {
                reason: format!("longer than the {} character address", ADDRESS_LEN),
                prefix,
            });
        }

        Ok(Self { prefix })
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Expected number of attempts before a match: 32^len
    pub fn expected_attempts(&self) -> f64 {
        2_f64.powi(5 * self.prefix.len() as i32)
    }
}

impl AddressMatcher for PrefixPattern {
    #[inline]
    fn matches(&self, address: &str) -> bool {
        address.starts_with(&self.prefix)
    }
}

impl fmt::Display for PrefixPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_case_insensitive() {
        let pattern = PrefixPattern::new("TeSt").unwrap();
        assert_eq!(pattern.as_str(), "test");
        assert!(pattern.matches("testabcdefg"));
        assert!(!pattern.matches("tesabcdefg"));
    }

    #[test]
    fn test_empty_prefix_matches_everything() {
        let pattern = PrefixPattern::new("").unwrap();
        assert!(pattern.is_empty());
        assert!(pattern.matches("anything"));
        assert_eq!(pattern.expected_attempts(), 1.0);
    }

    #[test]
    fn test_rejects_characters_outside_alphabet() {
        for bad in ["onion1", "0abc", "ab8", "a-b", "a b"] {
            match PrefixPattern::new(bad) {
                Err(VanityError::InvalidPrefix { .. }) => {}
                other => panic!("{} accepted: {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_rejects_overlong_prefix() {
        assert!(PrefixPattern::new(&"a".repeat(56)).is_ok());
        assert!(PrefixPattern::new(&"a".repeat(57)).is_err());
    }

    #[test]
    fn test_expected_attempts() {
        let pattern = PrefixPattern::new("abc").unwrap();
        assert_eq!(pattern.expected_attempts(), 32_768.0);
    }

    #[test]
    fn test_closure_matcher() {
        let always = |_: &str| true;
        assert!(always.matches("x"));
    }
}
