//! Pattern matching implementation.

use regex::Regex;

use crate::crypto::OnionAddress;

/// Error returned when a pattern fails to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid pattern: {0}")]
pub struct PatternError(#[from] regex::Error);

/// A compiled extended regular expression tested against onion addresses.
///
/// The pattern is unanchored, so `abc` matches anywhere in the address and
/// `^`/`$` pin it to either end. Nothing checks that the pattern stays within
/// the base32 alphabet; a pattern that can only match other characters just
/// never matches.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles a pattern.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Returns the source pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Tests an address against this pattern.
    #[inline]
    pub fn matches(&self, address: &OnionAddress) -> bool {
        self.regex.is_match(address.as_str())
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
