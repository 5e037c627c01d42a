//! Pattern matching for onion addresses.
//!
//! Patterns are extended regular expressions, e.g.
//! - `^foo`: must begin with "foo"
//! - `bar$`: must end with "bar"
//! - `^ab|^cd`: must begin with "ab" or "cd"

mod pattern;

pub use pattern::{Pattern, PatternError};
