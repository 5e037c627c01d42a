//! Top-level error type and process exit codes.

use crate::config::ConfigError;
use crate::crypto::KeyError;
use crate::matcher::PatternError;

/// Wrong number of arguments or otherwise unusable configuration.
pub const EXIT_USAGE: i32 = 1;
/// The pattern did not compile.
pub const EXIT_PATTERN: i32 = 2;
/// The search was interrupted.
pub const EXIT_INTERRUPTED: i32 = 3;
/// The matched key failed its validity checks.
pub const EXIT_INVALID_KEY: i32 = 4;
/// Any other runtime failure.
pub const EXIT_FAILURE: i32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Caught SIGINT after {attempts} tries - exiting.")]
    Interrupted { attempts: u64 },

    #[error("No match after {attempts} tries - giving up.")]
    Exhausted { attempts: u64 },
}

impl Error {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => EXIT_USAGE,
            Error::Pattern(_) => EXIT_PATTERN,
            Error::Interrupted { .. } => EXIT_INTERRUPTED,
            Error::Key(e) if e.is_validity_failure() => EXIT_INVALID_KEY,
            Error::Key(_) | Error::Exhausted { .. } => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::matcher::Pattern;

    #[test]
    fn test_exit_codes() {
        let usage = Error::from(ConfigError::InvalidValue("key too small".into()));
        assert_eq!(usage.exit_code(), 1);

        let pattern = Error::from(Pattern::compile("(unclosed").unwrap_err());
        assert_eq!(pattern.exit_code(), 2);

        assert_eq!(Error::Interrupted { attempts: 7 }.exit_code(), 3);
        assert_eq!(Error::from(KeyError::NotCoprime).exit_code(), 4);
        assert_eq!(Error::from(KeyError::ExponentTooLarge).exit_code(), 4);
        assert_eq!(Error::from(KeyError::UnexpectedPrimeCount(3)).exit_code(), 5);
        assert_eq!(Error::Exhausted { attempts: 7 }.exit_code(), 5);
    }

    #[test]
    fn test_interrupt_message() {
        assert_eq!(
            Error::Interrupted { attempts: 42 }.to_string(),
            "Caught SIGINT after 42 tries - exiting."
        );
    }
}
