//! Runtime configuration for the onion address generator.

use clap::Parser;

/// Extra usage text listing pattern examples.
const PATTERN_HELP: &str = "\
The base32 alphabet allows letters [a-z] and digits [2-7].
PATTERN is an extended regular expression, e.g.
  xxx           must contain 'xxx'
  bar$          must end with 'bar'
  ^foo          must begin with 'foo'
  b[a4]r        may contain leetspeak ;)
  ^ab|^cd       must begin with 'ab' or 'cd'
  [a-z]{16}     must contain letters only, no digits
  ^dusk.*dawn$  must begin with 'dusk' and end with 'dawn'";

/// Smallest modulus the generator accepts.
pub const MIN_BITS: usize = 512;

/// Brute-force RSA keys until their onion address matches a pattern
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, after_help = PATTERN_HELP)]
pub struct Config {
    /// Extended regular expression the address must match
    pub pattern: String,

    /// RSA modulus size in bits
    #[arg(short, long, default_value = "1024")]
    pub bits: usize,

    /// Number of worker threads, each searching its own share of exponents
    /// (0 = one per CPU core)
    #[arg(short, long, default_value = "1")]
    pub workers: usize,

    /// Progress report interval in seconds
    #[arg(short, long, default_value = "5")]
    pub report_interval: u64,

    /// Seed for the prime factor generator (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Give up after this many attempts (0 = never)
    #[arg(long, default_value = "0")]
    pub max_attempts: u64,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bits < MIN_BITS {
            return Err(ConfigError::InvalidValue(format!(
                "Key size must be at least {} bits",
                MIN_BITS
            )));
        }

        if self.report_interval == 0 {
            return Err(ConfigError::InvalidValue(
                "Report interval must be at least 1 second".into(),
            ));
        }

        Ok(())
    }

    /// Returns the number of workers, defaulting to CPU count when 0
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    /// Returns the attempt cap, if any.
    pub fn attempt_cap(&self) -> Option<u64> {
        (self.max_attempts > 0).then_some(self.max_attempts)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
