//! # onionhash
//!
//! Vanity onion address generator for RSA hidden service keys.
//!
//! The modulus is generated once; the search then walks odd public exponents
//! `e + 2`, `e + 4`, ... and hashes the DER-encoded public key for each until
//! the base32 address matches a pattern. The private key is derived only for
//! the winning exponent.
//!
//! ## Architecture
//!
//! - `crypto`: Key state, DER encoding, address derivation, finalization
//! - `matcher`: Pattern compilation and matching
//! - `worker`: The search loop and the worker pool
//! - `config`: Runtime configuration
//! - `error`: Error type and exit codes

pub mod config;
pub mod crypto;
pub mod error;
pub mod matcher;
pub mod worker;

pub use config::{Config, ConfigError};
pub use crypto::{FinalKey, KeyError, KeyState, OnionAddress};
pub use error::Error;
pub use matcher::{Pattern, PatternError};
pub use worker::{MatchResult, PoolEvent, SearchLoop, SearchOutcome, SearchResult, WorkerPool};
