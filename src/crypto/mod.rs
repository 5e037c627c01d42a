//! RSA key material and onion address derivation.
//!
//! This module provides:
//! - Seed key generation and the fixed-modulus key state
//! - The odd public exponent walk
//! - PKCS#1 DER encoding of `(n, e)`
//! - SHA1 + base32 onion address derivation
//! - One-time private key finalization

mod address;
mod exponent;
mod keypair;
mod public_key;

pub use address::{sha1_digest, OnionAddress, ADDRESS_LEN, ALPHABET, DIGEST_LEN};
pub use exponent::ExponentIterator;
pub use keypair::{FinalKey, KeyError, KeyState, SEED_EXPONENT};
pub use public_key::PublicKeyEncoder;
