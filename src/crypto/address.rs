//! Onion address representation and derivation.

use std::fmt;

use data_encoding::BASE32_NOPAD;
use sha1::{Digest, Sha1};

/// Length of a SHA1 digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// Number of characters in a (v2) onion address, without the `.onion` suffix.
pub const ADDRESS_LEN: usize = 16;

/// The base32 alphabet every address character is drawn from.
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz234567";

/// Only the leading 80 bits of the digest make it into the address.
const ADDRESS_INPUT_LEN: usize = 10;

/// Computes the SHA1 digest of `bytes`.
#[inline]
pub fn sha1_digest(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&Sha1::digest(bytes));
    digest
}

/// A 16-character onion address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OnionAddress([u8; ADDRESS_LEN]);

impl OnionAddress {
    /// Derives the address from a SHA1 digest.
    ///
    /// The first 10 bytes are split into sixteen 5-bit groups, most
    /// significant bit first, and each group is mapped through [`ALPHABET`].
    /// The trailing 10 bytes of the digest are discarded.
    #[inline]
    pub fn from_digest(digest: &[u8; DIGEST_LEN]) -> Self {
        let mut buf = [0u8; ADDRESS_LEN];
        BASE32_NOPAD.encode_mut(&digest[..ADDRESS_INPUT_LEN], &mut buf);
        buf.make_ascii_lowercase();
        Self(buf)
    }

    /// Derives the address from the DER encoding of an RSA public key.
    #[inline]
    pub fn from_public_key_der(der: &[u8]) -> Self {
        Self::from_digest(&sha1_digest(der))
    }

    /// Returns the address as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        // Base32 output is always ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Returns the address with the `.onion` suffix.
    pub fn to_hostname(&self) -> String {
        format!("{}.onion", self.as_str())
    }
}

impl fmt::Debug for OnionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OnionAddress({})", self.as_str())
    }
}

impl fmt::Display for OnionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_with_prefix(prefix: &[u8]) -> [u8; DIGEST_LEN] {
        let mut digest = [0u8; DIGEST_LEN];
        digest[..prefix.len()].copy_from_slice(prefix);
        digest
    }

    #[test]
    fn test_known_prefixes() {
        assert_eq!(
            OnionAddress::from_digest(&[0u8; DIGEST_LEN]).as_str(),
            "aaaaaaaaaaaaaaaa"
        );
        assert_eq!(
            OnionAddress::from_digest(&digest_with_prefix(&[0xff; 10])).as_str(),
            "7777777777777777"
        );
        // Each 5-bit group counts up from 0 to 15.
        let counting = hex::decode("00443214c74254b635cf").unwrap();
        assert_eq!(
            OnionAddress::from_digest(&digest_with_prefix(&counting)).as_str(),
            "abcdefghijklmnop"
        );
    }

    #[test]
    fn test_trailing_digest_bytes_are_ignored() {
        let mut a = [0x5au8; DIGEST_LEN];
        let mut b = a;
        a[10..].fill(0x00);
        b[10..].fill(0xff);
        assert_eq!(OnionAddress::from_digest(&a), OnionAddress::from_digest(&b));
    }

    #[test]
    fn test_output_alphabet_and_length() {
        for seed in 0u8..=255 {
            let digest = sha1_digest(&[seed]);
            let address = OnionAddress::from_digest(&digest);
            assert_eq!(address.as_str().len(), ADDRESS_LEN);
            assert!(address.as_str().chars().all(|c| ALPHABET.contains(c)));
        }
    }

    #[test]
    fn test_address_from_public_key_der() {
        // SEQUENCE { INTEGER 3233, INTEGER 17 }
        let der = hex::decode("300702020ca1020111").unwrap();
        assert_eq!(
            hex::encode(sha1_digest(&der)),
            "eaa7d4a79cd76eba61b5e178848c7b500ee32add"
        );
        let address = OnionAddress::from_public_key_der(&der);
        assert_eq!(address.as_str(), "5kt5jj4425xluynv");
        assert_eq!(address.to_hostname(), "5kt5jj4425xluynv.onion");
    }
}
