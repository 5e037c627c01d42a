//! DER encoding of PKCS#1 `RSAPublicKey` structures.
//!
//! ```text
//! RSAPublicKey ::= SEQUENCE {
//!     modulus           INTEGER,  -- n
//!     publicExponent    INTEGER   -- e
//! }
//! ```
//!
//! The modulus is fixed for a whole search, so its magnitude is extracted
//! once. The output buffer is reused across calls.

use rsa::pkcs1::der::asn1::UintRef;
use rsa::pkcs1::der::{self, Encode};
use rsa::BigUint;

/// Encodes `(n, e)` public keys against a fixed modulus.
#[derive(Debug, Clone)]
pub struct PublicKeyEncoder {
    /// Big-endian magnitude of `n`
    modulus: Vec<u8>,
    /// Output buffer reused across calls
    buf: Vec<u8>,
}

impl PublicKeyEncoder {
    /// Creates an encoder for the given modulus.
    pub fn new(modulus: &BigUint) -> Self {
        let modulus = modulus.to_bytes_be();
        // Room for both integers at modulus size plus their headers.
        let capacity = 2 * modulus.len() + 16;

        Self {
            modulus,
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Encodes the public key `(n, exponent)` and returns the DER bytes.
    ///
    /// The returned slice is only valid until the next call.
    #[inline]
    pub fn encode(&mut self, exponent: &BigUint) -> Result<&[u8], der::Error> {
        let exponent = exponent.to_bytes_be();
        let key = rsa::pkcs1::RsaPublicKey {
            modulus: UintRef::new(&self.modulus)?,
            public_exponent: UintRef::new(&exponent)?,
        };

        self.buf.clear();
        key.encode_to_vec(&mut self.buf)?;
        Ok(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rsa::pkcs1::der::Decode;
    use rsa::pkcs1::EncodeRsaPublicKey;
    use rsa::traits::PublicKeyParts;
    use rsa::{RsaPrivateKey, RsaPublicKey};

    fn decode(der: &[u8]) -> (BigUint, BigUint) {
        let key = rsa::pkcs1::RsaPublicKey::from_der(der).unwrap();
        (
            BigUint::from_bytes_be(key.modulus.as_bytes()),
            BigUint::from_bytes_be(key.public_exponent.as_bytes()),
        )
    }

    #[test]
    fn test_short_form_encoding() {
        let mut encoder = PublicKeyEncoder::new(&BigUint::from(3233u32));
        assert_eq!(
            hex::encode(encoder.encode(&BigUint::from(17u32)).unwrap()),
            "300702020ca1020111"
        );
        // High bit set: needs a sign pad.
        assert_eq!(
            hex::encode(encoder.encode(&BigUint::from(129u32)).unwrap()),
            "300802020ca102020081"
        );
        assert_eq!(
            hex::encode(encoder.encode(&BigUint::from(1u32 << 24)).unwrap()),
            "300a02020ca1020401000000"
        );
    }

    #[test]
    fn test_long_form_encoding() {
        let modulus = (BigUint::from(1u32) << 1023usize) + BigUint::from(1u32);
        let mut encoder = PublicKeyEncoder::new(&modulus);
        let der = encoder.encode(&BigUint::from(65537u32)).unwrap();
        assert_eq!(der.len(), 140);
        assert_eq!(hex::encode(&der[..8]), "3081890281810080");
        assert_eq!(hex::encode(&der[der.len() - 5..]), "0203010001");
    }

    #[test]
    fn test_length_tracks_exponent_growth() {
        let modulus = (BigUint::from(1u32) << 511usize) + BigUint::from(12345u32);
        let mut encoder = PublicKeyEncoder::new(&modulus);
        let short = encoder.encode(&BigUint::from(65537u32)).unwrap().len();
        let long = encoder.encode(&BigUint::from(u64::MAX)).unwrap().len();
        assert_eq!(short, 74);
        // 8 magnitude bytes plus a sign pad instead of 3 bytes.
        assert_eq!(long, short + 6);
    }

    #[test]
    fn test_round_trip() {
        let modulus = (BigUint::from(1u32) << 511usize) + BigUint::from(12345u32);
        let mut encoder = PublicKeyEncoder::new(&modulus);
        for exponent in [3u64, 127, 128, 255, 65537, 1 << 40, u64::MAX] {
            let exponent = BigUint::from(exponent);
            let der = encoder.encode(&exponent).unwrap().to_vec();
            assert_eq!(decode(&der), (modulus.clone(), exponent));
        }
    }

    #[test]
    fn test_matches_pkcs1_encoder() {
        let mut rng = StdRng::seed_from_u64(3);
        let private_key = RsaPrivateKey::new(&mut rng, 512).unwrap();
        let public_key = RsaPublicKey::from(&private_key);
        let expected = public_key.to_pkcs1_der().unwrap();

        let mut encoder = PublicKeyEncoder::new(public_key.n());
        assert_eq!(encoder.encode(public_key.e()).unwrap(), expected.as_bytes());
    }
}
