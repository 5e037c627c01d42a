//! RSA key state for the exponent search, and the one-time finalization of
//! the winning key.

use num_bigint_dig::ModInverse;
use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use rsa::pkcs1::der::asn1::UintRef;
use rsa::pkcs1::der::EncodePem;
use rsa::pkcs1::LineEnding;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};

use super::{ExponentIterator, OnionAddress, PublicKeyEncoder};

/// Public exponent the initial key is generated with.
pub const SEED_EXPONENT: u32 = 65537;

/// Errors that can occur while producing or finalizing a key.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("RSA key generation failed: {0}")]
    Generation(#[from] rsa::Error),

    #[error("expected 2 prime factors, got {0}")]
    UnexpectedPrimeCount(usize),

    #[error("public exponent is not coprime to phi(n)")]
    NotCoprime,

    #[error("public exponent is not below phi(n)")]
    ExponentTooLarge,

    #[error("prime factors are not coprime")]
    FactorsNotCoprime,

    #[error("PEM encoding failed: {0}")]
    Encoding(#[from] rsa::pkcs1::der::Error),
}

impl KeyError {
    /// Returns true if the matched key itself is mathematically unusable.
    ///
    /// These failures cannot be fixed by retrying the same modulus; the
    /// search has to start over with fresh factors.
    pub fn is_validity_failure(&self) -> bool {
        matches!(
            self,
            KeyError::NotCoprime | KeyError::ExponentTooLarge | KeyError::FactorsNotCoprime
        )
    }
}

/// The fixed modulus of a search together with its moving public exponent.
#[derive(Debug, Clone)]
pub struct KeyState {
    n: BigUint,
    p: BigUint,
    q: BigUint,
    p_minus_1: BigUint,
    q_minus_1: BigUint,
    /// (p - 1)(q - 1), computed once
    phi: BigUint,
    exponent: ExponentIterator,
    /// Private exponent of the generated key, if the generator produced one
    seed_d: Option<BigUint>,
}

impl KeyState {
    /// Generates fresh prime factors of `bits / 2` bits each.
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R, bits: usize) -> Result<Self, KeyError> {
        let key = RsaPrivateKey::new_with_exp(rng, bits, &BigUint::from(SEED_EXPONENT))?;

        let [p, q] = key.primes() else {
            return Err(KeyError::UnexpectedPrimeCount(key.primes().len()));
        };

        Ok(Self::from_factors(
            p.clone(),
            q.clone(),
            key.e().clone(),
            Some(key.d().clone()),
        ))
    }

    /// Builds the state from known factors and a seed exponent.
    ///
    /// A missing `seed_d` marks every candidate as degenerate.
    pub fn from_factors(p: BigUint, q: BigUint, seed_e: BigUint, seed_d: Option<BigUint>) -> Self {
        let n = &p * &q;
        let p_minus_1 = &p - BigUint::one();
        let q_minus_1 = &q - BigUint::one();
        let phi = &p_minus_1 * &q_minus_1;

        Self {
            n,
            p,
            q,
            p_minus_1,
            q_minus_1,
            phi,
            exponent: ExponentIterator::new(seed_e),
            seed_d,
        }
    }

    /// Restricts this state to shard `index` of `count` of the exponent space.
    pub fn into_shard(self, index: u64, count: u64) -> Self {
        let exponent = ExponentIterator::sharded(self.exponent.current().clone(), index, count);
        Self { exponent, ..self }
    }

    /// Returns the modulus.
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// Returns Euler's totient of the modulus.
    pub fn phi(&self) -> &BigUint {
        &self.phi
    }

    /// Returns the current public exponent.
    pub fn exponent(&self) -> &BigUint {
        self.exponent.current()
    }

    /// Moves to the next candidate exponent and returns it.
    #[inline]
    pub fn advance(&mut self) -> &BigUint {
        self.exponent.next()
    }

    /// Returns true if the private exponent is undefined for this state.
    ///
    /// This is the only check made per candidate. Coprimality and the
    /// `e < phi` bound are checked once, in [`KeyState::finalize`].
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.seed_d.is_none()
    }

    /// Creates a public key encoder for this modulus.
    pub fn encoder(&self) -> PublicKeyEncoder {
        PublicKeyEncoder::new(&self.n)
    }

    /// Validates the current exponent and derives the private key.
    ///
    /// Fails if `gcd(phi, e) != 1` or `e >= phi`.
    pub fn finalize(&self) -> Result<FinalKey, KeyError> {
        let e = self.exponent.current();

        if !self.phi.gcd(e).is_one() {
            return Err(KeyError::NotCoprime);
        }
        if self.phi <= *e {
            return Err(KeyError::ExponentTooLarge);
        }

        let d = mod_inverse(e, &self.phi).ok_or(KeyError::NotCoprime)?;
        let dmp1 = &d % &self.p_minus_1;
        let dmq1 = &d % &self.q_minus_1;
        let iqmp = mod_inverse(&self.q, &self.p).ok_or(KeyError::FactorsNotCoprime)?;

        Ok(FinalKey {
            n: self.n.clone(),
            e: e.clone(),
            d,
            p: self.p.clone(),
            q: self.q.clone(),
            dmp1,
            dmq1,
            iqmp,
        })
    }
}

fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    value.clone().mod_inverse(modulus)?.to_biguint()
}

/// A complete RSA private key.
#[derive(Clone)]
pub struct FinalKey {
    n: BigUint,
    e: BigUint,
    d: BigUint,
    p: BigUint,
    q: BigUint,
    dmp1: BigUint,
    dmq1: BigUint,
    iqmp: BigUint,
}

impl FinalKey {
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn public_exponent(&self) -> &BigUint {
        &self.e
    }

    pub fn private_exponent(&self) -> &BigUint {
        &self.d
    }

    /// Returns the prime factors `(p, q)`.
    pub fn primes(&self) -> (&BigUint, &BigUint) {
        (&self.p, &self.q)
    }

    /// Returns the CRT parameters `(dmp1, dmq1, iqmp)`.
    pub fn crt_params(&self) -> (&BigUint, &BigUint, &BigUint) {
        (&self.dmp1, &self.dmq1, &self.iqmp)
    }

    /// Recomputes the onion address of this key.
    pub fn onion_address(&self) -> Result<OnionAddress, KeyError> {
        let mut encoder = PublicKeyEncoder::new(&self.n);
        Ok(OnionAddress::from_public_key_der(encoder.encode(&self.e)?))
    }

    /// Serializes the key as a PKCS#1 `RSA PRIVATE KEY` PEM block.
    pub fn to_pkcs1_pem(&self) -> Result<String, KeyError> {
        let n = self.n.to_bytes_be();
        let e = self.e.to_bytes_be();
        let d = self.d.to_bytes_be();
        let p = self.p.to_bytes_be();
        let q = self.q.to_bytes_be();
        let dmp1 = self.dmp1.to_bytes_be();
        let dmq1 = self.dmq1.to_bytes_be();
        let iqmp = self.iqmp.to_bytes_be();

        let key = rsa::pkcs1::RsaPrivateKey {
            modulus: UintRef::new(&n)?,
            public_exponent: UintRef::new(&e)?,
            private_exponent: UintRef::new(&d)?,
            prime1: UintRef::new(&p)?,
            prime2: UintRef::new(&q)?,
            exponent1: UintRef::new(&dmp1)?,
            exponent2: UintRef::new(&dmq1)?,
            coefficient: UintRef::new(&iqmp)?,
            other_prime_infos: None,
        };

        Ok(key.to_pem(LineEnding::LF)?)
    }
}

impl std::fmt::Debug for FinalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalKey")
            .field("n", &self.n)
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}
