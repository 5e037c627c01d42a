//! Public exponent candidates.

use rsa::BigUint;

/// Walks odd public exponents upward from a seed exponent.
///
/// A single walker visits `seed + 2`, `seed + 4`, ... A sharded walker
/// `index` of `count` starts at `seed + 2 * (index + 1)` and advances by
/// `2 * count`, so `count` shards together cover the same sequence.
#[derive(Debug, Clone)]
pub struct ExponentIterator {
    current: BigUint,
    /// Added on the next call to `next()`
    increment: u64,
    /// Added on every call after the first
    stride: u64,
}

impl ExponentIterator {
    /// Creates a walker over every odd exponent above `seed`.
    pub fn new(seed: BigUint) -> Self {
        Self::sharded(seed, 0, 1)
    }

    /// Creates walker `index` of `count` interleaved walkers.
    pub fn sharded(seed: BigUint, index: u64, count: u64) -> Self {
        debug_assert!(index < count);
        Self {
            current: seed,
            increment: 2 * (index + 1),
            stride: 2 * count,
        }
    }

    /// Advances to the next candidate and returns it.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &BigUint {
        self.current += self.increment;
        self.increment = self.stride;
        &self.current
    }

    /// Returns the most recently produced exponent (the seed before the first
    /// call to `next()`).
    #[inline]
    pub fn current(&self) -> &BigUint {
        &self.current
    }
}
