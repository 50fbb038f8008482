#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic 32-bit xorshift generator backing the seed stream.
//!
//! Stream index 0 holds the first value produced after seeding, so the seed
//! itself never appears in the stream.

use gacha_route_core::SeedStream;

/// 32-bit xorshift generator with shift triple (13, 17, 15).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Seeds the generator; a zero seed is coerced to 1.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Advances the generator and returns the new state.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 15;
        self.state = x;
        x
    }
}

impl Iterator for Xorshift32 {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_u32())
    }
}

/// Generates the first `len` stream values for `seed`.
#[must_use]
pub fn generate_stream(seed: u32, len: usize) -> SeedStream {
    SeedStream::from_values(Xorshift32::new(seed).take(len).collect())
}
