//! Deterministic, portable seeded RNG.
//!
//! # Determinism strategy
//!
//! Procedural content is persisted, so it must regenerate identically across
//! processes, platforms and releases.  `SeededRng` therefore wraps
//! `ChaCha8Rng` (a portable stream cipher RNG) rather than `SmallRng`.
//!
//! There is no global generator.  A caller derives a seed with
//! [`mix_seed`] from stable inputs (world seed, tile coordinates, point
//! coordinates), drives a `SeededRng` from it, and passes the generator by
//! `&mut` to whatever consumes the sequence.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// SplitMix64 finaliser — a bijective avalanche over `u64`.
#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(MIXING_CONSTANT);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Fold `parts` into `base` through repeated SplitMix64 rounds.
///
/// Order-sensitive: `mix_seed(s, &[a, b]) != mix_seed(s, &[b, a])` in general.
pub fn mix_seed(base: u64, parts: &[u64]) -> u64 {
    parts
        .iter()
        .fold(splitmix64(base), |h, &p| splitmix64(h ^ p.wrapping_mul(MIXING_CONSTANT)))
}

// ── SeededRng ─────────────────────────────────────────────────────────────────

/// A seeded generator whose state is an ordinary value owned by the caller.
#[derive(Clone, Debug)]
pub struct SeededRng(ChaCha8Rng);

impl SeededRng {
    /// Start a fresh stream from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        SeededRng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Uniform `f64` in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}
