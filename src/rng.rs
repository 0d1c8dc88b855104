//! A splittable PRNG wrapper (spec.md §5, §9).
//!
//! Every operator, initializer branch, and elite strategy draws its own
//! `ChaCha8Rng` stream derived from a single master seed plus the
//! generation/candidate indices that identify the call site. This keeps a
//! single shared resource (the `Parameters::master_seed`) reproducible
//! across runs while letting candidates be processed in parallel without
//! ever sharing a generator instance.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Mixes a master seed with arbitrary call-site coordinates into a new
/// 64-bit seed. Based on the SplitMix64 finalizer, which is the standard
/// way to turn a counter into well-distributed seeds for a sub-stream.
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = z;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derives a reproducible seed for a given `(generation, slot)` coordinate
/// pair from the master seed. `slot` typically identifies a candidate
/// index, an operator call, or an elite strategy slot within a generation.
pub fn derive_seed(master_seed: u64, generation: u64, slot: u64) -> u64 {
    let mixed = splitmix64(master_seed ^ generation.rotate_left(32) ^ slot);
    splitmix64(mixed)
}

/// Builds a fresh, independent RNG stream for the given coordinates.
pub fn rng_for(master_seed: u64, generation: u64, slot: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(master_seed, generation, slot))
}
