use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic generator for ordering experiments.
///
/// ChaCha8 keyed through `seed_from_u64` (SplitMix64 expansion of the 64-bit
/// seed), so a given `base ^ stream` pair reproduces the same shuffle
/// sequence on every platform and every run. The vacation allocator and the
/// rebalancer both draw from this and nothing else.
pub fn seeded_rng(base_seed: u64, stream: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(base_seed ^ stream)
}
