//! Deterministic workload generation for benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generates `count` random key/value pairs with the given sizes,
/// seeded so every benchmark run sees the same workload.
pub fn random_pairs(count: usize, key_len: usize, value_len: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(0xCA5C);
    (0..count)
        .map(|_| {
            let key = (&mut rng).sample_iter(rand::distributions::Standard).take(key_len).collect();
            let value = (&mut rng)
                .sample_iter(rand::distributions::Standard)
                .take(value_len)
                .collect();
            (key, value)
        })
        .collect()
}
