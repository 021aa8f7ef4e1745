//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random keys, values, and whole
//! workloads. Workload keys are drawn from a small pool so that
//! overwrites (and therefore last-write-wins behavior and merge
//! shrinkage) actually occur.

use proptest::prelude::*;

/// Strategy for generating keys: 1 to 32 arbitrary bytes.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=32)
}

/// Strategy for generating values: 0 to 256 arbitrary bytes.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=256)
}

/// Strategy for generating one put against a bounded key pool.
fn op_strategy(pool: usize) -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (0..pool, value_strategy())
        .prop_map(|(slot, value)| (format!("key-{slot:03}").into_bytes(), value))
}

/// Strategy for generating a workload of up to `max_ops` puts over a
/// pool of `pool` distinct keys.
pub fn workload_strategy(
    pool: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>)>> {
    prop::collection::vec(op_strategy(pool), 1..=max_ops)
}

/// Replays a workload into a model map: the expected store contents
/// after applying it in order.
pub fn model_of(workload: &[(Vec<u8>, Vec<u8>)]) -> std::collections::HashMap<Vec<u8>, Vec<u8>> {
    let mut model = std::collections::HashMap::new();
    for (key, value) in workload {
        model.insert(key.clone(), value.clone());
    }
    model
}
