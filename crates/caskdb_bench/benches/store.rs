//! Whole-store put/get benchmarks.

use caskdb_bench::utils::random_pairs;
use caskdb_core::Store;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;

fn started_store() -> (Store, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    store.start().unwrap();
    (store, dir)
}

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/put");

    for value_len in [64usize, 1024] {
        group.bench_function(format!("{value_len}B"), |b| {
            b.iter_batched(
                || {
                    let pairs = random_pairs(256, 16, value_len);
                    (started_store(), pairs)
                },
                |((store, _dir), pairs)| {
                    for (key, value) in pairs {
                        store.put(key, value).unwrap();
                    }
                    store.close().unwrap();
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let (store, _dir) = started_store();
    let pairs = random_pairs(1024, 16, 256);
    for (key, value) in &pairs {
        store.put(key, value).unwrap();
    }

    c.bench_function("store/get", |b| {
        let mut i = 0;
        b.iter(|| {
            let (key, _) = &pairs[i % pairs.len()];
            i += 1;
            black_box(store.get(key).unwrap())
        });
    });
}

criterion_group!(benches, bench_put, bench_get);
criterion_main!(benches);
