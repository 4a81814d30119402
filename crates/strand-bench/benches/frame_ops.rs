//! Criterion benchmarks for full `run_frame` cycles.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strand_bench::{chain_group, tick_all, wide_tree};

/// Benchmark: steady-state frame over 1K counters (no disposal, no sort).
fn bench_frame_wide_1k(c: &mut Criterion) {
    let (mut rt, root) = wide_tree(1_000);
    rt.run_frame().unwrap();
    c.bench_function("frame_wide_1k", |b| {
        b.iter(|| {
            tick_all(&mut rt, root);
            black_box(rt.run_frame().unwrap());
        });
    });
}

/// Benchmark: first frame of a 256-node reversed dependency chain.
fn bench_frame_sort_chain_256(c: &mut Criterion) {
    c.bench_function("frame_sort_chain_256", |b| {
        b.iter_batched(
            || chain_group(256),
            |(mut rt, _)| black_box(rt.run_frame().unwrap()),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_frame_wide_1k, bench_frame_sort_chain_256);
criterion_main!(benches);
