//! Slot pool benchmarks
//!
//! Compares the pool against the system allocator across the workloads the
//! pool is built for: single-object churn, batch alloc/free rounds, and
//! contiguous-run allocation.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use slotpool::{PoolConfig, SlotPool};
use std::alloc::Layout;
use std::hint::black_box;

/// Demonstration payload: two f64 fields, 16 bytes.
#[derive(Clone, Copy)]
#[allow(dead_code)]
struct Sample {
    re: f64,
    im: f64,
}

const SAMPLE_SIZE: usize = size_of::<Sample>();

fn bench_single_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_cycle");

    group.bench_function("pool_16b", |b| {
        let mut pool = SlotPool::for_type::<Sample>(PoolConfig::production()).unwrap();

        b.iter(|| {
            let ptr = pool.allocate(SAMPLE_SIZE).unwrap();
            pool.free(ptr.as_ptr()).unwrap();
            black_box(ptr);
        });
    });

    group.bench_function("system_16b", |b| {
        let layout = Layout::new::<Sample>();

        b.iter(|| unsafe {
            let ptr = std::alloc::alloc(layout);
            std::alloc::dealloc(ptr, layout);
            black_box(ptr);
        });
    });

    group.finish();
}

fn bench_batch_rounds(c: &mut Criterion) {
    const BATCH: usize = 2000;

    let mut group = c.benchmark_group("batch_rounds");
    group.throughput(Throughput::Elements(BATCH as u64));

    group.bench_function("pool_2000x16b", |b| {
        let mut pool = SlotPool::for_type::<Sample>(PoolConfig {
            capacity: BATCH,
            ..PoolConfig::production()
        })
        .unwrap();

        b.iter(|| {
            let mut ptrs = Vec::with_capacity(BATCH);
            for _ in 0..BATCH {
                ptrs.push(pool.allocate(SAMPLE_SIZE).unwrap());
            }
            for ptr in ptrs {
                pool.free(ptr.as_ptr()).unwrap();
            }
        });
    });

    group.bench_function("system_2000x16b", |b| {
        let layout = Layout::new::<Sample>();

        b.iter(|| unsafe {
            let mut ptrs = Vec::with_capacity(BATCH);
            for _ in 0..BATCH {
                ptrs.push(std::alloc::alloc(layout));
            }
            for ptr in ptrs {
                std::alloc::dealloc(ptr, layout);
            }
        });
    });

    group.finish();
}

fn bench_run_allocation(c: &mut Criterion) {
    const RUN: usize = 8;

    let mut group = c.benchmark_group("run_allocation");

    for index_levels in [1usize, 4] {
        group.bench_function(format!("pool_run8_levels{index_levels}"), |b| {
            let mut pool = SlotPool::for_type::<Sample>(PoolConfig {
                capacity: 4096,
                support_runs: true,
                index_levels,
                ..PoolConfig::production()
            })
            .unwrap();

            b.iter(|| {
                let ptr = pool.allocate(RUN * SAMPLE_SIZE).unwrap();
                pool.free(ptr.as_ptr()).unwrap();
                black_box(ptr);
            });
        });
    }

    group.bench_function("system_run8", |b| {
        let layout = Layout::array::<Sample>(RUN).unwrap();

        b.iter(|| unsafe {
            let ptr = std::alloc::alloc(layout);
            std::alloc::dealloc(ptr, layout);
            black_box(ptr);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_cycle,
    bench_batch_rounds,
    bench_run_allocation
);
criterion_main!(benches);
