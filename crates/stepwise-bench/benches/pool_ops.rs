//! Criterion micro-benchmarks for chunk pool reuse and chunked appends.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use stepwise_arena::{ChunkPool, ChunkedVec, PoolConfig};

fn config() -> PoolConfig {
    PoolConfig {
        chunk_capacity: 256,
        max_retained_chunks: 1024,
    }
}

fn bench_acquire_release(c: &mut Criterion) {
    let mut pool: ChunkPool<[f64; 3]> = ChunkPool::new(&config()).unwrap();
    let warm = pool.acquire();
    pool.release(warm);

    c.bench_function("pool_acquire_release", |b| {
        b.iter(|| {
            let chunk = pool.acquire();
            black_box(chunk.capacity());
            pool.release(chunk);
        });
    });
}

fn bench_push_10k_recycled(c: &mut Criterion) {
    let mut pool: ChunkPool<[f64; 3]> = ChunkPool::new(&config()).unwrap();

    c.bench_function("chunked_push_10k_recycled", |b| {
        b.iter(|| {
            let mut v = ChunkedVec::new();
            for i in 0..10_000 {
                v.push([i as f64, 0.0, 0.0], &mut pool);
            }
            black_box(v.len());
            v.release_into(&mut pool);
        });
    });
}

fn bench_push_10k_fresh(c: &mut Criterion) {
    c.bench_function("chunked_push_10k_fresh", |b| {
        b.iter(|| {
            let mut pool: ChunkPool<[f64; 3]> = ChunkPool::new(&config()).unwrap();
            let mut v = ChunkedVec::new();
            for i in 0..10_000 {
                v.push([i as f64, 0.0, 0.0], &mut pool);
            }
            black_box(v.len());
        });
    });
}

fn bench_merge(c: &mut Criterion) {
    let mut pool: ChunkPool<[f64; 3]> = ChunkPool::new(&config()).unwrap();

    c.bench_function("chunked_append_from_1k", |b| {
        b.iter(|| {
            let mut a = ChunkedVec::new();
            let mut other = ChunkedVec::new();
            for i in 0..1_000 {
                a.push([i as f64, 0.0, 0.0], &mut pool);
                other.push([0.0, i as f64, 0.0], &mut pool);
            }
            a.append_from(other, 1, &mut pool);
            black_box(a.len());
            a.release_into(&mut pool);
        });
    });
}

criterion_group!(
    benches,
    bench_acquire_release,
    bench_push_10k_recycled,
    bench_push_10k_fresh,
    bench_merge
);
criterion_main!(benches);
