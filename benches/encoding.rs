//! Benchmarks for the payload-encoding and short-id-resolution hot paths,
//! which run once per metric value per reporting cycle.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use metric_relay::core::MetricLabels;
use metric_relay::shortid::{MetricIdentity, ShortIdCache};
use metric_relay::wire::{encode_counter, encode_distribution, MetricUrn};

fn bench_encoders(c: &mut Criterion) {
    c.bench_function("encode_counter_small", |b| {
        b.iter(|| encode_counter(black_box(42)))
    });
    c.bench_function("encode_counter_large", |b| {
        b.iter(|| encode_counter(black_box(i64::MAX)))
    });
    c.bench_function("encode_distribution", |b| {
        b.iter(|| encode_distribution(black_box(3), black_box(30), black_box(5), black_box(15)))
    });
}

fn bench_short_id_resolution(c: &mut Criterion) {
    let cache = ShortIdCache::new();
    let identity = MetricIdentity::new(
        MetricLabels::new("t1", "ns", "n").unwrap(),
        MetricUrn::UserSumInt64,
    );
    // Warm the cache so the bench measures the hit path, which is what
    // every cycle after the first takes.
    cache.resolve(&identity);

    c.bench_function("short_id_cache_hit", |b| {
        b.iter(|| cache.resolve(black_box(&identity)))
    });
}

criterion_group!(benches, bench_encoders, bench_short_id_resolution);
criterion_main!(benches);
