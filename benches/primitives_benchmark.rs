use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use blockgraph::primitives::{
    bucket_sort_pairs, counting_sort, prefix_sum_with_workers, radix_sort_pairs_with_workers,
};

fn bench_prefix_sum(c: &mut Criterion) {
    let n = 1 << 20;
    let input: Vec<i64> = (0..n).map(|i| (i * 7919) % 97).collect();

    let mut group = c.benchmark_group("prefix_sum");
    group.throughput(Throughput::Elements(n as u64));
    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &w| {
            b.iter_batched_ref(
                || input.clone(),
                |v| black_box(prefix_sum_with_workers(v, w).unwrap()),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_pair_sorts(c: &mut Criterion) {
    let n = 1 << 17;
    // Source-like keys: few distinct values, many repeats.
    let pairs: Vec<[i64; 2]> = (0..n as i64).map(|i| [(i * 31) % 4096, i]).collect();

    let mut group = c.benchmark_group("pair_sort");
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("bucket", |b| {
        b.iter_batched_ref(
            || pairs.clone(),
            |v| bucket_sort_pairs(v).unwrap(),
            criterion::BatchSize::LargeInput,
        );
    });
    for bits in [4, 8, 11] {
        group.bench_with_input(BenchmarkId::new("radix", bits), &bits, |b, &bits| {
            b.iter_batched_ref(
                || pairs.clone(),
                |v| radix_sort_pairs_with_workers(v, bits, 4).unwrap(),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.bench_function("std_sort_unstable", |b| {
        b.iter_batched_ref(
            || pairs.clone(),
            |v| v.sort_unstable(),
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_counting_sort(c: &mut Criterion) {
    let keys: Vec<i64> = (0..1_000_000i64).map(|i| (i * 2_654_435_761) % 10_000).collect();

    c.bench_function("counting_sort_1m", |b| {
        b.iter_batched_ref(
            || keys.clone(),
            |v| counting_sort(v).unwrap(),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_prefix_sum, bench_pair_sorts, bench_counting_sort);
criterion_main!(benches);
