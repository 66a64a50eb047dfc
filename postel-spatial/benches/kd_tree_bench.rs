//! k-d tree benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use postel_spatial::KdTree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn random_points(count: usize) -> Vec<(u64, f64, f64)> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count as u64)
        .map(|i| (i, rng.gen_range(0.0..2048.0), rng.gen_range(0.0..2048.0)))
        .collect()
}

fn bench_kd_tree_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("KdTree Insert");

    for size in [100, 1000, 10000].iter() {
        let points = random_points(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &points, |b, points| {
            b.iter(|| {
                let mut tree = KdTree::with_capacity(points.len());
                for &(key, x, y) in points {
                    tree.insert(key, x, y).unwrap();
                }
                black_box(tree.len())
            });
        });
    }

    group.finish();
}

fn bench_kd_tree_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("KdTree Nearest");

    let mut tree = KdTree::new();
    for (key, x, y) in random_points(10000) {
        tree.insert(key, x, y).unwrap();
    }

    group.bench_function("nearest_10k", |b| {
        b.iter(|| black_box(tree.nearest(1024.0, 1024.0)));
    });

    group.bench_function("k_nearest_10k", |b| {
        b.iter(|| black_box(tree.k_nearest(1024.0, 1024.0, 16)));
    });

    group.finish();
}

fn bench_kd_tree_remove(c: &mut Criterion) {
    let points = random_points(1000);

    c.bench_function("KdTree Remove 1k", |b| {
        b.iter_with_setup(
            || {
                let mut tree = KdTree::new();
                for &(key, x, y) in &points {
                    tree.insert(key, x, y).unwrap();
                }
                tree
            },
            |mut tree| {
                for &(key, _, _) in &points {
                    tree.remove(&key).unwrap();
                }
                black_box(tree.is_empty())
            },
        );
    });
}

criterion_group!(benches, bench_kd_tree_insert, bench_kd_tree_nearest, bench_kd_tree_remove);
criterion_main!(benches);
