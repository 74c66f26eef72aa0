//! Benchmarks for clustering and k selection

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use phyloreg_algorithms::clustering::{cluster, ClusterParams};
use phyloreg_algorithms::evaluation::ClusterEvaluator;
use phyloreg_core::DistanceMatrix;

fn create_matrix(size: usize) -> DistanceMatrix {
    let units = (0..size).map(|i| format!("cell{i:05}")).collect();

    // Blocks of 16 units are close to each other, with a varied background
    DistanceMatrix::from_fn(units, |i, j| {
        let base = if i / 16 == j / 16 { 0.1 } else { 0.8 };
        let variation = ((i * 7 + j * 13) % 100) as f64 / 1000.0;
        base + variation
    })
    .unwrap()
}

fn bench_cluster(c: &mut Criterion) {
    let mut group = c.benchmark_group("upgma");

    for size in [64, 128, 256, 512].iter() {
        let matrix = create_matrix(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| cluster(black_box(&matrix), &ClusterParams::default()).unwrap())
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_k");

    for size in [64, 128, 256].iter() {
        let matrix = create_matrix(*size);
        let dendrogram = cluster(&matrix, &ClusterParams::default()).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                ClusterEvaluator::new(black_box(&matrix))
                    .evaluate(&dendrogram, None)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cluster, bench_evaluate);
criterion_main!(benches);
