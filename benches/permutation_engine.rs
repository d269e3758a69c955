//! Permutation engine benchmark
//!
//! Measures end-to-end `analyze` throughput on synthetic datasets of points on
//! a line, split into equal clusters with alternating conditions.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench permutation_engine
//! ```

use clusterhet::{CrossStatistic, DistanceMatrix, HeterogeneityConfig, HeterogeneityEngine};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// `n` observations, `clusters` clusters, alternating conditions
fn synthetic(n: usize, clusters: usize) -> (Vec<usize>, Vec<bool>, DistanceMatrix) {
    let points: Vec<f32> = (0..n).map(|i| ((i * 7919) % 1000) as f32 / 10.0).collect();
    let data = points
        .iter()
        .flat_map(|a| points.iter().map(move |b| (a - b).abs()))
        .collect();
    let matrix = DistanceMatrix::from_flat(n, data).unwrap();
    let labels = (0..n).map(|i| i % clusters).collect();
    let conditions = (0..n).map(|i| (i / clusters) % 2 == 0).collect();
    (labels, conditions, matrix)
}

fn engine(statistic: CrossStatistic, parallel: bool) -> HeterogeneityEngine {
    HeterogeneityEngine::new(HeterogeneityConfig {
        statistic,
        parallel,
        ..HeterogeneityConfig::default().with_seed(42)
    })
}

/// Benchmark: cluster size scaling with the mean statistic
fn bench_cluster_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_cluster_size");
    group.sample_size(20);

    for n in [100, 400, 1600] {
        let (labels, conditions, matrix) = synthetic(n, 4);
        let engine = engine(CrossStatistic::Mean, true);

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                engine
                    .analyze(black_box(&labels), black_box(&conditions), black_box(&matrix))
                    .unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark: parallel vs sequential cluster processing
fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_parallelism");
    group.sample_size(20);
    let (labels, conditions, matrix) = synthetic(1200, 12);

    for (name, parallel) in [("sequential", false), ("parallel", true)] {
        let engine = engine(CrossStatistic::Mean, parallel);
        group.bench_function(name, |b| {
            b.iter(|| engine.analyze(&labels, &conditions, &matrix).unwrap());
        });
    }

    group.finish();
}

/// Benchmark: mean (row-sum shortcut) vs median (full cross block) statistic
fn bench_statistic(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_statistic");
    group.sample_size(10);
    let (labels, conditions, matrix) = synthetic(400, 4);

    for statistic in [CrossStatistic::Mean, CrossStatistic::Median] {
        let engine = engine(statistic, true);
        group.bench_function(statistic.to_string(), |b| {
            b.iter(|| engine.analyze(&labels, &conditions, &matrix).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cluster_size, bench_parallel, bench_statistic);
criterion_main!(benches);
