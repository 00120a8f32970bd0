use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;

use spectral_cluster_tree::graph::operators::ShiftedNormalizedLaplacian;
use spectral_cluster_tree::graph::power_iteration::{power_iteration, RandomInitialVectors, SignTrailConvergence};
use spectral_cluster_tree::{run_clustering_with, ClusteringSettings, Graph, GraphBuilder, Traversal};

fn planted_partition(blocks: u32, block_size: u32, p_in: f64, p_out: f64) -> Graph {
    let mut rng = StdRng::seed_from_u64(42);
    let mut builder = GraphBuilder::new();
    let n = blocks * block_size;
    for u in 0..n {
        for v in u + 1..n {
            let p = if u / block_size == v / block_size { p_in } else { p_out };
            if rng.gen::<f64>() < p {
                builder.add_edge(u, v, rng.gen_range(0.5..2.0));
            }
        }
    }
    builder.build().unwrap()
}

fn bench_power_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("power_iteration");
    let graph = planted_partition(2, 1000, 0.02, 0.002);

    for (name, traversal) in [
        ("sequential_n2000", Traversal::sequential()),
        ("parallel_n2000", Traversal::default()),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut op = ShiftedNormalizedLaplacian::new(&graph, traversal.clone()).unwrap();
                let mut criterion = SignTrailConvergence::new(graph.order(), 20, 0.95);
                let initial = RandomInitialVectors::new(42).generate(graph.order());
                // Non-convergence is a valid outcome here
                let _ = power_iteration(&mut op, &mut criterion, black_box(initial), 540);
            })
        });
    }

    group.finish();
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");
    group.sample_size(10);
    let graph = planted_partition(8, 250, 0.05, 0.002);
    let settings = ClusteringSettings::default()
        .with_min_cluster_size(20)
        .with_min_affiliation(0.1);

    group.bench_function("planted_partition_n2000_k8", |b| {
        b.iter(|| {
            let tree = run_clustering_with(black_box(&graph), &settings, Traversal::default()).unwrap();
            black_box(tree.len());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_power_iteration, bench_clustering);
criterion_main!(benches);
