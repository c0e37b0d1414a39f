use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dragonfly::graph::sample_graph;
use dragonfly::parameters::Parameters;
use dragonfly::simulation::Simulation;
use dragonfly::strategy::{ExecutionStrategy, PartitionedParallel, SingleThreaded};

static POPULATION: usize = 1000;
static SEED: u64 = 123;
static EPOCHS: usize = 30;

pub fn criterion_benchmark(c: &mut Criterion) {
    let graph = sample_graph().unwrap();
    let parameters = Parameters {
        individual_count: POPULATION,
        total_epochs: EPOCHS,
        seed: SEED,
        ..Parameters::default()
    };
    let simulation =
        Simulation::new(&graph, parameters).expect("benchmark parameters are valid");

    let mut strategies: Vec<Box<dyn ExecutionStrategy>> = vec![Box::new(SingleThreaded)];
    for threads in [2, 4] {
        strategies.push(Box::new(
            PartitionedParallel::new(threads).expect("failed to build worker pool"),
        ));
    }

    let mut group = c.benchmark_group("epoch pipeline");
    group.sample_size(10);
    for strategy in &strategies {
        group.bench_with_input(
            BenchmarkId::new(strategy.name(), strategy.threads()),
            strategy,
            |bencher, strategy| {
                bencher.iter_with_large_drop(|| {
                    simulation
                        .run(black_box(strategy.as_ref()))
                        .expect("run failed")
                });
            },
        );
    }
    group.finish();
}

criterion_group!(pipeline_benches, criterion_benchmark);
criterion_main!(pipeline_benches);
