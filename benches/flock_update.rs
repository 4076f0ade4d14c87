use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use log::debug;
use rs_flocking::flocking::Flock;
use rs_flocking::utils::{FlockConfig, NeighborMode};

const AGENT_COUNTS: [usize; 3] = [1_000, 5_000, 20_000];

fn flock_of(capacity: usize, mode: NeighborMode) -> Flock {
    let config = FlockConfig::new(Some(capacity), None, None, None)
        .with_neighbor_mode(mode)
        .with_seed(1);
    Flock::new(config).expect("Failed to create flock")
}

pub fn bench_tree_build(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut group = c.benchmark_group("tree_build");
    group.measurement_time(std::time::Duration::from_secs(5));
    group.sample_size(50);

    for &count in &AGENT_COUNTS {
        let mut flock = flock_of(count, NeighborMode::Exact);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| flock.build_tree())
        });
        debug!("{} agents: {:?}", count, flock.tree().stats());
    }
}

pub fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.measurement_time(std::time::Duration::from_secs(5));
    group.sample_size(30);

    for mode in [NeighborMode::Exact, NeighborMode::BarnesHut] {
        for &count in &AGENT_COUNTS {
            let mut flock = flock_of(count, mode);
            group.bench_with_input(BenchmarkId::new(format!("{:?}", mode), count), &count, |b, _| {
                b.iter(|| flock.update())
            });
        }
    }

    // The brute force baseline is only run at the smallest size.
    let mut flock = flock_of(AGENT_COUNTS[0], NeighborMode::AllPairs);
    group.bench_function("AllPairs/1000", |b| b.iter(|| flock.update()));

    let mut flock = flock_of(AGENT_COUNTS[1], NeighborMode::Exact);
    group.bench_function("Exact/sequential/5000", |b| b.iter(|| flock.update_sequential()));
}

criterion_group!(benches, bench_tree_build, bench_tick);
criterion_main!(benches);
