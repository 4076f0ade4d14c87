//! Runs a flock without a window and prints a summary every few ticks.
//!
//! Set `RUST_LOG=debug` to see per-tick tree statistics.
use std::time::Instant;

use log::info;
use rs_flocking::flocking::Flock;
use rs_flocking::utils::{FlockConfig, FlockError, NeighborMode};

const TICKS: usize = 300;
const REPORT_EVERY: usize = 50;

fn main() -> Result<(), FlockError> {
    env_logger::init();

    let mode = match std::env::args().nth(1).as_deref() {
        Some("barnes-hut") => NeighborMode::BarnesHut,
        Some("all-pairs") => NeighborMode::AllPairs,
        _ => NeighborMode::Exact,
    };
    let config = FlockConfig::default().with_neighbor_mode(mode);
    let mut flock = Flock::new(config)?;

    let started = Instant::now();
    for tick in 1..=TICKS {
        flock.update();
        if tick % REPORT_EVERY == 0 {
            let stats = flock.tree().stats();
            println!(
                "tick {:>4}: centroid ({:>7.2}, {:>7.2}) mean velocity ({:>5.2}, {:>5.2}) | {} nodes, depth {}",
                tick,
                flock.centroid().x,
                flock.centroid().y,
                flock.mean_velocity().x,
                flock.mean_velocity().y,
                stats.nodes,
                stats.depth
            );
        }
    }

    let elapsed = started.elapsed();
    info!(
        "{} ticks of {} boids on {} workers in {:.2?} ({:.2?} per tick)",
        TICKS,
        flock.boids().len(),
        flock.worker_count(),
        elapsed,
        elapsed / TICKS as u32
    );
    Ok(())
}
