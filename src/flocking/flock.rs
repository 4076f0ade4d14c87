//! The flock manager: owns the agent table and drives one tick at a time.
//!
//! A tick rebuilds the quadtree from the current positions, then runs two
//! parallel phases on the worker pool:
//!
//! 1. **Velocity**: every agent steers from its neighbourhood. Neighbours are
//!    read from a snapshot taken when the tree was built, so no worker ever sees
//!    another worker's half-finished velocities.
//! 2. **Position**: every agent moves by its new velocity.
//!
//! # Example
//!
//! ```
//! use rs_flocking::flocking::Flock;
//! use rs_flocking::utils::FlockConfig;
//!
//! let config = FlockConfig::new(Some(300), None, None, Some(2)).with_seed(7);
//! let mut flock = Flock::new(config).expect("Failed to create flock");
//!
//! flock.step(10);
//! assert_eq!(flock.tick(), 10);
//! for boid in flock.boids() {
//!     assert!(boid.velocity().length() <= config.speed_limit * 1.0001);
//! }
//! ```
use glam::Vec2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Boid, NeighborSums};
use crate::parallel::{PartitionedSlice, WorkerPool};
use crate::spatial::{InsertOutcome, Quadtree};
use crate::utils::{FlockConfig, FlockError, NeighborMode, INITIAL_VELOCITY_RANGE};

/// Which half of a tick the workers are running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Velocity,
    Position,
}

/// Everything a worker needs for one phase. Shared read-only between workers
/// except for `agents`, which each worker claims its own range of.
struct PhaseContext<'a> {
    phase: UpdatePhase,
    agents: PartitionedSlice<'a, Boid>,
    snapshot: &'a [Boid],
    tree: &'a Quadtree,
    config: &'a FlockConfig,
}

pub struct Flock {
    config: FlockConfig,
    boids: Vec<Boid>,
    snapshot: Vec<Boid>,
    tree: Quadtree,
    workers: WorkerPool,
    tick: u64,
}

impl Flock {
    /// Creates a flock of `config.capacity` agents with random positions inside
    /// the bounds and random velocities.
    pub fn new(config: FlockConfig) -> Result<Self, FlockError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let boids = (0..config.capacity)
            .map(|id| {
                let position = Vec2::new(
                    rng.random_range(0.0..=config.bounds.x),
                    rng.random_range(0.0..=config.bounds.y),
                );
                let velocity = Vec2::new(
                    rng.random_range(-INITIAL_VELOCITY_RANGE..=INITIAL_VELOCITY_RANGE),
                    rng.random_range(-INITIAL_VELOCITY_RANGE..=INITIAL_VELOCITY_RANGE),
                );
                Boid::new(id, position, velocity, config.visual_scale, config.sim_scale)
            })
            .collect();

        Self::with_table(config, boids)
    }

    /// Creates a flock from explicit agents. Identities are reassigned to match
    /// each agent's index in `boids`.
    pub fn from_boids(config: FlockConfig, boids: Vec<Boid>) -> Result<Self, FlockError> {
        config.validate()?;
        if boids.len() > config.capacity {
            return Err(FlockError::CapacityExceeded { requested: boids.len(), capacity: config.capacity });
        }

        let boids = boids.into_iter().enumerate().map(|(id, boid)| boid.with_id(id)).collect();
        Self::with_table(config, boids)
    }

    fn with_table(config: FlockConfig, boids: Vec<Boid>) -> Result<Self, FlockError> {
        let workers = WorkerPool::new(config.worker_count)?;
        info!(
            "flock of {} boids on {} workers ({:?} neighbours)",
            boids.len(),
            workers.worker_count(),
            config.neighbor_mode
        );

        Ok(Self {
            snapshot: Vec::with_capacity(boids.len()),
            tree: Quadtree::from_config(&config),
            config,
            boids,
            workers,
            tick: 0,
        })
    }

    /// Rebuilds the quadtree from the current positions.
    pub fn build_tree(&mut self) {
        self.snapshot.clone_from(&self.boids);

        self.tree.clear();
        self.tree.initialize(self.snapshot.iter().map(Boid::position));

        let mut skipped = 0usize;
        for boid in &self.snapshot {
            if self.tree.insert(boid) != InsertOutcome::Inserted {
                skipped += 1;
            }
        }

        if skipped > 0 {
            debug!("tick {}: {} boids left out of the quadtree", self.tick, skipped);
        }
    }

    /// Advances the simulation by one tick on the worker pool.
    pub fn update(&mut self) {
        self.build_tree();
        self.run_phase(UpdatePhase::Velocity);
        self.run_phase(UpdatePhase::Position);
        self.finish_tick();
    }

    /// Advances the simulation by one tick on the calling thread only.
    pub fn update_sequential(&mut self) {
        self.build_tree();
        for phase in [UpdatePhase::Velocity, UpdatePhase::Position] {
            let context = self.phase_context(phase, 1);
            flock_worker(0, &context);
        }
        self.finish_tick();
    }

    /// Runs `update` `ticks` times.
    pub fn step(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.update();
        }
    }

    fn run_phase(&mut self, phase: UpdatePhase) {
        let context = PhaseContext {
            phase,
            agents: PartitionedSlice::new(&mut self.boids, self.workers.worker_count()),
            snapshot: &self.snapshot,
            tree: &self.tree,
            config: &self.config,
        };
        self.workers.run_task(|worker| flock_worker(worker, &context));
    }

    fn phase_context(&mut self, phase: UpdatePhase, workers: usize) -> PhaseContext<'_> {
        PhaseContext {
            phase,
            agents: PartitionedSlice::new(&mut self.boids, workers),
            snapshot: &self.snapshot,
            tree: &self.tree,
            config: &self.config,
        }
    }

    fn finish_tick(&mut self) {
        self.tick += 1;
        if log::log_enabled!(log::Level::Debug) {
            let stats = self.tree.stats();
            debug!(
                "tick {}: {} nodes, {} occupied, depth {}, pool {}/{}",
                self.tick,
                stats.nodes,
                stats.occupied,
                stats.depth,
                self.tree.pool().loaned(),
                self.tree.pool().capacity()
            );
        }
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    /// The quadtree built at the start of the last tick, for drawing.
    pub fn tree(&self) -> &Quadtree {
        &self.tree
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn worker_count(&self) -> usize {
        self.workers.worker_count()
    }

    pub fn accumulate_position(&self) -> Vec2 {
        self.boids.iter().map(Boid::position).sum()
    }

    pub fn accumulate_velocity(&self) -> Vec2 {
        self.boids.iter().map(Boid::velocity).sum()
    }

    /// Mean position, or the origin for an empty flock.
    pub fn centroid(&self) -> Vec2 {
        match self.boids.len() {
            0 => Vec2::ZERO,
            n => self.accumulate_position() / n as f32,
        }
    }

    pub fn mean_velocity(&self) -> Vec2 {
        match self.boids.len() {
            0 => Vec2::ZERO,
            n => self.accumulate_velocity() / n as f32,
        }
    }
}

/// Body of every worker, for both phases.
fn flock_worker(worker: usize, context: &PhaseContext<'_>) {
    let Some(agents) = context.agents.claim(worker) else {
        return;
    };

    match context.phase {
        UpdatePhase::Velocity => {
            let mut candidates = Vec::new();
            for boid in agents.iter_mut() {
                let sums = neighbor_sums(boid, context, &mut candidates);
                boid.steer(&sums, context.config);
            }
        }
        UpdatePhase::Position => agents.iter_mut().for_each(Boid::integrate),
    }
}

/// Neighbourhood of `boid` in the snapshot, excluding `boid` itself.
fn neighbor_sums(boid: &Boid, context: &PhaseContext<'_>, candidates: &mut Vec<usize>) -> NeighborSums {
    let local_radius = context.config.local_radius;
    let snapshot = context.snapshot;
    let mut sums = NeighborSums::default();

    match context.config.neighbor_mode {
        NeighborMode::Exact => {
            candidates.clear();
            context.tree.query_into(boid.position(), local_radius, candidates);
            for other in candidates.iter().filter_map(|&id| snapshot.get(id)) {
                if other.id() != boid.id() {
                    sums.accumulate(boid, other, local_radius);
                }
            }
        }
        NeighborMode::BarnesHut => {
            sums = context.tree.aggregate(boid, local_radius, snapshot);
        }
        NeighborMode::AllPairs => {
            for other in snapshot.iter().filter(|other| other.id() != boid.id()) {
                sums.accumulate(boid, other, local_radius);
            }
        }
    }
    sums
}
