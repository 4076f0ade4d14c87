use glam::Vec2;

use crate::utils::{FlockConfig, NeighborMode};

/// Fraction of the local radius inside which neighbours repel.
pub const SEPARATION_FRACTION: f32 = 0.4;
/// Numerator of the inverse-distance repulsion weight.
pub const REPULSION_STRENGTH: f32 = 10.0;
/// Distances are clamped to this range before weighting the repulsion.
pub const REPULSION_DISTANCE_RANGE: (f32, f32) = (0.001, 100.0);
/// Divisor applied to the mean neighbour velocity to soften alignment.
pub const ALIGNMENT_SOFTENING: f32 = 8.0;
/// Divisor applied to the offset towards the neighbour centroid.
pub const COHESION_DIVISOR: f32 = 100.0;
/// Velocity push applied per axis while an agent is outside the bounds.
pub const BOUND_CORRECTION: f32 = 1.0;
/// Range of each initial velocity component.
pub const INITIAL_VELOCITY_RANGE: f32 = 5.0;

const SIM_SCALE: f32 = 0.25;

pub const DEFAULT_FLOCK_CONFIG: FlockConfig = FlockConfig {
    bounds: Vec2::new(1280.0, 720.0),
    capacity: 5000,
    local_radius: 100.0 * SIM_SCALE,
    speed_limit: 7.0 * SIM_SCALE,
    sim_scale: SIM_SCALE,
    visual_scale: 100.0 / 13.0,
    theta: 0.20,
    pool_block_size: 512,
    worker_count: 0,
    max_subdivisions: 48,
    neighbor_mode: NeighborMode::Exact,
    seed: None,
};
