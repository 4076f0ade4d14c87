// src/utils/flock_config.rs
use glam::Vec2;
use crate::utils::{
    DEFAULT_FLOCK_CONFIG,
    errors::FlockError
};

/// How the velocity phase gathers each agent's neighbourhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborMode {
    /// Square-region query on the quadtree, filtered by distance. The square's half
    /// side is the full `local_radius`, so it circumscribes the interaction circle.
    Exact,
    /// Theta-approximated walk along the quadtree's skip chain.
    BarnesHut,
    /// Compare against every agent. Only useful as a baseline.
    AllPairs,
}

/// Constants consumed by the flock. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlockConfig {
    /// Upper corner of the simulation area; the lower corner is the origin.
    pub bounds: Vec2,
    /// Number of agents in the table.
    pub capacity: usize,
    /// Neighbour interaction radius.
    pub local_radius: f32,
    /// Maximum speed after the velocity phase.
    pub speed_limit: f32,
    /// Converts rule outputs into simulation units.
    pub sim_scale: f32,
    /// Visual size of an agent, carried for renderers.
    pub visual_scale: f32,
    /// Barnes-Hut acceptance parameter.
    pub theta: f32,
    /// Number of tree nodes the node pool allocates at a time.
    pub pool_block_size: usize,
    /// Worker threads; 0 picks the hardware concurrency.
    pub worker_count: usize,
    /// Subdivision levels an insertion may create before it is skipped.
    pub max_subdivisions: u32,
    pub neighbor_mode: NeighborMode,
    /// Seed for the initial agent table; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for FlockConfig {
    fn default() -> Self {
        DEFAULT_FLOCK_CONFIG
    }
}

impl FlockConfig {
    /// Builds a configuration, falling back to the defaults for every `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_flocking::utils::FlockConfig;
    ///
    /// let config = FlockConfig::new(Some(200), None, None, Some(1));
    /// assert_eq!(config.capacity, 200);
    /// assert_eq!(config.worker_count, 1);
    /// assert_eq!(config.theta, FlockConfig::default().theta);
    /// ```
    pub fn new(
        capacity: Option<usize>,
        local_radius: Option<f32>,
        theta: Option<f32>,
        worker_count: Option<usize>,
    ) -> Self {
        let default = DEFAULT_FLOCK_CONFIG;
        Self {
            capacity: capacity.unwrap_or(default.capacity),
            local_radius: local_radius.unwrap_or(default.local_radius),
            theta: theta.unwrap_or(default.theta),
            worker_count: worker_count.unwrap_or(default.worker_count),
            ..default
        }
    }

    pub fn with_neighbor_mode(mut self, neighbor_mode: NeighborMode) -> Self {
        self.neighbor_mode = neighbor_mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_bounds(mut self, bounds: Vec2) -> Self {
        self.bounds = bounds;
        self
    }

    /// Checks that every value can be used to build a flock.
    pub fn validate(&self) -> Result<(), FlockError> {
        if !(self.bounds.x > 0.0 && self.bounds.y > 0.0) { return Err(FlockError::InvalidConfig("bounds must be positive")); }
        if !(self.local_radius > 0.0) { return Err(FlockError::InvalidConfig("local_radius must be positive")); }
        if !(self.speed_limit > 0.0) { return Err(FlockError::InvalidConfig("speed_limit must be positive")); }
        if !self.sim_scale.is_finite() { return Err(FlockError::InvalidConfig("sim_scale must be finite")); }
        if !(self.theta >= 0.0) { return Err(FlockError::InvalidConfig("theta must be non-negative")); }
        if self.pool_block_size == 0 { return Err(FlockError::InvalidConfig("pool_block_size must be non-zero")); }
        if self.max_subdivisions == 0 { return Err(FlockError::InvalidConfig("max_subdivisions must be non-zero")); }
        Ok(())
    }
}
