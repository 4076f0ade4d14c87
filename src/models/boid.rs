use glam::Vec2;

use crate::utils::{
    FlockConfig, ALIGNMENT_SOFTENING, BOUND_CORRECTION, COHESION_DIVISOR,
    REPULSION_DISTANCE_RANGE, REPULSION_STRENGTH, SEPARATION_FRACTION,
};

/// Index of an agent in the flock's agent table.
pub type BoidId = usize;

/// A single flocking agent.
///
/// The identity is fixed at creation. Position and velocity are only written by
/// the flock's update phases.
///
/// # Examples
///
/// ```
/// use glam::Vec2;
/// use rs_flocking::models::Boid;
///
/// let boid = Boid::new(3, Vec2::new(10.0, 20.0), Vec2::new(1.0, 0.0), 7.5, 0.25);
/// assert_eq!(boid.id(), 3);
/// assert_eq!(boid.position(), Vec2::new(10.0, 20.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    id: BoidId,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    scale: f32,
    sim_scale: f32,
}

impl Boid {
    pub fn new(id: BoidId, position: Vec2, velocity: Vec2, scale: f32, sim_scale: f32) -> Self {
        Self { id, position, velocity, scale, sim_scale }
    }

    pub fn id(&self) -> BoidId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Visual size used by renderers.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Factor applied to the summed steering terms in [`Boid::steer`].
    pub fn sim_scale(&self) -> f32 {
        self.sim_scale
    }

    pub(crate) fn with_id(mut self, id: BoidId) -> Self {
        self.id = id;
        self
    }

    /// Unit push back towards `[0, bounds]` on every axis the agent has left.
    ///
    /// # Examples
    ///
    /// ```
    /// use glam::Vec2;
    /// use rs_flocking::models::Boid;
    ///
    /// let boid = Boid::new(0, Vec2::new(-5.0, 900.0), Vec2::ZERO, 1.0, 1.0);
    /// assert_eq!(boid.bound_correction(Vec2::new(1280.0, 720.0)), Vec2::new(1.0, -1.0));
    /// ```
    pub fn bound_correction(&self, bounds: Vec2) -> Vec2 {
        let axis = |value: f32, bound: f32| {
            if value < 0.0 {
                BOUND_CORRECTION
            } else if value > bound {
                -BOUND_CORRECTION
            } else {
                0.0
            }
        };
        Vec2::new(axis(self.position.x, bounds.x), axis(self.position.y, bounds.y))
    }

    /// Applies the flocking rules to the velocity and clamps the speed.
    ///
    /// The summed rule output is scaled by the agent's own `sim_scale`; `config`
    /// supplies the bounds and the speed limit.
    ///
    /// Alignment and cohesion are skipped when no neighbours were found, so an
    /// isolated agent is only steered by the boundary correction.
    pub fn steer(&mut self, sums: &NeighborSums, config: &FlockConfig) {
        let (alignment, cohesion) = match sums.count {
            0 => (Vec2::ZERO, Vec2::ZERO),
            count => {
                let count = count as f32;
                let alignment = sums.velocity_sum / (count * ALIGNMENT_SOFTENING);
                let cohesion = (sums.position_sum / count - self.position) / COHESION_DIVISOR;
                (alignment, cohesion)
            }
        };

        let correction = self.bound_correction(config.bounds);
        self.velocity += (alignment + cohesion + sums.avoidance + correction) * self.sim_scale;
        self.velocity = clamp_speed(self.velocity, config.speed_limit);
    }

    /// Explicit Euler step with a unit time step.
    pub fn integrate(&mut self) {
        self.position += self.velocity;
    }
}

/// Rescales `velocity` to exactly `limit` when it is faster, keeping its direction.
pub fn clamp_speed(velocity: Vec2, limit: f32) -> Vec2 {
    if velocity.length_squared() > limit * limit {
        velocity.normalize_or_zero() * limit
    } else {
        velocity
    }
}

/// Running sums of one agent's neighbourhood.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeighborSums {
    pub count: usize,
    /// Summed neighbour velocities (alignment).
    pub velocity_sum: Vec2,
    /// Summed neighbour positions (cohesion).
    pub position_sum: Vec2,
    /// Accumulated inverse-distance repulsion (separation).
    pub avoidance: Vec2,
}

impl NeighborSums {
    /// Folds `other` into the sums when it lies within `local_radius` of `me`.
    ///
    /// Returns whether `other` counted as a neighbour.
    pub fn accumulate(&mut self, me: &Boid, other: &Boid, local_radius: f32) -> bool {
        let offset = other.position - me.position;
        let distance = offset.length();
        if distance >= local_radius {
            return false;
        }

        self.count += 1;
        self.velocity_sum += other.velocity;
        self.position_sum += other.position;

        if distance < local_radius * SEPARATION_FRACTION {
            let (lo, hi) = REPULSION_DISTANCE_RANGE;
            self.avoidance -= offset.normalize_or_zero() * (REPULSION_STRENGTH / distance.clamp(lo, hi));
        }
        true
    }
}
