use approx::assert_relative_eq;
use glam::Vec2;
use crate::models::{clamp_speed, Boid, NeighborSums};
use crate::utils::FlockConfig;

fn boid_at(id: usize, x: f32, y: f32, vx: f32, vy: f32) -> Boid {
    Boid::new(id, Vec2::new(x, y), Vec2::new(vx, vy), 1.0, 0.25)
}

#[test]
fn test_bound_correction_inside_is_zero() {
    let boid = boid_at(0, 10.0, 10.0, 0.0, 0.0);
    assert_eq!(boid.bound_correction(Vec2::new(100.0, 100.0)), Vec2::ZERO);
}

#[test]
fn test_bound_correction_pushes_inward() {
    let bounds = Vec2::new(100.0, 100.0);
    assert_eq!(boid_at(0, -1.0, -1.0, 0.0, 0.0).bound_correction(bounds), Vec2::new(1.0, 1.0));
    assert_eq!(boid_at(0, 101.0, 50.0, 0.0, 0.0).bound_correction(bounds), Vec2::new(-1.0, 0.0));
    // On the bound itself counts as inside.
    assert_eq!(boid_at(0, 100.0, 0.0, 0.0, 0.0).bound_correction(bounds), Vec2::ZERO);
}

#[test]
fn test_clamp_speed() {
    let fast = clamp_speed(Vec2::new(30.0, 40.0), 5.0);
    assert_relative_eq!(fast.length(), 5.0, epsilon = 1e-5);
    assert_relative_eq!(fast.x / fast.y, 0.75, epsilon = 1e-5);

    let slow = Vec2::new(1.0, 1.0);
    assert_eq!(clamp_speed(slow, 5.0), slow);
    assert_eq!(clamp_speed(Vec2::ZERO, 5.0), Vec2::ZERO);
}

#[test]
fn test_accumulate_ignores_far_neighbours() {
    let me = boid_at(0, 0.0, 0.0, 0.0, 0.0);
    let far = boid_at(1, 30.0, 0.0, 1.0, 0.0);
    let mut sums = NeighborSums::default();
    assert!(!sums.accumulate(&me, &far, 25.0));
    assert_eq!(sums, NeighborSums::default());
}

#[test]
fn test_accumulate_repels_close_neighbours() {
    let me = boid_at(0, 0.0, 0.0, 0.0, 0.0);
    let close = boid_at(1, 5.0, 0.0, 0.0, 2.0);
    let mut sums = NeighborSums::default();
    assert!(sums.accumulate(&me, &close, 25.0));

    assert_eq!(sums.count, 1);
    assert_eq!(sums.velocity_sum, Vec2::new(0.0, 2.0));
    assert_eq!(sums.position_sum, Vec2::new(5.0, 0.0));
    // 10 / 5 = 2, pointing away from the neighbour.
    assert_relative_eq!(sums.avoidance.x, -2.0, epsilon = 1e-6);
    assert_relative_eq!(sums.avoidance.y, 0.0, epsilon = 1e-6);
}

#[test]
fn test_accumulate_no_repulsion_outside_separation_band() {
    let me = boid_at(0, 0.0, 0.0, 0.0, 0.0);
    // 0.4 * 25 = 10, so 15 is a neighbour without repulsion.
    let mid = boid_at(1, 15.0, 0.0, 0.0, 0.0);
    let mut sums = NeighborSums::default();
    assert!(sums.accumulate(&me, &mid, 25.0));
    assert_eq!(sums.avoidance, Vec2::ZERO);
}

#[test]
fn test_steer_without_neighbours_uses_only_bound_correction() {
    let config = FlockConfig::default();
    let mut boid = boid_at(0, -10.0, 50.0, 0.5, 0.0);
    boid.steer(&NeighborSums::default(), &config);

    let expected = Vec2::new(0.5 + config.sim_scale, 0.0);
    assert_relative_eq!(boid.velocity().x, expected.x, epsilon = 1e-6);
    assert_relative_eq!(boid.velocity().y, expected.y, epsilon = 1e-6);
    assert!(boid.velocity().is_finite());
}

#[test]
fn test_steer_applies_alignment_and_cohesion() {
    let config = FlockConfig::default();
    let mut boid = boid_at(0, 100.0, 100.0, 0.0, 0.0);
    let sums = NeighborSums {
        count: 2,
        velocity_sum: Vec2::new(1.6, 0.0),
        position_sum: Vec2::new(220.0, 200.0),
        avoidance: Vec2::ZERO,
    };
    boid.steer(&sums, &config);

    // alignment = 1.6 / 16 = 0.1, cohesion = (110 - 100) / 100 = 0.1
    assert_relative_eq!(boid.velocity().x, 0.2 * config.sim_scale, epsilon = 1e-6);
    assert_relative_eq!(boid.velocity().y, 0.0, epsilon = 1e-6);
}

#[test]
fn test_steer_scales_by_own_sim_scale() {
    let config = FlockConfig::default();
    let mut boid = Boid::new(0, Vec2::new(-10.0, 50.0), Vec2::ZERO, 1.0, 0.5);
    boid.steer(&NeighborSums::default(), &config);

    assert_relative_eq!(boid.velocity().x, 0.5, epsilon = 1e-6);
    assert_ne!(boid.sim_scale(), config.sim_scale);
}

#[test]
fn test_steer_clamps_speed() {
    let config = FlockConfig::default();
    let mut boid = boid_at(0, 100.0, 100.0, 40.0, -30.0);
    boid.steer(&NeighborSums::default(), &config);
    assert!(boid.velocity().length() <= config.speed_limit * (1.0 + 1e-5));
}

#[test]
fn test_integrate() {
    let mut boid = boid_at(0, 1.0, 2.0, 0.5, -0.5);
    boid.integrate();
    assert_eq!(boid.position(), Vec2::new(1.5, 1.5));
    assert_eq!(boid.velocity(), Vec2::new(0.5, -0.5));
}
