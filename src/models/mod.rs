mod boid;

pub use boid::*;

#[cfg(test)]
mod boid_tests;
