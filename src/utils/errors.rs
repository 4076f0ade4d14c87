use thiserror::Error;

/// Represents errors that can occur while setting up a flock.
///
/// Runtime conditions such as empty neighbourhoods, an empty tree or two agents
/// sharing a position are not errors; they are handled where they occur.
#[derive(Debug, Error)]
pub enum FlockError {
    /// A configuration value that cannot be used (e.g. a non-positive radius).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// More agents were supplied than the agent table can hold.
    #[error("agent table capacity exceeded: requested {requested}, capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    /// The worker threads could not be spawned.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
