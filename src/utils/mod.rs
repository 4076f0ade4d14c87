pub mod errors;
mod constants;
mod flock_config;

pub use errors::FlockError;
pub use constants::*;
pub use flock_config::*;
