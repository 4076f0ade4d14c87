pub mod utils;
pub mod models;
pub mod spatial;
pub mod parallel;
pub mod flocking;
