mod node_pool;
mod quadtree;

pub use node_pool::*;
pub use quadtree::*;
