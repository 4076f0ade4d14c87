//! Region quadtree over agent positions, rebuilt every tick.
//!
//! Nodes live in a flat arena and refer to each other by index. Every node
//! carries a `next` index pointing at the node a depth-first traversal visits
//! after its subtree, which lets [`Quadtree::aggregate`] walk the tree without
//! recursion or an explicit stack.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use rs_flocking::models::Boid;
//! use rs_flocking::spatial::{InsertOutcome, Quadtree};
//!
//! let boids = [
//!     Boid::new(0, Vec2::new(0.0, 0.0), Vec2::ZERO, 1.0, 1.0),
//!     Boid::new(1, Vec2::new(10.0, 10.0), Vec2::ZERO, 1.0, 1.0),
//! ];
//!
//! let mut tree = Quadtree::new(0.2, 64, 48);
//! tree.initialize(boids.iter().map(|b| b.position()));
//! for boid in &boids {
//!     assert_eq!(tree.insert(boid), InsertOutcome::Inserted);
//! }
//!
//! assert_eq!(tree.query(Vec2::new(10.0, 10.0), 1.0), vec![1]);
//! ```
use glam::Vec2;
use log::{debug, trace, warn};

use crate::models::{Boid, BoidId, NeighborSums};
use crate::spatial::node_pool::{child_center, quadrant_of};
use crate::spatial::{NodePool, Occupant, PooledNode, QuadNode};
use crate::utils::FlockConfig;

const ROOT: usize = 0;

/// Result of inserting one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another agent already sits at exactly this position; the agent is left out.
    Coincident,
    /// The two agents are too close to separate within the subdivision limit.
    TooDeep,
    /// `initialize` has not been called since the last `clear`.
    Uninitialized,
}

/// Shape summary, mostly for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub occupied: usize,
    pub depth: usize,
}

pub struct Quadtree {
    nodes: Vec<PooledNode>,
    parents: Vec<u32>,
    pool: NodePool,
    theta: f32,
    theta_sq: f32,
    max_subdivisions: u32,
}

impl Quadtree {
    /// Creates an empty tree.
    ///
    /// # Arguments
    ///
    /// * `theta` - Barnes-Hut acceptance parameter used by [`Quadtree::aggregate`]
    /// * `block_size` - Number of nodes the backing pool allocates at a time
    /// * `max_subdivisions` - Levels a single insertion may add before it gives up
    pub fn new(theta: f32, block_size: usize, max_subdivisions: u32) -> Self {
        Self {
            nodes: Vec::new(),
            parents: Vec::new(),
            pool: NodePool::new(block_size),
            theta,
            theta_sq: theta * theta,
            max_subdivisions,
        }
    }

    pub fn from_config(config: &FlockConfig) -> Self {
        Self::new(config.theta, config.pool_block_size, config.max_subdivisions)
    }

    /// Returns every node to the pool. Safe to call on an empty tree.
    pub fn clear(&mut self) {
        for node in self.nodes.drain(..) {
            self.pool.release(node);
        }
        self.parents.clear();
    }

    /// Installs a root square covering every position.
    ///
    /// The root is centered on the bounding box of the positions and its side is
    /// the larger of the box's width and height, widened by as many ulps as it
    /// takes for rounding to leave every position inside. With no positions the
    /// root is a zero-sized square at the origin.
    pub fn initialize<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec2>,
    {
        if !self.nodes.is_empty() {
            self.clear();
        }

        let (min, max) = positions.into_iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), p| (min.min(p), max.max(p)),
        );

        let mut root = self.pool.acquire();
        if min.x <= max.x && min.y <= max.y {
            let extent = max - min;
            root.center = (min + max) * 0.5;
            root.size = covering_size(root.center, extent.x.max(extent.y), min, max);
        }
        self.nodes.push(root);
    }

    /// Inserts one agent, subdividing occupied leaves until it has a leaf of its own.
    pub fn insert(&mut self, boid: &Boid) -> InsertOutcome {
        if self.nodes.is_empty() {
            warn!("insert of boid {} into an uninitialized quadtree", boid.id());
            return InsertOutcome::Uninitialized;
        }

        let incoming = Occupant { id: boid.id(), position: boid.position() };

        let mut node_id = ROOT;
        while self.nodes[node_id].has_children() {
            let quadrant = self.nodes[node_id].find_quadrant(incoming.position);
            node_id = self.nodes[node_id].children as usize + quadrant;
        }

        let resident = match self.nodes[node_id].body {
            None => {
                self.nodes[node_id].body = Some(incoming);
                return InsertOutcome::Inserted;
            }
            Some(resident) => resident,
        };

        if resident.position == incoming.position {
            debug!("boid {} shares its position with boid {}; skipped", incoming.id, resident.id);
            return InsertOutcome::Coincident;
        }

        let leaf = &self.nodes[node_id];
        if !self.separates(leaf.center, leaf.size, resident.position, incoming.position) {
            debug!(
                "boid {} and boid {} cannot be separated within {} subdivisions; skipped",
                incoming.id, resident.id, self.max_subdivisions
            );
            return InsertOutcome::TooDeep;
        }

        self.nodes[node_id].body = None;
        loop {
            let first_child = self.subdivide(node_id);
            let q_resident = self.nodes[node_id].find_quadrant(resident.position);
            let q_incoming = self.nodes[node_id].find_quadrant(incoming.position);

            if q_resident == q_incoming {
                node_id = first_child + q_resident;
                continue;
            }

            self.nodes[first_child + q_resident].body = Some(resident);
            self.nodes[first_child + q_incoming].body = Some(incoming);
            return InsertOutcome::Inserted;
        }
    }

    /// Whether two distinct positions fall into different cells within the subdivision limit.
    fn separates(&self, mut center: Vec2, mut size: f32, a: Vec2, b: Vec2) -> bool {
        for _ in 0..self.max_subdivisions {
            let qa = quadrant_of(center, a);
            if qa != quadrant_of(center, b) {
                return true;
            }
            size *= 0.5;
            center = child_center(center, size, qa);
        }
        false
    }

    /// Splits `node_id` into four children and returns the index of the first.
    ///
    /// The first three children continue the skip chain at their next sibling;
    /// the last one continues wherever the parent's subtree would have.
    pub fn subdivide(&mut self, node_id: usize) -> usize {
        self.parents.push(node_id as u32);
        let first_child = self.nodes.len();

        let parent = &mut self.nodes[node_id];
        parent.children = first_child as u32;
        let (center, size, next) = (parent.center, parent.size * 0.5, parent.next);

        for quadrant in 0..4 {
            let mut child = self.pool.acquire();
            child.size = size;
            child.center = child_center(center, size, quadrant);
            child.next = if quadrant == 3 { next } else { (first_child + quadrant + 1) as u32 };
            self.nodes.push(child);
        }

        trace!("subdivided node {} into {}..{}", node_id, first_child, first_child + 4);
        first_child
    }

    /// Ids of every agent inside the square `center ± half_size`, in no particular order.
    pub fn query(&self, center: Vec2, half_size: f32) -> Vec<BoidId> {
        let mut found = Vec::new();
        self.query_into(center, half_size, &mut found);
        found
    }

    /// Like [`Quadtree::query`], appending to a caller-owned buffer.
    pub fn query_into(&self, center: Vec2, half_size: f32, found: &mut Vec<BoidId>) {
        if !self.nodes.is_empty() {
            self.query_node(ROOT, center, half_size, found);
        }
    }

    fn query_node(&self, node_id: usize, center: Vec2, half_size: f32, found: &mut Vec<BoidId>) {
        let node = &self.nodes[node_id];
        if !node.intersects(center, half_size) {
            return;
        }

        if let Some(body) = node.body {
            let offset = (body.position - center).abs();
            if offset.x <= half_size && offset.y <= half_size {
                found.push(body.id);
            }
        }

        if node.has_children() {
            let first = node.children as usize;
            for child in first..first + 4 {
                self.query_node(child, center, half_size, found);
            }
        }
    }

    /// Barnes-Hut style neighbourhood sums for `boid`.
    ///
    /// A node is taken as a whole when it is a leaf or when
    /// `size² < distance² · theta²`; its occupant (if any, and if not `boid`
    /// itself) is folded into the sums. Otherwise the walk descends into its
    /// children. `agents` must be the table the tree was built from.
    pub fn aggregate(&self, boid: &Boid, local_radius: f32, agents: &[Boid]) -> NeighborSums {
        let mut sums = NeighborSums::default();
        if self.nodes.is_empty() {
            return sums;
        }

        let mut node_id = ROOT;
        loop {
            let node = &self.nodes[node_id];
            let distance_sq = boid.position().distance_squared(node.center);

            if node.has_children() && node.size * node.size >= distance_sq * self.theta_sq {
                node_id = node.children as usize;
                continue;
            }

            if let Some(body) = node.body {
                if body.id != boid.id() {
                    if let Some(other) = agents.get(body.id) {
                        sums.accumulate(boid, other, local_radius);
                    }
                }
            }

            if node.next == 0 {
                break;
            }
            node_id = node.next as usize;
        }
        sums
    }

    /// Read-only view of the nodes, root first.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &QuadNode> + '_ {
        self.nodes.iter().map(|node| &**node)
    }

    pub fn node(&self, node_id: usize) -> Option<&QuadNode> {
        self.nodes.get(node_id).map(|node| &**node)
    }

    /// `(center, size)` of every node, for drawing the tree.
    pub fn squares(&self) -> impl Iterator<Item = (Vec2, f32)> + '_ {
        self.nodes().map(|node| (node.center, node.size))
    }

    /// Indices of every node that owns children, in the order they were split.
    pub fn parents(&self) -> &[u32] {
        &self.parents
    }

    /// Number of agents stored in each node's subtree.
    ///
    /// Parents are always split before their children, so walking the parent list
    /// backwards visits every child before its parent.
    pub fn occupancy(&self) -> Vec<u32> {
        let mut counts: Vec<u32> = self.nodes().map(|node| u32::from(node.body.is_some())).collect();
        for &parent in self.parents.iter().rev() {
            let first = self.nodes[parent as usize].children as usize;
            let total: u32 = counts[first..first + 4].iter().sum();
            counts[parent as usize] += total;
        }
        counts
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats { nodes: self.nodes.len(), ..TreeStats::default() };
        if self.nodes.is_empty() {
            return stats;
        }

        let mut depths = vec![0usize; self.nodes.len()];
        for &parent in &self.parents {
            let first = self.nodes[parent as usize].children as usize;
            let depth = depths[parent as usize] + 1;
            depths[first..first + 4].fill(depth);
        }

        for (node, depth) in self.nodes().zip(&depths) {
            if !node.has_children() {
                stats.leaves += 1;
            }
            if node.body.is_some() {
                stats.occupied += 1;
            }
            stats.depth = stats.depth.max(*depth);
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }
}

/// Smallest side, starting from `size`, for which `center ± size / 2` holds
/// both `min` and `max` after f32 rounding.
fn covering_size(center: Vec2, mut size: f32, min: Vec2, max: Vec2) -> f32 {
    let reach = (max - center).max(center - min);
    while size.is_finite() && (reach.x > size * 0.5 || reach.y > size * 0.5) {
        size = f32::from_bits(size.to_bits() + 1);
    }
    size
}

impl Drop for Quadtree {
    fn drop(&mut self) {
        self.clear();
    }
}
