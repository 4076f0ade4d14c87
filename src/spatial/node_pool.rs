//! Block-allocated free list of quadtree nodes.
//!
//! The quadtree is rebuilt from scratch every tick. Rather than allocating a
//! fresh record for every node on every rebuild, nodes are borrowed from a
//! [`NodePool`] and handed back when the tree is cleared. The pool only ever
//! grows, one block at a time.
//!
//! # Example
//!
//! ```
//! use rs_flocking::spatial::NodePool;
//!
//! let mut pool = NodePool::new(4);
//! let node = pool.acquire();
//! assert_eq!(pool.loaned(), 1);
//!
//! pool.release(node);
//! assert_eq!(pool.loaned(), 0);
//! assert_eq!(pool.capacity(), 4);
//! ```
use std::ops::{Deref, DerefMut};

use glam::Vec2;
use log::{trace, warn};

use crate::models::BoidId;

/// Agent stored in a leaf: a non-owning identity plus its position at insertion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occupant {
    pub id: BoidId,
    pub position: Vec2,
}

/// One axis-aligned square region of the quadtree.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuadNode {
    /// Index of the first of four children; 0 marks a leaf.
    pub children: u32,
    /// Where a traversal continues once this subtree is done; 0 ends it.
    pub next: u32,
    pub center: Vec2,
    /// Side length.
    pub size: f32,
    pub body: Option<Occupant>,
}

impl QuadNode {
    pub fn has_children(&self) -> bool {
        self.children != 0
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    pub fn half_size(&self) -> f32 {
        self.size * 0.5
    }

    /// Two-bit quadrant code: bit 0 when `x` is right of center, bit 1 when `y` is above it.
    pub fn find_quadrant(&self, position: Vec2) -> usize {
        quadrant_of(self.center, position)
    }

    /// Inclusive square-vs-square overlap with the region `center ± half_size`.
    pub fn intersects(&self, center: Vec2, half_size: f32) -> bool {
        let own = self.half_size();
        !(center.x - half_size > self.center.x + own
            || center.x + half_size < self.center.x - own
            || center.y - half_size > self.center.y + own
            || center.y + half_size < self.center.y - own)
    }
}

pub(crate) fn quadrant_of(center: Vec2, position: Vec2) -> usize {
    (((position.y > center.y) as usize) << 1) | (position.x > center.x) as usize
}

/// Center of child `quadrant` of a square at `parent_center`, given the child's side length.
pub(crate) fn child_center(parent_center: Vec2, child_size: f32, quadrant: usize) -> Vec2 {
    let bit_x = (quadrant & 1) as f32;
    let bit_y = (quadrant >> 1) as f32;
    Vec2::new(
        parent_center.x + (bit_x - 0.5) * child_size,
        parent_center.y + (bit_y - 0.5) * child_size,
    )
}

/// Exclusive handle to a node borrowed from a [`NodePool`].
///
/// Not `Clone`: a handle either lives in a tree or goes back to its pool.
#[derive(Debug)]
pub struct PooledNode(Box<QuadNode>);

impl Deref for PooledNode {
    type Target = QuadNode;

    fn deref(&self) -> &QuadNode {
        &self.0
    }
}

impl DerefMut for PooledNode {
    fn deref_mut(&mut self) -> &mut QuadNode {
        &mut self.0
    }
}

#[derive(Debug)]
pub struct NodePool {
    free: Vec<PooledNode>,
    block_size: usize,
    capacity: usize,
    loaned: usize,
}

impl NodePool {
    /// Creates a pool and allocates its first block.
    ///
    /// A `block_size` of 0 is treated as 1.
    pub fn new(block_size: usize) -> Self {
        let mut pool = Self {
            free: Vec::new(),
            block_size: block_size.max(1),
            capacity: 0,
            loaned: 0,
        };
        pool.allocate_block();
        pool
    }

    /// Hands out a zeroed node, growing the pool by one block if none is free.
    pub fn acquire(&mut self) -> PooledNode {
        if self.free.is_empty() {
            self.allocate_block();
        }
        let mut node = match self.free.pop() {
            Some(node) => node,
            None => PooledNode(Box::default()),
        };
        *node = QuadNode::default();
        self.loaned += 1;
        node
    }

    /// Takes a node back. Its contents are reset on the next `acquire`.
    pub fn release(&mut self, node: PooledNode) {
        match self.loaned.checked_sub(1) {
            Some(loaned) => self.loaned = loaned,
            None => {
                warn!("node pool received a node it never loaned out; adopting it");
                self.capacity += 1;
            }
        }
        self.free.push(node);
    }

    /// Nodes currently handed out.
    pub fn loaned(&self) -> usize {
        self.loaned
    }

    /// Nodes ready to be handed out without allocating.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Every node this pool has ever allocated.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn allocate_block(&mut self) {
        self.free.reserve(self.block_size);
        self.free.extend((0..self.block_size).map(|_| PooledNode(Box::default())));
        self.capacity += self.block_size;
        trace!("node pool grew to {} nodes", self.capacity);
    }
}

impl Drop for NodePool {
    fn drop(&mut self) {
        if self.loaned > 0 {
            warn!("node pool dropped with {} nodes still loaned out", self.loaned);
        }
    }
}
