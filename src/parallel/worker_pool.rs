//! Fixed set of long-lived worker threads that run one callable per phase.
//!
//! Callers split their data into contiguous stride ranges, one per worker,
//! so every worker writes only to its own range and no locking is needed.
//!
//! # Example
//!
//! ```
//! use rs_flocking::parallel::{PartitionedSlice, WorkerPool};
//!
//! let pool = WorkerPool::new(3).expect("Failed to build worker pool");
//! let mut values = vec![0usize; 10];
//!
//! let partition = PartitionedSlice::new(&mut values, pool.worker_count());
//! pool.run_task(|worker| {
//!     if let Some(range) = partition.claim(worker) {
//!         range.iter_mut().for_each(|v| *v = worker + 1);
//!     }
//! });
//!
//! assert_eq!(values, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3]);
//! ```
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::utils::FlockError;

pub struct WorkerPool {
    pool: ThreadPool,
    worker_count: usize,
}

impl WorkerPool {
    /// Spawns `worker_count` persistent workers, or one per hardware thread when 0.
    pub fn new(worker_count: usize) -> Result<Self, FlockError> {
        let worker_count = match worker_count {
            0 => rayon::current_num_threads().max(1),
            n => n,
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|index| format!("flock-worker-{}", index))
            .build()?;

        debug!("worker pool started with {} threads", worker_count);
        Ok(Self { pool, worker_count })
    }

    /// Runs `work(worker_index)` once on every worker and waits for all of them.
    ///
    /// Returning is the phase barrier: no worker is still inside `work` once this
    /// call returns. A panic in any worker is propagated to the caller.
    pub fn run_task<F>(&self, work: F)
    where
        F: Fn(usize) + Sync,
    {
        self.pool.broadcast(|context| work(context.index()));
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

/// Index range owned by `worker` when `len` items are split across `workers`.
///
/// The stride is `ceil(len / workers)`; the last worker always ends at `len`, so
/// the ranges cover `0..len` exactly once. Trailing workers may get empty ranges.
///
/// # Examples
///
/// ```
/// use rs_flocking::parallel::stride_range;
///
/// assert_eq!(stride_range(0, 3, 10), 0..4);
/// assert_eq!(stride_range(1, 3, 10), 4..8);
/// assert_eq!(stride_range(2, 3, 10), 8..10);
/// ```
pub fn stride_range(worker: usize, workers: usize, len: usize) -> Range<usize> {
    let workers = workers.max(1);
    let stride = len.div_ceil(workers);
    let start = (worker * stride).min(len);
    let end = if worker + 1 >= workers { len } else { ((worker + 1) * stride).min(len) };
    start..end.max(start)
}

/// A mutable slice split into per-worker stride ranges.
///
/// Each range can be claimed once, from any thread. Because the ranges never
/// overlap and a claim flag guards each one, handing out `&mut` borrows through
/// a shared reference is sound.
pub struct PartitionedSlice<'a, T> {
    data: *mut T,
    len: usize,
    claimed: Box<[AtomicBool]>,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: the only access to the data is through `claim`, which hands out each
// disjoint range at most once.
unsafe impl<T: Send> Send for PartitionedSlice<'_, T> {}
unsafe impl<T: Send> Sync for PartitionedSlice<'_, T> {}

impl<'a, T> PartitionedSlice<'a, T> {
    pub fn new(slice: &'a mut [T], workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            data: slice.as_mut_ptr(),
            len: slice.len(),
            claimed: (0..workers).map(|_| AtomicBool::new(false)).collect(),
            _marker: PhantomData,
        }
    }

    pub fn workers(&self) -> usize {
        self.claimed.len()
    }

    /// Hands `worker` its range, or `None` if it was already claimed or the
    /// worker index is out of range.
    #[allow(clippy::mut_from_ref)]
    pub fn claim(&self, worker: usize) -> Option<&mut [T]> {
        let flag = self.claimed.get(worker)?;
        if flag.swap(true, Ordering::AcqRel) {
            return None;
        }
        let range = stride_range(worker, self.workers(), self.len);
        // SAFETY: `range` lies within the original slice, is disjoint from every
        // other worker's range, and the flag above ensures it is handed out once.
        Some(unsafe { std::slice::from_raw_parts_mut(self.data.add(range.start), range.len()) })
    }
}
