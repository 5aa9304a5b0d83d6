//! Worker pool backing every parallel pass
//!
//! Reductions split the population into at most `width` contiguous chunks;
//! each chunk writes only its own partial, and partials are summed in chunk
//! order. No atomics, and results depend only on the width, not on scheduling.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::SimError;

pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `worker_count` threads (0 = one per available core)
    pub fn new(worker_count: usize) -> Result<Self, SimError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("walker-{i}"));
        if worker_count > 0 {
            builder = builder.num_threads(worker_count);
        }
        let pool = builder.build()?;
        log::info!("Worker pool ready with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    /// Number of worker threads (and maximum number of reduction partials)
    pub fn width(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` with this pool as the rayon context
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("width", &self.width()).finish()
    }
}

/// Chunk length giving at most `width` chunks over `len` items
#[inline]
pub fn chunk_len(len: usize, width: usize) -> usize {
    len.div_ceil(width.max(1)).max(1)
}
