//! Batch partitioning and parallel dispatch.
//!
//! A call with `N` inputs and `W` resolved workers is split into consecutive
//! chunks and every chunk is handed to the same worker function:
//!
//! | Workers | Batch size       | Chunks                                            |
//! |---------|------------------|---------------------------------------------------|
//! | 1       | unset            | one call on the whole input, in the caller thread |
//! | 1       | `b`              | `ceil(N / b)` calls, in the caller thread         |
//! | `W > 1` | unset            | chunks of `max(N / W, 1)`, last one may be short  |
//! | `W > 1` | `b`              | chunks of `b`, last one may be short              |
//!
//! Parallel chunks run on a dedicated rayon pool sized to `W`; results come
//! back in chunk order regardless of completion order, and the call fails
//! with the error of the lowest-numbered failing chunk.
//!
//! ```
//! use molfp::parallel::Partitioning;
//!
//! let p = Partitioning::new(2);
//! assert_eq!(p.chunks(5), vec![0..2, 2..4, 4..5]);
//! let sums = p.dispatch(&[1, 2, 3, 4, 5], |xs| Ok(xs.iter().sum::<i32>())).unwrap();
//! assert_eq!(sums, vec![3, 7, 5]);
//! ```

use std::num::NonZeroUsize;
use std::ops::Range;

use log::{debug, trace};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::{Error, Result};

/// Number of CPUs available to this process, at least 1.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Resolves a requested worker count against `available` CPUs.
///
/// * `None` means one worker.
/// * A positive value is capped at `available`.
/// * A negative value counts back from `available`: `-1` is all CPUs, `-2`
///   all but one, never fewer than one.
///
/// # Errors
///
/// `Some(0)` is rejected with [`Error::Configuration`].
///
/// ```
/// use molfp::parallel::resolve_n_jobs;
///
/// assert_eq!(resolve_n_jobs(None, 8).unwrap(), 1);
/// assert_eq!(resolve_n_jobs(Some(4), 8).unwrap(), 4);
/// assert_eq!(resolve_n_jobs(Some(64), 8).unwrap(), 8);
/// assert_eq!(resolve_n_jobs(Some(-1), 8).unwrap(), 8);
/// assert_eq!(resolve_n_jobs(Some(-2), 8).unwrap(), 7);
/// assert_eq!(resolve_n_jobs(Some(-100), 8).unwrap(), 1);
/// assert!(resolve_n_jobs(Some(0), 8).is_err());
/// ```
pub fn resolve_n_jobs(requested: Option<isize>, available: usize) -> Result<usize> {
    let available = available.max(1);
    match requested {
        None => Ok(1),
        Some(0) => Err(Error::configuration(
            "n_jobs must be a nonzero integer or unset",
        )),
        Some(n) if n > 0 => Ok(n.unsigned_abs().min(available)),
        Some(n) => {
            let back = n.unsigned_abs() - 1;
            Ok(available.saturating_sub(back).max(1))
        }
    }
}

/// [`resolve_n_jobs`] against this machine's CPU count.
pub fn effective_n_jobs(requested: Option<isize>) -> Result<usize> {
    resolve_n_jobs(requested, available_parallelism())
}

/// How one call is split into chunks and how many workers run them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioning {
    n_jobs: usize,
    batch_size: Option<usize>,
}

impl Partitioning {
    /// Partitioning for `n_jobs` resolved workers (at least one).
    pub fn new(n_jobs: usize) -> Self {
        Self {
            n_jobs: n_jobs.max(1),
            batch_size: None,
        }
    }

    /// Fixes the chunk size instead of deriving it from the worker count.
    ///
    /// # Errors
    ///
    /// A batch size of zero is rejected with [`Error::Configuration`].
    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Result<Self> {
        if batch_size == Some(0) {
            return Err(Error::configuration("batch_size must be at least 1"));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Resolved worker count.
    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    /// Chunk size used for `n` inputs.
    pub fn batch_size(&self, n: usize) -> usize {
        self.batch_size.unwrap_or((n / self.n_jobs).max(1))
    }

    /// Input ranges of the chunks for `n` inputs, in order.
    ///
    /// A single worker without a fixed batch size gets one range covering the
    /// whole input, even when it is empty. Otherwise an empty input yields no
    /// chunks.
    pub fn chunks(&self, n: usize) -> Vec<Range<usize>> {
        if self.n_jobs == 1 && self.batch_size.is_none() {
            return vec![0..n];
        }
        let size = self.batch_size(n);
        (0..n)
            .step_by(size)
            .map(|start| start..(start + size).min(n))
            .collect()
    }

    /// Runs `work` over every chunk of `items` and returns the chunk results
    /// in chunk order.
    ///
    /// # Errors
    ///
    /// Any failing chunk fails the call. The error reported is that of the
    /// first failing chunk in chunk order, whatever order the chunks finish
    /// in, wrapped in [`Error::Chunk`] with the chunk's position and input
    /// range.
    /// [`Error::WorkerPool`] is returned if the thread pool cannot start.
    pub fn dispatch<T, R, F>(&self, items: &[T], work: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&[T]) -> Result<R> + Sync,
    {
        let ranges = self.chunks(items.len());
        let run = |(chunk, range): (usize, &Range<usize>)| {
            trace!("chunk {chunk}: inputs {}..{}", range.start, range.end);
            work(&items[range.clone()]).map_err(|source| Error::Chunk {
                chunk,
                start: range.start,
                end: range.end,
                source: Box::new(source),
            })
        };

        if self.n_jobs == 1 {
            debug!(
                "running {} input(s) serially in {} chunk(s)",
                items.len(),
                ranges.len()
            );
            return ranges.iter().enumerate().map(run).collect();
        }

        debug!(
            "dispatching {} input(s) as {} chunk(s) of up to {} across {} workers",
            items.len(),
            ranges.len(),
            self.batch_size(items.len()),
            self.n_jobs
        );
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.n_jobs)
            .thread_name(|i| format!("molfp-worker-{i}"))
            .build()?;
        // all chunks run to completion; the lowest-numbered failure wins
        let results: Vec<Result<R>> =
            pool.install(|| ranges.par_iter().enumerate().map(run).collect());
        results.into_iter().collect()
    }
}
