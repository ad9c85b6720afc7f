//! Row-partitioned execution over a raster's locations

use crate::cancel::CancelToken;
use sarcomp_core::{Error, Location, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How per-location work is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded, row by row
    Sequential,
    /// Rows spread over the global Rayon pool
    #[default]
    Parallel,
    /// Rows spread over a dedicated pool with this many threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Evaluate `f` at every location of a `rows` x `cols` grid.
    ///
    /// Results come back in row-major order regardless of scheduling, so the
    /// output does not depend on the mode. The first error (including
    /// [`Error::Cancelled`]) aborts the run.
    pub fn map_locations<T, F>(
        &self,
        (rows, cols): (usize, usize),
        cancel: &CancelToken,
        f: F,
    ) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(Location) -> Result<T> + Sync + Send,
    {
        let run_row = |row: usize| -> Result<Vec<T>> {
            let mut out = Vec::with_capacity(cols);
            for col in 0..cols {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                out.push(f((row, col))?);
            }
            Ok(out)
        };

        let per_row: Vec<Vec<T>> = match self {
            ProcessingMode::Sequential => (0..rows).map(run_row).collect::<Result<_>>()?,
            #[cfg(feature = "parallel")]
            ProcessingMode::Parallel => (0..rows).into_par_iter().map(run_row).collect::<Result<_>>()?,
            #[cfg(feature = "parallel")]
            ProcessingMode::ParallelWith(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*threads)
                    .build()
                    .map_err(|e| Error::Other(format!("failed to build thread pool: {e}")))?;
                pool.install(|| (0..rows).into_par_iter().map(run_row).collect::<Result<_>>())?
            }
            #[cfg(not(feature = "parallel"))]
            _ => (0..rows).map(run_row).collect::<Result<_>>()?,
        };

        Ok(per_row.into_iter().flatten().collect())
    }
}

/// Number of worker threads available to the global pool
#[cfg(feature = "parallel")]
pub fn num_cpus() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
pub fn num_cpus() -> usize {
    1
}
