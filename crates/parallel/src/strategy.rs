//! Parallel processing strategies

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Processing mode for batch work
///
/// Without the `parallel` feature every mode runs sequentially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using all available cores
    Parallel,
    /// Parallel with specified number of threads
    ParallelWith(usize),
}

impl Default for ProcessingMode {
    fn default() -> Self {
        ProcessingMode::Parallel
    }
}

impl ProcessingMode {
    /// Mode for an optional thread count: `None` uses every core, `Some(1)`
    /// runs sequentially.
    pub fn from_threads(threads: Option<usize>) -> Self {
        match threads {
            None | Some(0) => ProcessingMode::Parallel,
            Some(1) => ProcessingMode::Sequential,
            Some(n) => ProcessingMode::ParallelWith(n),
        }
    }
}

/// Strategy for parallel execution
pub trait ParallelStrategy {
    /// Map a function over items and collect results in input order.
    fn par_map<I, T, F>(&self, items: Vec<I>, f: F) -> Vec<T>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> T + Sync + Send;
}

#[cfg(feature = "parallel")]
impl ParallelStrategy for ProcessingMode {
    fn par_map<I, T, F>(&self, items: Vec<I>, f: F) -> Vec<T>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> T + Sync + Send,
    {
        match self {
            ProcessingMode::Sequential => items.into_iter().map(f).collect(),
            ProcessingMode::Parallel => items.into_par_iter().map(f).collect(),
            ProcessingMode::ParallelWith(threads) => {
                match rayon::ThreadPoolBuilder::new().num_threads(*threads).build() {
                    Ok(pool) => pool.install(|| items.into_par_iter().map(f).collect()),
                    Err(e) => {
                        tracing::warn!("Failed to build {threads}-thread pool ({e}); using global pool");
                        items.into_par_iter().map(f).collect()
                    }
                }
            }
        }
    }
}

#[cfg(not(feature = "parallel"))]
impl ParallelStrategy for ProcessingMode {
    fn par_map<I, T, F>(&self, items: Vec<I>, f: F) -> Vec<T>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> T + Sync + Send,
    {
        items.into_iter().map(f).collect()
    }
}

/// Get the number of worker threads available
#[cfg(feature = "parallel")]
pub fn num_cpus() -> usize {
    rayon::current_num_threads()
}

/// Get the number of worker threads available (always 1 in sequential builds)
#[cfg(not(feature = "parallel"))]
pub fn num_cpus() -> usize {
    1
}
