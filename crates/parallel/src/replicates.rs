//! Averaging dissimilarity over independent replicates
//!
//! Each replicate (e.g. one tree from a posterior sample) yields its own
//! matrix. Replicates share no state, so they are computed in parallel and
//! then averaged; the mean does not depend on completion order.

use phyloreg_core::{DissimilaritySource, DistanceMatrix, Error, Result};

use crate::strategy::{ParallelStrategy, ProcessingMode};

/// Mean dissimilarity matrix over every replicate of `source`.
pub fn mean_over_replicates<S>(source: &S, mode: ProcessingMode) -> Result<DistanceMatrix>
where
    S: DissimilaritySource + ?Sized,
{
    let n = source.replicates();
    if n == 0 {
        return Err(Error::InsufficientData("dissimilarity source has no replicates".into()));
    }

    tracing::debug!("Computing {n} dissimilarity replicates ({mode:?})");

    let matrices = mode
        .par_map((0..n).collect(), |i| source.replicate(i))
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    DistanceMatrix::mean(&matrices)
}
