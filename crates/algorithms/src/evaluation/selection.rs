//! Choosing the number of regions
//!
//! Cuts the dendrogram at every candidate k, scores each partition by mean
//! silhouette and keeps the best; ties go to the smaller k.

use serde::{Deserialize, Serialize};

use crate::clustering::Dendrogram;
use crate::maybe_rayon::*;
use phyloreg_core::{DistanceMatrix, Error, Partition, Result};

use super::silhouette::{explained_dissimilarity, silhouette};

/// Upper bound on candidate k when none is requested.
pub const DEFAULT_K_MAX: usize = 20;

/// Scores within this distance count as equal.
const SCORE_TOLERANCE: f64 = 1e-12;

/// Parameters for k selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationParams {
    /// Largest k to try; `None` means `min(n - 1, 20)`. Values above
    /// `n - 1` are clamped.
    pub k_max: Option<usize>,
}

/// Diagnostics for one candidate k.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub k: usize,
    /// Mean silhouette width
    pub score: f64,
    /// Share of total dissimilarity falling between clusters
    pub explained: f64,
}

/// Outcome of k selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Chosen number of clusters
    pub k: usize,
    /// Mean silhouette at the chosen k
    pub score: f64,
    /// One point per candidate, ascending k
    pub curve: Vec<CurvePoint>,
    /// Partition at the chosen k
    pub partition: Partition,
}

impl Evaluation {
    /// `(k, score)` pairs in ascending k.
    pub fn score_curve(&self) -> Vec<(usize, f64)> {
        self.curve.iter().map(|p| (p.k, p.score)).collect()
    }
}

/// Scores dendrogram cuts against the dissimilarities they were built from.
#[derive(Debug, Clone, Copy)]
pub struct ClusterEvaluator<'a> {
    matrix: &'a DistanceMatrix,
}

impl<'a> ClusterEvaluator<'a> {
    pub fn new(matrix: &'a DistanceMatrix) -> Self {
        Self { matrix }
    }

    /// Select k in `2..=k_max` maximising the mean silhouette.
    ///
    /// # Errors
    /// - `InsufficientData` if the dendrogram has fewer than 3 units
    /// - `InvalidParameter` if `k_max < 2`
    /// - `DimensionMismatch` if the dendrogram was not built from this matrix
    pub fn evaluate(&self, dendrogram: &Dendrogram, k_max: Option<usize>) -> Result<Evaluation> {
        let n = dendrogram.len();
        if n < 3 {
            return Err(Error::InsufficientData(format!(
                "selecting k needs at least 3 units, got {n}"
            )));
        }
        if dendrogram.units() != self.matrix.units() {
            return Err(Error::DimensionMismatch {
                expected: dendrogram.len(),
                rows: self.matrix.size(),
                cols: self.matrix.size(),
            });
        }

        let upper = match k_max {
            Some(k) if k < 2 => {
                return Err(Error::InvalidParameter {
                    name: "k_max",
                    value: k.to_string(),
                    reason: "must be at least 2".into(),
                })
            }
            Some(k) => k.min(n - 1),
            None => DEFAULT_K_MAX.min(n - 1),
        };

        let matrix = self.matrix;
        let scored: Vec<Result<(CurvePoint, Partition)>> = (2..=upper)
            .into_par_iter()
            .map(|k| {
                let partition = dendrogram.cut(k)?;
                let score = silhouette(matrix, &partition)?.mean;
                let explained = explained_dissimilarity(matrix, &partition)?;
                Ok((CurvePoint { k, score, explained }, partition))
            })
            .collect();

        let mut curve = Vec::with_capacity(scored.len());
        let mut best: Option<(CurvePoint, Partition)> = None;
        for entry in scored {
            let (point, partition) = entry?;
            tracing::debug!("k = {:>3}  silhouette = {:.4}  explained = {:.4}", point.k, point.score, point.explained);
            curve.push(point);

            let improves = match &best {
                None => true,
                Some((b, _)) => point.score > b.score + SCORE_TOLERANCE,
            };
            if improves {
                best = Some((point, partition));
            }
        }

        let (chosen, partition) = best.ok_or_else(|| Error::InsufficientData("no candidate k".into()))?;
        tracing::info!("Selected k = {} (mean silhouette {:.4})", chosen.k, chosen.score);

        Ok(Evaluation {
            k: chosen.k,
            score: chosen.score,
            curve,
            partition,
        })
    }
}

/// Select the optimal number of clusters for a dendrogram built from `matrix`.
pub fn select_optimal_k(
    matrix: &DistanceMatrix,
    dendrogram: &Dendrogram,
    params: &EvaluationParams,
) -> Result<Evaluation> {
    ClusterEvaluator::new(matrix).evaluate(dendrogram, params.k_max)
}
