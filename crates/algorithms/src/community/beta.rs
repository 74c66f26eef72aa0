//! Pairwise beta diversity between sites
//!
//! For two sites, `a` is the number of shared taxa and `b`, `c` the numbers
//! found only at the first or second site.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::maybe_rayon::*;
use phyloreg_core::{CommunityMatrix, DissimilaritySource, DistanceMatrix, Error, Result};

/// Beta-diversity index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetaIndex {
    /// Simpson turnover, `min(b, c) / (a + min(b, c))`
    #[default]
    Simpson,
    /// Sørensen dissimilarity, `(b + c) / (2a + b + c)`
    Sorensen,
}

impl BetaIndex {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simpson => "simpson",
            Self::Sorensen => "sorensen",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "simpson" | "sim" | "betasim" => Some(Self::Simpson),
            "sorensen" | "sor" | "sørensen" => Some(Self::Sorensen),
            _ => None,
        }
    }

    /// Dissimilarity from shared (`a`) and exclusive (`b`, `c`) counts.
    ///
    /// Two empty sites are identical (0). For Simpson, an empty site against
    /// an occupied one is maximally different (1).
    fn value(&self, a: usize, b: usize, c: usize) -> f64 {
        match self {
            Self::Simpson => {
                let m = b.min(c);
                if a + m > 0 {
                    m as f64 / (a + m) as f64
                } else if b + c > 0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Sorensen => {
                let denom = 2 * a + b + c;
                if denom == 0 {
                    0.0
                } else {
                    (b + c) as f64 / denom as f64
                }
            }
        }
    }
}

/// Dissimilarity between every pair of sites.
pub fn beta_diversity(community: &CommunityMatrix, index: BetaIndex) -> Result<DistanceMatrix> {
    let n = community.sites().len();
    let presence = community.presence();

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let row_i = presence.row(i);
            ((i + 1)..n)
                .map(|j| {
                    let (mut a, mut b, mut c) = (0, 0, 0);
                    for (&x, &y) in row_i.iter().zip(presence.row(j).iter()) {
                        match (x, y) {
                            (true, true) => a += 1,
                            (true, false) => b += 1,
                            (false, true) => c += 1,
                            (false, false) => {}
                        }
                    }
                    index.value(a, b, c)
                })
                .collect()
        })
        .collect();

    let mut values = Array2::zeros((n, n));
    for (i, row) in rows.iter().enumerate() {
        for (offset, &v) in row.iter().enumerate() {
            let j = i + 1 + offset;
            values[[i, j]] = v;
            values[[j, i]] = v;
        }
    }

    tracing::debug!("Computed {} beta diversity over {n} sites", index.name());
    DistanceMatrix::from_array(community.sites().to_vec(), values)
}

/// Simpson turnover between every pair of sites.
pub fn simpson_beta(community: &CommunityMatrix) -> Result<DistanceMatrix> {
    beta_diversity(community, BetaIndex::Simpson)
}

/// Sørensen dissimilarity between every pair of sites.
pub fn sorensen_beta(community: &CommunityMatrix) -> Result<DistanceMatrix> {
    beta_diversity(community, BetaIndex::Sorensen)
}

/// A community table viewed as a single-replicate dissimilarity source.
#[derive(Debug, Clone, Copy)]
pub struct BetaDiversity<'a> {
    pub community: &'a CommunityMatrix,
    pub index: BetaIndex,
}

impl<'a> BetaDiversity<'a> {
    pub fn new(community: &'a CommunityMatrix, index: BetaIndex) -> Self {
        Self { community, index }
    }
}

impl DissimilaritySource for BetaDiversity<'_> {
    fn replicates(&self) -> usize {
        1
    }

    fn replicate(&self, index: usize) -> Result<DistanceMatrix> {
        if index != 0 {
            return Err(Error::InvalidParameter {
                name: "replicate",
                value: index.to_string(),
                reason: "a community table has one replicate".into(),
            });
        }
        beta_diversity(self.community, self.index)
    }
}
