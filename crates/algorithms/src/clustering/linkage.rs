//! Linkage criteria as Lance–Williams updates

use serde::{Deserialize, Serialize};

/// Criterion for the dissimilarity between a merged cluster and the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// UPGMA: size-weighted mean of the merged pair's distances
    #[default]
    Average,
    /// WPGMA: unweighted mean of the merged pair's distances
    Weighted,
    /// Nearest member
    Single,
    /// Farthest member
    Complete,
}

impl Linkage {
    pub const ALL: &[Linkage] = &[Self::Average, Self::Weighted, Self::Single, Self::Complete];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Weighted => "weighted",
            Self::Single => "single",
            Self::Complete => "complete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "average" | "upgma" => Some(Self::Average),
            "weighted" | "wpgma" | "mcquitty" => Some(Self::Weighted),
            "single" => Some(Self::Single),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Distance from `i ∪ j` to `k`, given `d(i,k)`, `d(j,k)` and the sizes
    /// of `i` and `j`.
    #[inline]
    pub(crate) fn update(&self, d_ik: f64, d_jk: f64, n_i: usize, n_j: usize) -> f64 {
        match self {
            Self::Average => {
                let (ni, nj) = (n_i as f64, n_j as f64);
                (ni * d_ik + nj * d_jk) / (ni + nj)
            }
            Self::Weighted => 0.5 * (d_ik + d_jk),
            Self::Single => d_ik.min(d_jk),
            Self::Complete => d_ik.max(d_jk),
        }
    }
}

impl std::fmt::Display for Linkage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
