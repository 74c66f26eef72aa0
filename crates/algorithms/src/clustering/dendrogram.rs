//! Binary merge tree produced by agglomerative clustering

use ndarray::Array2;
use serde::Serialize;

use phyloreg_core::{DistanceMatrix, Error, Partition, Result};

use super::Linkage;

/// One agglomeration step.
///
/// Node ids follow the usual convention: leaves are `0..n`, the `i`-th
/// merge creates node `n + i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Merge {
    /// Smaller child node id
    pub left: usize,
    /// Larger child node id
    pub right: usize,
    /// Dissimilarity at which the children were joined
    pub height: f64,
    /// Number of units in the merged cluster
    pub size: usize,
}

/// Result of hierarchical clustering over a [`DistanceMatrix`].
///
/// Holds exactly `n - 1` merges whose heights never decrease.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dendrogram {
    units: Vec<String>,
    merges: Vec<Merge>,
    linkage: Linkage,
}

impl Dendrogram {
    pub(crate) fn new(units: Vec<String>, merges: Vec<Merge>, linkage: Linkage) -> Self {
        debug_assert_eq!(merges.len() + 1, units.len());
        Self { units, merges, linkage }
    }

    /// Leaf identifiers, in the order of the source matrix.
    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Merges in agglomeration order.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Height of the root merge.
    pub fn height(&self) -> f64 {
        self.merges.last().map_or(0.0, |m| m.height)
    }

    /// Cut the tree into exactly `k` clusters.
    ///
    /// Labels are `1..=k`, numbered by the first unit (in [`units`](Self::units)
    /// order) that belongs to each cluster.
    pub fn cut(&self, k: usize) -> Result<Partition> {
        let n = self.len();
        if k == 0 || k > n {
            return Err(Error::InvalidParameter {
                name: "k",
                value: k.to_string(),
                reason: format!("must be in 1..={n}"),
            });
        }

        let applied = n - k;
        let mut parent: Vec<usize> = (0..n + applied).collect();
        for (t, m) in self.merges[..applied].iter().enumerate() {
            parent[m.left] = n + t;
            parent[m.right] = n + t;
        }

        let mut root_label = vec![0usize; n + applied];
        let mut next = 0;
        let mut labels = Vec::with_capacity(n);
        for leaf in 0..n {
            let root = find_root(&mut parent, leaf);
            if root_label[root] == 0 {
                next += 1;
                root_label[root] = next;
            }
            labels.push(root_label[root]);
        }

        Partition::new(self.units.clone(), labels)
    }

    /// Cophenetic distances: for each pair, the height of the merge that
    /// first joins them.
    pub fn cophenetic(&self) -> Array2<f64> {
        let n = self.len();
        let mut out = Array2::zeros((n, n));
        let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

        for m in &self.merges {
            let left = std::mem::take(&mut members[m.left]);
            let right = std::mem::take(&mut members[m.right]);
            for &a in &left {
                for &b in &right {
                    out[[a, b]] = m.height;
                    out[[b, a]] = m.height;
                }
            }
            let mut joined = left;
            joined.extend(right);
            members.push(joined);
        }

        out
    }

    /// Pearson correlation between `matrix` and the cophenetic distances.
    ///
    /// Returns `None` when either side has zero variance.
    pub fn cophenetic_correlation(&self, matrix: &DistanceMatrix) -> Result<Option<f64>> {
        if matrix.units() != self.units() {
            return Err(Error::DimensionMismatch {
                expected: self.len(),
                rows: matrix.size(),
                cols: matrix.size(),
            });
        }

        let coph = self.cophenetic();
        let n = self.len();
        let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        let mut count = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let x = matrix.get(i, j);
                let y = coph[[i, j]];
                sx += x;
                sy += y;
                sxx += x * x;
                syy += y * y;
                sxy += x * y;
                count += 1.0;
            }
        }
        if count == 0.0 {
            return Ok(None);
        }

        let cov = sxy - sx * sy / count;
        let vx = sxx - sx * sx / count;
        let vy = syy - sy * sy / count;
        let scale = (vx.max(0.0) * vy.max(0.0)).sqrt();
        if scale <= f64::EPSILON * count {
            return Ok(None);
        }
        Ok(Some((cov / scale).clamp(-1.0, 1.0)))
    }
}

fn find_root(parent: &mut [usize], mut x: usize) -> usize {
    let mut root = x;
    while parent[root] != root {
        root = parent[root];
    }
    while parent[x] != root {
        let next = parent[x];
        parent[x] = root;
        x = next;
    }
    root
}
