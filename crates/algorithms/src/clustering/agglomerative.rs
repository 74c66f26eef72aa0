//! Agglomerative hierarchical clustering over a dissimilarity matrix
//!
//! Starts from singleton clusters and repeatedly merges the closest pair,
//! updating distances to the merged cluster with the Lance–Williams formula
//! of the chosen [`Linkage`]. With the default average linkage this is UPGMA.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use phyloreg_core::{Algorithm, DistanceMatrix, Error, Result};

use super::{Dendrogram, Linkage, Merge};

/// Relative tolerance under which two candidate distances count as tied.
const TIE_TOLERANCE: f64 = 1e-12;

/// Parameters for hierarchical clustering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Linkage criterion (default: average / UPGMA)
    pub linkage: Linkage,
}

/// Hierarchical clustering algorithm
#[derive(Debug, Clone, Default)]
pub struct Clusterer;

impl Algorithm for Clusterer {
    type Input = DistanceMatrix;
    type Output = Dendrogram;
    type Params = ClusterParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Hierarchical clustering"
    }

    fn description(&self) -> &'static str {
        "Agglomerate spatial units into a dendrogram by average (UPGMA) or other Lance-Williams linkage"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        cluster(&input, &params)
    }
}

/// Working cluster held in one slot of the distance table.
struct Slot {
    node: usize,
    size: usize,
    /// Sorted ranks of member identifiers, used for tie-breaking
    ranks: Vec<usize>,
}

/// Build a dendrogram from `matrix`.
///
/// Ties between equally close pairs are broken by merging the pair whose
/// combined, sorted member identifiers compare lexicographically smallest,
/// so the result depends only on the matrix contents. Merge heights are
/// raised to the running maximum when floating-point drift would make
/// them decrease.
///
/// # Errors
/// `InsufficientData` if the matrix has fewer than 2 units.
pub fn cluster(matrix: &DistanceMatrix, params: &ClusterParams) -> Result<Dendrogram> {
    let n = matrix.size();
    if n < 2 {
        return Err(Error::InsufficientData(format!(
            "clustering needs at least 2 units, got {n}"
        )));
    }

    let linkage = params.linkage;
    tracing::debug!("Clustering {n} units with {linkage} linkage");

    let ranks = identifier_ranks(matrix.units());
    let mut dist: Array2<f64> = matrix.values().clone();
    let mut slots: Vec<Slot> = (0..n)
        .map(|i| Slot {
            node: i,
            size: 1,
            ranks: vec![ranks[i]],
        })
        .collect();
    let mut active: Vec<usize> = (0..n).collect();
    let mut merges = Vec::with_capacity(n - 1);
    let mut max_height = 0.0_f64;

    for step in 0..n - 1 {
        let (i, j, d) = closest_pair(&dist, &active, &slots);

        let height = if d < max_height {
            tracing::trace!("Clamping merge height {d} to {max_height}");
            max_height
        } else {
            d
        };
        max_height = height;

        let (si, sj) = (slots[i].size, slots[j].size);
        let node_i = slots[i].node;
        let node_j = slots[j].node;
        merges.push(Merge {
            left: node_i.min(node_j),
            right: node_i.max(node_j),
            height,
            size: si + sj,
        });

        for &k in &active {
            if k == i || k == j {
                continue;
            }
            let updated = linkage.update(dist[[i, k]], dist[[j, k]], si, sj);
            dist[[i, k]] = updated;
            dist[[k, i]] = updated;
        }

        let absorbed = std::mem::take(&mut slots[j].ranks);
        let ranks = merge_sorted(&slots[i].ranks, &absorbed);
        slots[i] = Slot {
            node: n + step,
            size: si + sj,
            ranks,
        };
        active.retain(|&s| s != j);
    }

    Ok(Dendrogram::new(matrix.units().to_vec(), merges, linkage))
}

/// Result of comparing candidate linkages.
#[derive(Debug, Clone)]
pub struct LinkageChoice {
    pub linkage: Linkage,
    pub dendrogram: Dendrogram,
    /// Cophenetic correlation of the chosen dendrogram, if defined
    pub correlation: Option<f64>,
    /// Correlation per candidate, in candidate order
    pub candidates: Vec<(Linkage, Option<f64>)>,
}

/// Cluster with each candidate linkage and keep the one whose dendrogram
/// best preserves the original dissimilarities (highest cophenetic
/// correlation). Ties and undefined correlations favour earlier candidates.
pub fn select_linkage(matrix: &DistanceMatrix, candidates: &[Linkage]) -> Result<LinkageChoice> {
    if candidates.is_empty() {
        return Err(Error::InvalidParameter {
            name: "candidates",
            value: "[]".into(),
            reason: "at least one linkage is required".into(),
        });
    }

    let mut best: Option<(Linkage, Dendrogram, Option<f64>)> = None;
    let mut scores = Vec::with_capacity(candidates.len());

    for &linkage in candidates {
        let dendrogram = cluster(matrix, &ClusterParams { linkage })?;
        let r = dendrogram.cophenetic_correlation(matrix)?;
        scores.push((linkage, r));

        let better = match &best {
            None => true,
            Some((_, _, best_r)) => r.unwrap_or(f64::NEG_INFINITY) > best_r.unwrap_or(f64::NEG_INFINITY),
        };
        if better {
            best = Some((linkage, dendrogram, r));
        }
    }

    let (linkage, dendrogram, correlation) = best.ok_or_else(|| Error::Other("no linkage evaluated".into()))?;
    tracing::debug!("Selected {linkage} linkage (cophenetic r = {correlation:?})");
    Ok(LinkageChoice {
        linkage,
        dendrogram,
        correlation,
        candidates: scores,
    })
}

/// Find the closest active pair `(i, j, d)`, breaking ties by member identifiers.
fn closest_pair(dist: &Array2<f64>, active: &[usize], slots: &[Slot]) -> (usize, usize, f64) {
    let mut best = (active[0], active[1], dist[[active[0], active[1]]]);
    let mut best_key: Option<Vec<usize>> = None;

    for (p, &i) in active.iter().enumerate() {
        for &j in &active[p + 1..] {
            let d = dist[[i, j]];
            let tol = TIE_TOLERANCE * best.2.abs().max(1.0);

            if d < best.2 - tol {
                best = (i, j, d);
                best_key = None;
            } else if (d - best.2).abs() <= tol && (i, j) != (best.0, best.1) {
                let current = best_key.get_or_insert_with(|| merge_sorted(&slots[best.0].ranks, &slots[best.1].ranks));
                let candidate = merge_sorted(&slots[i].ranks, &slots[j].ranks);
                if candidate.cmp(current) == Ordering::Less {
                    best = (i, j, d);
                    best_key = Some(candidate);
                }
            }
        }
    }

    best
}

/// Rank of each identifier in lexicographic order.
fn identifier_ranks(units: &[String]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..units.len()).collect();
    order.sort_by(|&a, &b| units[a].cmp(&units[b]));
    let mut ranks = vec![0; units.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = rank;
    }
    ranks
}

fn merge_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut x, mut y) = (0, 0);
    while x < a.len() && y < b.len() {
        if a[x] <= b[y] {
            out.push(a[x]);
            x += 1;
        } else {
            out.push(b[y]);
            y += 1;
        }
    }
    out.extend_from_slice(&a[x..]);
    out.extend_from_slice(&b[y..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn two_pairs() -> DistanceMatrix {
        // d(A,B) = d(C,D) = 1, every cross pair = 10
        DistanceMatrix::from_rows(
            ids(&["A", "B", "C", "D"]),
            vec![
                vec![0.0, 1.0, 10.0, 10.0],
                vec![1.0, 0.0, 10.0, 10.0],
                vec![10.0, 10.0, 0.0, 1.0],
                vec![10.0, 10.0, 1.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_upgma_two_pairs() {
        let d = cluster(&two_pairs(), &ClusterParams::default()).unwrap();
        let m = d.merges();
        assert_eq!(m.len(), 3);
        // {A,B} sorts before {C,D}, so it is merged first
        assert_eq!((m[0].left, m[0].right, m[0].height, m[0].size), (0, 1, 1.0, 2));
        assert_eq!((m[1].left, m[1].right, m[1].height, m[1].size), (2, 3, 1.0, 2));
        assert_eq!((m[2].left, m[2].right, m[2].height, m[2].size), (4, 5, 10.0, 4));
    }

    #[test]
    fn test_upgma_averages_by_size() {
        // A,B merge at 2; C is 4 from A and 8 from B -> UPGMA height 6
        let m = DistanceMatrix::from_rows(
            ids(&["A", "B", "C"]),
            vec![vec![0.0, 2.0, 4.0], vec![2.0, 0.0, 8.0], vec![4.0, 8.0, 0.0]],
        )
        .unwrap();
        let d = cluster(&m, &ClusterParams::default()).unwrap();
        assert_eq!(d.merges()[1].height, 6.0);

        let single = cluster(&m, &ClusterParams { linkage: Linkage::Single }).unwrap();
        assert_eq!(single.merges()[1].height, 4.0);
        let complete = cluster(&m, &ClusterParams { linkage: Linkage::Complete }).unwrap();
        assert_eq!(complete.merges()[1].height, 8.0);
    }

    #[test]
    fn test_tie_break_uses_identifiers_not_positions() {
        // Same uniform matrix, units listed in different orders
        let fwd = DistanceMatrix::from_fn(ids(&["c", "a", "b"]), |_, _| 1.0).unwrap();
        let d = cluster(&fwd, &ClusterParams::default()).unwrap();
        // "a" (index 1) and "b" (index 2) are merged first
        assert_eq!((d.merges()[0].left, d.merges()[0].right), (1, 2));
    }

    #[test]
    fn test_heights_monotone() {
        let m = DistanceMatrix::from_fn(ids(&["a", "b", "c", "d", "e", "f", "g"]), |i, j| {
            ((i * 7 + j * 13) % 11) as f64 + 1.0
        })
        .unwrap();
        for &linkage in Linkage::ALL {
            let d = cluster(&m, &ClusterParams { linkage }).unwrap();
            assert_eq!(d.merges().len(), 6);
            for w in d.merges().windows(2) {
                assert!(w[1].height >= w[0].height, "{linkage}: {:?}", d.merges());
            }
            assert_eq!(d.merges().last().unwrap().size, 7);
        }
    }

    #[test]
    fn test_insufficient_data() {
        let m = DistanceMatrix::from_fn(ids(&["only"]), |_, _| 0.0).unwrap();
        assert!(matches!(
            cluster(&m, &ClusterParams::default()),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_algorithm_trait() {
        let d = Clusterer.execute_default(two_pairs()).unwrap();
        assert_eq!(d.len(), 4);
        assert_eq!(d.linkage(), Linkage::Average);
    }

    #[test]
    fn test_select_linkage() {
        let choice = select_linkage(&two_pairs(), Linkage::ALL).unwrap();
        assert_eq!(choice.candidates.len(), Linkage::ALL.len());
        // Every linkage reproduces this ultrametric input exactly; first wins
        assert_eq!(choice.linkage, Linkage::Average);
        assert!((choice.correlation.unwrap() - 1.0).abs() < 1e-9);
        assert!(select_linkage(&two_pairs(), &[]).is_err());
    }
}
