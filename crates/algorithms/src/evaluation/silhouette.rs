//! Silhouette widths and between-cluster share of dissimilarity

use serde::Serialize;

use phyloreg_core::{DistanceMatrix, Error, Partition, Result};

/// Silhouette widths for one partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SilhouetteReport {
    /// Mean width over all units, in [-1, 1]
    pub mean: f64,
    /// Width per unit, parallel to the partition's units
    pub widths: Vec<f64>,
}

/// Matrix index of each partition unit.
fn matrix_indices(matrix: &DistanceMatrix, partition: &Partition) -> Result<Vec<usize>> {
    if partition.len() != matrix.size() {
        return Err(Error::DimensionMismatch {
            expected: matrix.size(),
            rows: partition.len(),
            cols: 1,
        });
    }
    if partition.units() == matrix.units() {
        return Ok((0..matrix.size()).collect());
    }
    partition
        .units()
        .iter()
        .map(|u| matrix.index_of(u).ok_or_else(|| Error::UnknownUnit(u.clone())))
        .collect()
}

/// Silhouette of every unit in `partition`.
///
/// For unit `i`, `a` is the mean dissimilarity to the other members of its
/// cluster and `b` the smallest mean dissimilarity to any other cluster;
/// the width is `(b - a) / max(a, b)`. Units in singleton clusters, units
/// with `max(a, b) = 0` and every unit of a one-cluster partition score 0.
pub fn silhouette(matrix: &DistanceMatrix, partition: &Partition) -> Result<SilhouetteReport> {
    let idx = matrix_indices(matrix, partition)?;
    let labels = partition.labels();
    let sizes = partition.sizes();
    let k = partition.k();
    let n = idx.len();

    let mut widths = vec![0.0; n];
    if k < 2 {
        return Ok(SilhouetteReport { mean: 0.0, widths });
    }

    let mut sums = vec![0.0; k];
    for p in 0..n {
        let own = labels[p] - 1;
        if sizes[own] < 2 {
            continue;
        }

        sums.iter_mut().for_each(|s| *s = 0.0);
        for q in 0..n {
            if q != p {
                sums[labels[q] - 1] += matrix.get(idx[p], idx[q]);
            }
        }

        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        widths[p] = if denom > 0.0 { ((b - a) / denom).clamp(-1.0, 1.0) } else { 0.0 };
    }

    let mean = widths.iter().sum::<f64>() / n as f64;
    Ok(SilhouetteReport { mean, widths })
}

/// Fraction of the total pairwise dissimilarity that lies between clusters.
///
/// 0 for a single cluster, approaching 1 as every pair is separated.
/// Returns 0 when all dissimilarities are zero.
pub fn explained_dissimilarity(matrix: &DistanceMatrix, partition: &Partition) -> Result<f64> {
    let idx = matrix_indices(matrix, partition)?;
    let labels = partition.labels();
    let n = idx.len();

    let (mut total, mut within) = (0.0, 0.0);
    for p in 0..n {
        for q in (p + 1)..n {
            let d = matrix.get(idx[p], idx[q]);
            total += d;
            if labels[p] == labels[q] {
                within += d;
            }
        }
    }

    Ok(if total > 0.0 { 1.0 - within / total } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn two_pairs() -> DistanceMatrix {
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
    fn test_silhouette_two_pairs() {
        let p = Partition::new(ids(&["A", "B", "C", "D"]), vec![1, 1, 2, 2]).unwrap();
        let s = silhouette(&two_pairs(), &p).unwrap();
        // a = 1, b = 10 for every unit
        for w in &s.widths {
            assert!((w - 0.9).abs() < 1e-12);
        }
        assert!((s.mean - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_singletons_score_zero() {
        let p = Partition::new(ids(&["A", "B", "C", "D"]), vec![1, 1, 2, 3]).unwrap();
        let s = silhouette(&two_pairs(), &p).unwrap();
        assert_eq!(s.widths[2], 0.0);
        assert_eq!(s.widths[3], 0.0);
        assert!((s.mean - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_bad_split_is_negative() {
        let p = Partition::new(ids(&["A", "B", "C", "D"]), vec![1, 2, 1, 2]).unwrap();
        let s = silhouette(&two_pairs(), &p).unwrap();
        assert!(s.mean < 0.0);
        assert!(s.widths.iter().all(|w| (-1.0..=1.0).contains(w)));
    }

    #[test]
    fn test_partition_in_other_order() {
        let p = Partition::new(ids(&["D", "C", "B", "A"]), vec![1, 1, 2, 2]).unwrap();
        let s = silhouette(&two_pairs(), &p).unwrap();
        assert!((s.mean - 0.9).abs() < 1e-12);

        let unknown = Partition::new(ids(&["A", "B", "C", "Z"]), vec![1, 1, 2, 2]).unwrap();
        assert!(matches!(silhouette(&two_pairs(), &unknown), Err(Error::UnknownUnit(_))));
    }

    #[test]
    fn test_explained_dissimilarity() {
        let good = Partition::new(ids(&["A", "B", "C", "D"]), vec![1, 1, 2, 2]).unwrap();
        let one = Partition::new(ids(&["A", "B", "C", "D"]), vec![1, 1, 1, 1]).unwrap();
        let m = two_pairs();
        assert!((explained_dissimilarity(&m, &good).unwrap() - 40.0 / 42.0).abs() < 1e-12);
        assert_eq!(explained_dissimilarity(&m, &one).unwrap(), 0.0);
    }
}
