//! Assignment of spatial units to cluster labels

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Error, Result};

/// A hard partition of spatial units into `k` clusters labelled `1..=k`.
///
/// Every unit appears exactly once and every label in `1..=k` has at
/// least one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    units: Vec<String>,
    labels: Vec<usize>,
    k: usize,
}

impl Partition {
    /// Create a partition from parallel unit/label sequences.
    ///
    /// Labels must be contiguous `1..=k` with no empty label.
    pub fn new(units: Vec<String>, labels: Vec<usize>) -> Result<Self> {
        if units.len() != labels.len() {
            return Err(Error::DimensionMismatch {
                expected: units.len(),
                rows: labels.len(),
                cols: 1,
            });
        }

        let mut seen = HashSet::with_capacity(units.len());
        for u in &units {
            if !seen.insert(u.as_str()) {
                return Err(Error::invalid("unit", u, "appears more than once"));
            }
        }

        let k = labels.iter().copied().max().unwrap_or(0);
        if k > labels.len() {
            return Err(Error::invalid("label", k, "labels must be contiguous"));
        }
        let mut counts = vec![0usize; k + 1];
        for &l in &labels {
            counts[l] += 1;
        }
        if counts[0] > 0 {
            return Err(Error::invalid("label", 0, "labels start at 1"));
        }
        if let Some(empty) = (1..=k).find(|&l| counts[l] == 0) {
            return Err(Error::invalid("label", empty, "labels must be contiguous"));
        }

        Ok(Self { units, labels, k })
    }

    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// Labels parallel to [`Partition::units`].
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn label_of(&self, unit: &str) -> Option<usize> {
        self.units
            .iter()
            .position(|u| u == unit)
            .map(|i| self.labels[i])
    }

    /// Members of `label`, in unit order.
    pub fn members(&self, label: usize) -> Vec<&str> {
        self.iter()
            .filter(|&(_, l)| l == label)
            .map(|(u, _)| u)
            .collect()
    }

    /// Cluster sizes indexed by `label - 1`.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &l in &self.labels {
            sizes[l - 1] += 1;
        }
        sizes
    }

    /// Iterate `(unit, label)` pairs in unit order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.units
            .iter()
            .map(String::as_str)
            .zip(self.labels.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partition_basic() {
        let p = Partition::new(ids(&["A", "B", "C"]), vec![1, 2, 1]).unwrap();
        assert_eq!(p.k(), 2);
        assert_eq!(p.members(1), vec!["A", "C"]);
        assert_eq!(p.sizes(), vec![2, 1]);
        assert_eq!(p.label_of("B"), Some(2));
        assert_eq!(p.label_of("Z"), None);
    }

    #[test]
    fn test_partition_rejects_gaps() {
        assert!(Partition::new(ids(&["A", "B"]), vec![1, 3]).is_err());
        assert!(Partition::new(ids(&["A", "B"]), vec![0, 1]).is_err());
        assert!(Partition::new(ids(&["A", "A"]), vec![1, 1]).is_err());
        assert!(Partition::new(ids(&["A"]), vec![1, 1]).is_err());
    }

    #[test]
    fn test_partition_rejects_oversized_label() {
        let err = Partition::new(ids(&["A", "B"]), vec![1, usize::MAX]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "label", .. }));
        assert!(Partition::new(ids(&["A", "B"]), vec![1, 1 << 40]).is_err());
        assert!(Partition::new(ids(&["A"]), vec![usize::MAX]).is_err());
    }
}
