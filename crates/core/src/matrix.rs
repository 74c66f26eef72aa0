//! Pairwise dissimilarity matrix over spatial units

use std::collections::HashMap;

use ndarray::Array2;

use crate::error::{Error, Result};

/// Default tolerance for the symmetry check on supplied tables.
pub const DEFAULT_SYMMETRY_TOLERANCE: f64 = 1e-9;

/// An immutable, symmetric, zero-diagonal dissimilarity matrix.
///
/// Unit identifiers are fixed at construction and kept in insertion order,
/// which is the order every downstream algorithm iterates in.
///
/// # Example
///
/// ```ignore
/// use phyloreg_core::DistanceMatrix;
///
/// let m = DistanceMatrix::from_rows(
///     vec!["A".into(), "B".into()],
///     vec![vec![0.0, 0.4], vec![0.4, 0.0]],
/// )?;
/// assert_eq!(m.distance("A", "B")?, 0.4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    units: Vec<String>,
    index: HashMap<String, usize>,
    values: Array2<f64>,
}

impl DistanceMatrix {
    /// Build from a precomputed N×N table using the default symmetry tolerance.
    pub fn from_array(units: Vec<String>, values: Array2<f64>) -> Result<Self> {
        Self::from_array_with_tolerance(units, values, DEFAULT_SYMMETRY_TOLERANCE)
    }

    /// Build from a precomputed N×N table.
    ///
    /// Fails with `DimensionMismatch` if the table is not N×N and with
    /// `AsymmetryError` if `|d(i,j) - d(j,i)| > tolerance`. The stored
    /// value for each pair is the mean of both triangles.
    pub fn from_array_with_tolerance(
        units: Vec<String>,
        values: Array2<f64>,
        tolerance: f64,
    ) -> Result<Self> {
        let n = units.len();
        let (rows, cols) = values.dim();
        if rows != n || cols != n {
            return Err(Error::DimensionMismatch { expected: n, rows, cols });
        }
        if !(tolerance >= 0.0) {
            return Err(Error::invalid("tolerance", tolerance, "must be >= 0"));
        }

        let index = build_index(&units)?;
        let mut values = values;

        for i in 0..n {
            let d = values[[i, i]];
            if !d.is_finite() || d.abs() > tolerance {
                return Err(Error::invalid(
                    "diagonal",
                    d,
                    format!("self-dissimilarity of {} must be 0", units[i]),
                ));
            }
            values[[i, i]] = 0.0;

            for j in (i + 1)..n {
                let ab = values[[i, j]];
                let ba = values[[j, i]];
                if !ab.is_finite() || !ba.is_finite() || ab < 0.0 || ba < 0.0 {
                    return Err(Error::invalid(
                        "dissimilarity",
                        if ab.is_finite() && ab >= 0.0 { ba } else { ab },
                        format!("d({}, {}) must be finite and non-negative", units[i], units[j]),
                    ));
                }
                if (ab - ba).abs() > tolerance {
                    return Err(Error::AsymmetryError {
                        a: units[i].clone(),
                        b: units[j].clone(),
                        ab,
                        ba,
                    });
                }
                let mean = 0.5 * (ab + ba);
                values[[i, j]] = mean;
                values[[j, i]] = mean;
            }
        }

        Ok(Self { units, index, values })
    }

    /// Build from a row-major nested table.
    pub fn from_rows(units: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = units.len();
        let nrows = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n) {
            return Err(Error::DimensionMismatch {
                expected: n,
                rows: nrows,
                cols: bad.len(),
            });
        }
        if nrows != n {
            return Err(Error::DimensionMismatch { expected: n, rows: nrows, cols: n });
        }

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((n, n), flat).map_err(|e| Error::Other(e.to_string()))?;
        Self::from_array(units, values)
    }

    /// Build from a dissimilarity function evaluated once per unordered pair.
    ///
    /// `f` receives unit indices `(i, j)` with `i < j`.
    pub fn from_fn<F>(units: Vec<String>, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let n = units.len();
        let mut values = Array2::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = f(i, j);
                values[[i, j]] = d;
                values[[j, i]] = d;
            }
        }
        Self::from_array(units, values)
    }

    /// Element-wise mean of matrices sharing the same unit sequence.
    pub fn mean(matrices: &[DistanceMatrix]) -> Result<Self> {
        let first = matrices
            .first()
            .ok_or_else(|| Error::InsufficientData("no matrices to average".into()))?;

        let mut sum = Array2::<f64>::zeros(first.values.dim());
        for m in matrices {
            if m.units != first.units {
                return Err(Error::DimensionMismatch {
                    expected: first.size(),
                    rows: m.size(),
                    cols: m.size(),
                });
            }
            sum += &m.values;
        }
        sum /= matrices.len() as f64;

        Ok(Self {
            units: first.units.clone(),
            index: first.index.clone(),
            values: sum,
        })
    }

    /// Dissimilarity between two units by identifier.
    pub fn distance(&self, a: &str, b: &str) -> Result<f64> {
        let i = self.require(a)?;
        let j = self.require(b)?;
        Ok(self.values[[i, j]])
    }

    /// Dissimilarity by unit index. Panics if out of range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    /// Unit identifiers in insertion order.
    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// Number of units.
    pub fn size(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn index_of(&self, unit: &str) -> Option<usize> {
        self.index.get(unit).copied()
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.index.contains_key(unit)
    }

    /// Read-only view of the underlying table.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Sub-matrix over `units`, in the order given.
    pub fn subset<S: AsRef<str>>(&self, units: &[S]) -> Result<Self> {
        let idx: Vec<usize> = units
            .iter()
            .map(|u| self.require(u.as_ref()))
            .collect::<Result<_>>()?;
        let ids: Vec<String> = units.iter().map(|u| u.as_ref().to_string()).collect();
        let index = build_index(&ids)?;

        let n = idx.len();
        let values = Array2::from_shape_fn((n, n), |(i, j)| self.values[[idx[i], idx[j]]]);

        Ok(Self { units: ids, index, values })
    }

    /// Off-diagonal (min, max, mean), or `None` for fewer than two units.
    pub fn summary(&self) -> Option<(f64, f64, f64)> {
        let n = self.size();
        if n < 2 {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.values[[i, j]];
                min = min.min(d);
                max = max.max(d);
                sum += d;
            }
        }
        let pairs = (n * (n - 1) / 2) as f64;
        Some((min, max, sum / pairs))
    }

    fn require(&self, unit: &str) -> Result<usize> {
        self.index_of(unit)
            .ok_or_else(|| Error::UnknownUnit(unit.to_string()))
    }
}

fn build_index(units: &[String]) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(units.len());
    for (i, u) in units.iter().enumerate() {
        if index.insert(u.clone(), i).is_some() {
            return Err(Error::invalid("unit", u, "duplicate identifier"));
        }
    }
    Ok(index)
}
