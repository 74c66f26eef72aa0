//! Independent regionalization of many subregions
//!
//! Every subregion runs its own pipeline. Results are keyed by subregion
//! name; an error or panic in one entry is recorded there and never reaches
//! the others.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;

use phyloreg_core::{
    AttributeValue, DistanceMatrix, Error, ErrorKind, FeatureCollection, GeometryLookup, Result,
};
use phyloreg_parallel::{ParallelStrategy, ProcessingMode};

use super::stages::{regionalize, Assembled, RegionalizationParams};

/// Outcome of a batch run, one entry per subregion.
#[derive(Debug)]
pub struct BatchReport {
    pub results: BTreeMap<String, Result<Assembled>>,
}

/// One line of a [`BatchReport`] summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubregionSummary {
    pub name: String,
    pub outcome: SubregionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubregionOutcome {
    Success {
        k: usize,
        score: f64,
        regions: usize,
        warnings: usize,
    },
    Failure {
        kind: ErrorKind,
        cause: String,
    },
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Result<Assembled>> {
        self.results.get(name)
    }

    /// Successful subregions in name order.
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &Assembled)> {
        self.results
            .iter()
            .filter_map(|(name, r)| r.as_ref().ok().map(|a| (name.as_str(), a)))
    }

    /// Failed subregions in name order.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.results
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (name.as_str(), e)))
    }

    pub fn summary(&self) -> Vec<SubregionSummary> {
        self.results
            .iter()
            .map(|(name, result)| SubregionSummary {
                name: name.clone(),
                outcome: match result {
                    Ok(a) => SubregionOutcome::Success {
                        k: a.k(),
                        score: a.score(),
                        regions: a.regions().len(),
                        warnings: a.warnings().len(),
                    },
                    Err(e) => SubregionOutcome::Failure {
                        kind: e.kind(),
                        cause: one_line(e),
                    },
                },
            })
            .collect()
    }

    /// Region features of every successful subregion, tagged with a
    /// `subregion` property.
    pub fn to_features(&self) -> FeatureCollection {
        self.succeeded()
            .flat_map(|(name, a)| {
                a.regions().iter().map(move |r| {
                    let mut f = r.to_feature().with_id(format!("{name}/region-{}", r.label));
                    f.set_property("subregion", AttributeValue::String(name.to_string()));
                    f
                })
            })
            .collect()
    }
}

impl fmt::Display for SubregionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            SubregionOutcome::Success {
                k,
                score,
                regions,
                warnings,
            } => {
                write!(f, "{}: k = {k}, silhouette = {score:.4} ({regions} regions", self.name)?;
                if *warnings > 0 {
                    write!(f, ", {warnings} warnings")?;
                }
                write!(f, ")")
            }
            SubregionOutcome::Failure { kind, cause } => write!(f, "{}: failed [{kind}] {cause}", self.name),
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ok = self.succeeded().count();
        writeln!(f, "{} subregions: {} succeeded, {} failed", self.len(), ok, self.len() - ok)?;
        for line in self.summary() {
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

/// Regionalize each subregion independently.
pub fn run_batch<G>(
    subregions: BTreeMap<String, DistanceMatrix>,
    lookup: &G,
    params: &RegionalizationParams,
    mode: ProcessingMode,
) -> BatchReport
where
    G: GeometryLookup + ?Sized,
{
    run_prepared_batch(
        subregions.into_iter().map(|(name, m)| (name, Ok(m))).collect(),
        lookup,
        params,
        mode,
    )
}

/// Like [`run_batch`], for inputs that may already have failed to build,
/// such as the output of [`split_by_subregion`]. Input errors are carried
/// into the report unchanged.
pub fn run_prepared_batch<G>(
    subregions: BTreeMap<String, Result<DistanceMatrix>>,
    lookup: &G,
    params: &RegionalizationParams,
    mode: ProcessingMode,
) -> BatchReport
where
    G: GeometryLookup + ?Sized,
{
    tracing::debug!("Running {} subregions ({mode:?})", subregions.len());

    let items: Vec<(String, Result<DistanceMatrix>)> = subregions.into_iter().collect();
    let results = mode.par_map(items, |(name, input)| {
        let result = input.and_then(|matrix| run_isolated(&name, matrix, lookup, params));
        if let Err(e) = &result {
            tracing::warn!("Subregion '{name}' failed: {e}");
        }
        (name, result)
    });

    BatchReport {
        results: results.into_iter().collect(),
    }
}

fn run_isolated<G>(name: &str, matrix: DistanceMatrix, lookup: &G, params: &RegionalizationParams) -> Result<Assembled>
where
    G: GeometryLookup + ?Sized,
{
    match catch_unwind(AssertUnwindSafe(|| regionalize(matrix, lookup, params))) {
        Ok(result) => result,
        Err(panic) => {
            let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(Error::Other(format!("subregion '{name}' panicked: {msg}")))
        }
    }
}

/// Split one matrix into per-subregion matrices using a `(unit, subregion)`
/// table.
///
/// Units keep their order in the matrix. A subregion that lists a unit the
/// matrix lacks maps to `UnknownUnit`, and every subregion sharing a unit
/// with another one maps to `InvalidParameter`; other subregions are
/// unaffected. Matrix units missing from the table are left out.
pub fn split_by_subregion(
    matrix: &DistanceMatrix,
    table: &[(String, String)],
) -> BTreeMap<String, Result<DistanceMatrix>> {
    let mut members: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut owners: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (unit, subregion) in table {
        members.entry(subregion.as_str()).or_default().insert(unit.as_str());
        owners.entry(unit.as_str()).or_default().insert(subregion.as_str());
    }
    owners.retain(|_, subregions| subregions.len() > 1);
    for (unit, subregions) in &owners {
        tracing::warn!("Unit '{unit}' is listed in {} subregions", subregions.len());
    }

    members
        .into_iter()
        .map(|(subregion, units)| {
            let shared = units.iter().find_map(|u| owners.get(u).map(|s| (u, s)));
            let result = match (shared, units.iter().find(|u| !matrix.contains(u))) {
                (Some((unit, subregions)), _) => Err(Error::InvalidParameter {
                    name: "subregion",
                    value: unit.to_string(),
                    reason: format!(
                        "unit is listed in several subregions: {}",
                        subregions.iter().copied().collect::<Vec<_>>().join(", ")
                    ),
                }),
                (None, Some(missing)) => Err(Error::UnknownUnit(missing.to_string())),
                (None, None) => {
                    let ordered: Vec<&str> = matrix
                        .units()
                        .iter()
                        .map(String::as_str)
                        .filter(|u| units.contains(u))
                        .collect();
                    matrix.subset(&ordered)
                }
            };
            (subregion.to_string(), result)
        })
        .collect()
}

fn one_line(e: &Error) -> String {
    e.to_string().lines().next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Geometry;
    use phyloreg_core::vector::site_point;
    use std::collections::HashMap;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn matrix(names: &[&str]) -> DistanceMatrix {
        // Pairs (0,1), (2,3), ... are close, everything else far
        DistanceMatrix::from_fn(ids(names), |i, j| if i / 2 == j / 2 { 1.0 } else { 10.0 }).unwrap()
    }

    fn points(names: &[&str]) -> HashMap<String, Geometry<f64>> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), site_point(i as f64, 0.0)))
            .collect()
    }

    #[test]
    fn test_failure_is_isolated() {
        let mut subregions = BTreeMap::new();
        subregions.insert("north".to_string(), matrix(&["a", "b", "c", "d"]));
        subregions.insert("tiny".to_string(), matrix(&["x", "y"]));
        subregions.insert("south".to_string(), matrix(&["e", "f", "g", "h", "i", "j"]));
        let lookup = points(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "x", "y"]);

        let report = run_batch(subregions, &lookup, &RegionalizationParams::default(), ProcessingMode::Parallel);

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded().count(), 2);
        assert!(matches!(report.get("tiny"), Some(Err(Error::InsufficientData(_)))));
        assert_eq!(report.get("north").unwrap().as_ref().unwrap().k(), 2);
        assert_eq!(report.get("south").unwrap().as_ref().unwrap().k(), 3);
    }

    #[test]
    fn test_summary_and_display() {
        let mut subregions = BTreeMap::new();
        subregions.insert("ok".to_string(), matrix(&["a", "b", "c", "d"]));
        subregions.insert("small".to_string(), matrix(&["x", "y"]));
        let lookup = points(&["a", "b", "c", "d"]);

        let report = run_batch(subregions, &lookup, &RegionalizationParams::default(), ProcessingMode::Sequential);
        let summary = report.summary();

        assert_eq!(summary.len(), 2);
        assert!(matches!(summary[0].outcome, SubregionOutcome::Success { k: 2, regions: 2, warnings: 0, .. }));
        assert!(matches!(
            summary[1].outcome,
            SubregionOutcome::Failure { kind: ErrorKind::InsufficientData, .. }
        ));

        let text = report.to_string();
        assert!(text.starts_with("2 subregions: 1 succeeded, 1 failed"));
        assert!(text.contains("ok: k = 2, silhouette = 0.9000 (2 regions)"));
        assert!(text.contains("small: failed [InsufficientData]"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_split_by_subregion() {
        let m = matrix(&["a", "b", "c", "d", "e"]);
        let table = vec![
            ("c".to_string(), "east".to_string()),
            ("a".to_string(), "east".to_string()),
            ("b".to_string(), "west".to_string()),
            ("zz".to_string(), "ghost".to_string()),
        ];
        let split = split_by_subregion(&m, &table);

        assert_eq!(split.len(), 3);
        assert_eq!(split["east"].as_ref().unwrap().units(), &ids(&["a", "c"])[..]);
        assert_eq!(split["west"].as_ref().unwrap().size(), 1);
        assert!(matches!(split["ghost"], Err(Error::UnknownUnit(ref u)) if u == "zz"));
    }

    #[test]
    fn test_split_rejects_unit_in_two_subregions() {
        let m = matrix(&["a", "b", "c", "d", "e"]);
        let table = vec![
            ("a".to_string(), "east".to_string()),
            ("b".to_string(), "east".to_string()),
            ("b".to_string(), "west".to_string()),
            ("c".to_string(), "west".to_string()),
            ("d".to_string(), "north".to_string()),
            ("d".to_string(), "north".to_string()),
        ];
        let split = split_by_subregion(&m, &table);

        assert_eq!(split.len(), 3);
        for name in ["east", "west"] {
            assert!(
                matches!(&split[name], Err(Error::InvalidParameter { value, .. }) if value == "b"),
                "{name}: {:?}",
                split[name]
            );
        }
        // A repeated row within one subregion is not ambiguous
        assert_eq!(split["north"].as_ref().unwrap().units(), &ids(&["d"])[..]);
    }

    #[test]
    fn test_prepared_batch_keeps_input_errors() {
        let m = matrix(&["a", "b", "c", "d"]);
        let table: Vec<(String, String)> = ["a", "b", "c", "d", "missing"]
            .iter()
            .map(|u| (u.to_string(), if *u == "missing" { "bad" } else { "good" }.to_string()))
            .collect();
        let report = run_prepared_batch(
            split_by_subregion(&m, &table),
            &points(&["a", "b", "c", "d"]),
            &RegionalizationParams::default(),
            ProcessingMode::ParallelWith(2),
        );

        assert!(report.get("good").unwrap().is_ok());
        assert_eq!(report.failed().map(|(n, e)| (n, e.kind())).collect::<Vec<_>>(), vec![("bad", ErrorKind::UnknownUnit)]);
        assert_eq!(report.to_features().len(), 2);
    }
}
