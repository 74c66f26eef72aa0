//! End-to-end regionalization tests.
//!
//! Each test builds a dissimilarity matrix, runs the full pipeline and checks
//! the dendrogram, the selected k and the assembled regions.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use geo_types::Geometry;
use phyloreg_algorithms::clustering::{cluster, ClusterParams};
use phyloreg_algorithms::evaluation::{ClusterEvaluator, EvaluationParams};
use phyloreg_algorithms::pipeline::{
    regionalize, run_batch, run_prepared_batch, split_by_subregion, Built, RegionalizationParams,
    SubregionOutcome,
};
use phyloreg_algorithms::regions::{AssemblyParams, AssemblyWarning};
use phyloreg_core::io::{read_distance_matrix, read_geometries, read_subregions};
use phyloreg_core::vector::grid_cell;
use phyloreg_core::{DistanceMatrix, Error, ErrorKind};
use phyloreg_parallel::ProcessingMode;

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Unit cells laid out on a row, one per name.
fn row_of_cells(names: &[&str]) -> HashMap<String, Geometry<f64>> {
    names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.to_string(), Geometry::Polygon(grid_cell(i as f64 + 0.5, 0.5, 1.0))))
        .collect()
}

fn four_units() -> DistanceMatrix {
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

/// `groups` tight clusters of `size` units each, far apart.
fn blocks(groups: usize, size: usize) -> DistanceMatrix {
    let units = (0..groups * size).map(|i| format!("u{i:03}")).collect();
    DistanceMatrix::from_fn(units, |i, j| {
        if i / size == j / size {
            0.05 + 0.001 * ((i + j) % 7) as f64
        } else {
            1.0 + 0.01 * ((i * j) % 5) as f64
        }
    })
    .unwrap()
}

// ---------------------------------------------------------------------------
// Core scenarios
// ---------------------------------------------------------------------------

#[test]
fn four_unit_scenario() {
    let lookup = row_of_cells(&["A", "B", "C", "D"]);
    let result = regionalize(four_units(), &lookup, &RegionalizationParams::default()).unwrap();

    assert_eq!(result.k(), 2);
    assert!((result.score() - 0.9).abs() < 1e-12);
    assert_eq!(result.partition().members(1), vec!["A", "B"]);
    assert_eq!(result.partition().members(2), vec!["C", "D"]);

    let heights: Vec<f64> = result.dendrogram.merges().iter().map(|m| m.height).collect();
    assert_eq!(heights, vec![1.0, 1.0, 10.0]);

    assert_eq!(result.regions().len(), 2);
    for region in result.regions() {
        assert_eq!(region.member_count(), 2);
        assert!((region.area - 2.0).abs() < 1e-9);
    }
}

#[test]
fn uniform_matrix_picks_two() {
    let m = DistanceMatrix::from_fn(ids(&["a", "b", "c", "d", "e", "f"]), |_, _| 0.5).unwrap();
    let d = cluster(&m, &ClusterParams::default()).unwrap();
    let e = ClusterEvaluator::new(&m).evaluate(&d, None).unwrap();

    assert_eq!(e.k, 2);
    assert_eq!(e.curve.len(), 4);
    assert!(e.curve.iter().all(|p| p.score.abs() < 1e-9));
}

#[test]
fn separated_clusters_score_high() {
    let m = blocks(2, 8);
    let d = cluster(&m, &ClusterParams::default()).unwrap();
    let e = ClusterEvaluator::new(&m).evaluate(&d, None).unwrap();

    assert_eq!(e.k, 2);
    assert!(e.score > 0.9, "score = {}", e.score);
    assert_eq!(e.partition.sizes(), vec![8, 8]);
}

#[test]
fn three_blocks_found() {
    let m = blocks(3, 5);
    let lookup: HashMap<String, Geometry<f64>> = HashMap::new();
    let result = regionalize(m, &lookup, &RegionalizationParams::default()).unwrap();
    assert_eq!(result.k(), 3);
    // No geometry at all: every region is dropped with warnings, nothing fails
    assert!(result.regions().is_empty());
    assert_eq!(result.warnings().len(), 15 + 3);
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn heights_monotone_and_cuts_cover_units() {
    let m = DistanceMatrix::from_fn((0..25).map(|i| format!("c{i:02}")).collect(), |i, j| {
        ((i * 37 + j * 11) % 19) as f64 / 3.0 + 0.1
    })
    .unwrap();
    let d = cluster(&m, &ClusterParams::default()).unwrap();

    assert_eq!(d.merges().len(), 24);
    for w in d.merges().windows(2) {
        assert!(w[1].height >= w[0].height);
    }

    for k in 1..=25 {
        let p = d.cut(k).unwrap();
        assert_eq!(p.k(), k);
        assert_eq!(p.units(), m.units());
        assert!(p.sizes().iter().all(|&s| s > 0));
        assert_eq!(p.sizes().iter().sum::<usize>(), 25);
    }
}

#[test]
fn deterministic_runs() {
    let m = blocks(4, 6);
    let names: Vec<String> = m.units().to_vec();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let lookup = row_of_cells(&refs);
    let params = RegionalizationParams::default();

    let first = regionalize(m.clone(), &lookup, &params).unwrap();
    let second = regionalize(m, &lookup, &params).unwrap();

    assert_eq!(first.dendrogram, second.dendrogram);
    assert_eq!(first.k(), second.k());
    assert_eq!(first.partition().labels(), second.partition().labels());
    let order = |r: &phyloreg_algorithms::pipeline::Assembled| r.regions().iter().map(|x| x.label).collect::<Vec<_>>();
    assert_eq!(order(&first), order(&second));
}

#[test]
fn missing_geometry_drops_one_member() {
    let lookup = row_of_cells(&["A", "B", "C"]);
    let result = regionalize(four_units(), &lookup, &RegionalizationParams::default()).unwrap();

    let counts: Vec<(usize, usize)> = result.regions().iter().map(|r| (r.label, r.member_count())).collect();
    assert_eq!(counts, vec![(1, 2), (2, 1)]);
    assert_eq!(
        result.warnings(),
        &[AssemblyWarning::MissingGeometry { unit: "D".into(), label: 2 }]
    );
}

#[test]
fn stage_by_stage_matches_regionalize() {
    let lookup = row_of_cells(&["A", "B", "C", "D"]);
    let staged = Built::new(four_units())
        .cluster(&ClusterParams::default())
        .unwrap()
        .evaluate(&EvaluationParams { k_max: Some(3) })
        .unwrap()
        .assemble(&lookup, &AssemblyParams::default());
    let direct = regionalize(four_units(), &lookup, &RegionalizationParams::default()).unwrap();

    assert_eq!(staged.k(), direct.k());
    assert_eq!(staged.regions(), direct.regions());
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[test]
fn batch_isolates_failures() {
    let mut subregions = BTreeMap::new();
    subregions.insert("andes".to_string(), four_units());
    subregions.insert("islands".to_string(), DistanceMatrix::from_fn(ids(&["x", "y"]), |_, _| 1.0).unwrap());
    subregions.insert("coast".to_string(), blocks(3, 4));

    let lookup = row_of_cells(&["A", "B", "C", "D"]);
    let report = run_batch(subregions, &lookup, &RegionalizationParams::default(), ProcessingMode::ParallelWith(2));

    assert_eq!(report.len(), 3);
    assert_eq!(report.get("andes").unwrap().as_ref().unwrap().k(), 2);
    assert_eq!(report.get("coast").unwrap().as_ref().unwrap().k(), 3);
    assert!(matches!(report.get("islands"), Some(Err(Error::InsufficientData(_)))));

    let failures: Vec<_> = report
        .summary()
        .into_iter()
        .filter_map(|s| match s.outcome {
            SubregionOutcome::Failure { kind, .. } => Some((s.name, kind)),
            SubregionOutcome::Success { .. } => None,
        })
        .collect();
    assert_eq!(failures, vec![("islands".to_string(), ErrorKind::InsufficientData)]);
}

#[test]
fn batch_results_independent_of_mode() {
    let build = || {
        let mut s = BTreeMap::new();
        s.insert("one".to_string(), blocks(2, 5));
        s.insert("two".to_string(), blocks(3, 3));
        s.insert("three".to_string(), four_units());
        s
    };
    let lookup: HashMap<String, Geometry<f64>> = HashMap::new();
    let params = RegionalizationParams::default();

    let seq = run_batch(build(), &lookup, &params, ProcessingMode::Sequential);
    let par = run_batch(build(), &lookup, &params, ProcessingMode::Parallel);
    assert_eq!(seq.to_string(), par.to_string());
}

// ---------------------------------------------------------------------------
// Files on disk
// ---------------------------------------------------------------------------

#[test]
fn regionalize_from_files() {
    let dir = tempfile::tempdir().unwrap();

    let matrix_path = dir.path().join("matrix.csv");
    let mut f = std::fs::File::create(&matrix_path).unwrap();
    writeln!(f, ",A,B,C,D,E").unwrap();
    writeln!(f, "A,0,1,10,10,10").unwrap();
    writeln!(f, "B,1,0,10,10,10").unwrap();
    writeln!(f, "C,10,10,0,1,10").unwrap();
    writeln!(f, "D,10,10,1,0,10").unwrap();
    writeln!(f, "E,10,10,10,10,0").unwrap();

    let cells_path = dir.path().join("cells.csv");
    let mut f = std::fs::File::create(&cells_path).unwrap();
    writeln!(f, "unit,x,y,size").unwrap();
    for (i, u) in ["A", "B", "C", "D", "E"].iter().enumerate() {
        writeln!(f, "{u},{},0.5,1", i as f64 + 0.5).unwrap();
    }

    let table_path = dir.path().join("subregions.csv");
    let mut f = std::fs::File::create(&table_path).unwrap();
    writeln!(f, "unit,subregion").unwrap();
    writeln!(f, "A,west\nB,west\nC,west\nD,west\nE,east").unwrap();

    let matrix = read_distance_matrix(&matrix_path).unwrap();
    let lookup = read_geometries(&cells_path).unwrap();
    let table = read_subregions(&table_path).unwrap();

    let report = run_prepared_batch(
        split_by_subregion(&matrix, &table),
        &lookup,
        &RegionalizationParams::default(),
        ProcessingMode::Sequential,
    );

    let west = report.get("west").unwrap().as_ref().unwrap();
    assert_eq!(west.k(), 2);
    assert!(matches!(report.get("east"), Some(Err(Error::InsufficientData(_)))));
    assert_eq!(report.to_features().len(), 2);
}
