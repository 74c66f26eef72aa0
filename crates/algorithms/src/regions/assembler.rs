//! Turning a partition into colored, dissolved regions

use std::collections::BTreeMap;
use std::fmt;

use geo::{Area, Centroid};
use geo_types::{Geometry, Point};
use serde::{Deserialize, Serialize};

use crate::maybe_rayon::*;
use phyloreg_colormap::{region_color, RegionPalette, Rgb};
use phyloreg_core::{AttributeValue, Error, Feature, FeatureCollection, GeometryLookup, Partition};

use super::merge::merge_geometries;

/// Parameters for region assembly
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyParams {
    /// How labels are mapped to colors
    pub palette: RegionPalette,
}

/// One phyloregion: a cluster label with its members and merged geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    /// Cluster label from the partition (`1..=k`)
    pub label: usize,
    /// Members that have geometry, in partition order
    pub members: Vec<String>,
    /// Union of the member geometries
    pub geometry: Geometry<f64>,
    pub color: Rgb,
    /// Planar area of the merged geometry (0 for points)
    pub area: f64,
    pub centroid: Option<Point<f64>>,
}

impl Region {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Export as a feature with `region`, `members`, `color` and `area` properties.
    pub fn to_feature(&self) -> Feature {
        let mut feature = Feature::new(self.geometry.clone()).with_id(format!("region-{}", self.label));
        feature.set_property("region", AttributeValue::Int(self.label as i64));
        feature.set_property("members", AttributeValue::Int(self.member_count() as i64));
        feature.set_property("color", AttributeValue::String(self.color.to_hex()));
        feature.set_property("area", AttributeValue::Float(self.area));
        feature
    }
}

/// Problem recovered during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssemblyWarning {
    /// The unit had no geometry and was left out of its region
    MissingGeometry { unit: String, label: usize },
    /// No member of the label had geometry, so no region was built
    EmptyRegion { label: usize },
}

impl AssemblyWarning {
    /// The equivalent error, as reported when geometry is required.
    pub fn to_error(&self) -> Error {
        match self {
            Self::MissingGeometry { unit, .. } => Error::MissingGeometry(unit.clone()),
            Self::EmptyRegion { label } => Error::MissingGeometry(format!("every member of region {label}")),
        }
    }
}

impl fmt::Display for AssemblyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGeometry { unit, label } => {
                write!(f, "unit '{unit}' (region {label}) has no geometry and was skipped")
            }
            Self::EmptyRegion { label } => write!(f, "region {label} has no member geometry and was dropped"),
        }
    }
}

/// Regions plus the warnings raised while building them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assembly {
    /// Ordered by descending member count, then ascending label
    pub regions: Vec<Region>,
    pub warnings: Vec<AssemblyWarning>,
}

impl Assembly {
    /// All regions as exportable features, in region order.
    pub fn to_features(&self) -> FeatureCollection {
        self.regions.iter().map(Region::to_feature).collect()
    }
}

/// Build one region per partition label.
///
/// Units without geometry are skipped with a warning; assembly itself never
/// fails on missing geometry.
pub fn assemble<G>(partition: &Partition, lookup: &G, params: &AssemblyParams) -> Assembly
where
    G: GeometryLookup + ?Sized,
{
    let k = partition.k();
    let mut groups: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (unit, label) in partition.iter() {
        groups.entry(label).or_default().push(unit);
    }

    let palette = params.palette;
    let built: Vec<(Option<Region>, Vec<AssemblyWarning>)> = groups
        .into_iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(label, units)| build_region(label, &units, lookup, palette, k))
        .collect();

    let mut regions = Vec::with_capacity(built.len());
    let mut warnings = Vec::new();
    for (region, w) in built {
        for warning in &w {
            tracing::warn!("{warning}");
        }
        warnings.extend(w);
        regions.extend(region);
    }

    regions.sort_by(|a, b| b.member_count().cmp(&a.member_count()).then(a.label.cmp(&b.label)));
    tracing::debug!("Assembled {} regions ({} warnings)", regions.len(), warnings.len());

    Assembly { regions, warnings }
}

fn build_region<G>(
    label: usize,
    units: &[&str],
    lookup: &G,
    palette: RegionPalette,
    k: usize,
) -> (Option<Region>, Vec<AssemblyWarning>)
where
    G: GeometryLookup + ?Sized,
{
    let mut warnings = Vec::new();
    let mut members = Vec::with_capacity(units.len());
    let mut parts = Vec::with_capacity(units.len());

    for &unit in units {
        match lookup.geometry(unit) {
            Some(g) => {
                members.push(unit.to_string());
                parts.push(g);
            }
            None => warnings.push(AssemblyWarning::MissingGeometry {
                unit: unit.to_string(),
                label,
            }),
        }
    }

    if parts.is_empty() {
        warnings.push(AssemblyWarning::EmptyRegion { label });
        return (None, warnings);
    }

    let geometry = merge_geometries(parts);
    let area = geometry.unsigned_area();
    let centroid = geometry.centroid();
    let region = Region {
        label,
        members,
        geometry,
        color: region_color(palette, label - 1, k),
        area,
        centroid,
    };
    (Some(region), warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phyloreg_core::vector::grid_cell;
    use std::collections::HashMap;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn cells(names: &[&str]) -> HashMap<String, Geometry<f64>> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), Geometry::Polygon(grid_cell(i as f64 + 0.5, 0.5, 1.0))))
            .collect()
    }

    #[test]
    fn test_regions_ordered_by_size_then_label() {
        let p = Partition::new(ids(&["A", "B", "C", "D", "E"]), vec![1, 2, 2, 3, 3]).unwrap();
        let a = assemble(&p, &cells(&["A", "B", "C", "D", "E"]), &AssemblyParams::default());

        let order: Vec<usize> = a.regions.iter().map(|r| r.label).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert!(a.warnings.is_empty());
        assert_eq!(a.regions[0].members, ids(&["B", "C"]));
        // B and C are adjacent unit cells
        assert!((a.regions[0].area - 2.0).abs() < 1e-9);
        let c = a.regions[0].centroid.unwrap();
        assert!((c.x() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_geometry_is_a_warning() {
        let p = Partition::new(ids(&["A", "B", "C", "D"]), vec![1, 1, 2, 2]).unwrap();
        let a = assemble(&p, &cells(&["A", "B", "C"]), &AssemblyParams::default());

        assert_eq!(a.regions.len(), 2);
        let r2 = a.regions.iter().find(|r| r.label == 2).unwrap();
        assert_eq!(r2.member_count(), 1);
        assert_eq!(
            a.warnings,
            vec![AssemblyWarning::MissingGeometry { unit: "D".into(), label: 2 }]
        );
        assert!(matches!(a.warnings[0].to_error(), Error::MissingGeometry(u) if u == "D"));
    }

    #[test]
    fn test_region_without_geometry_dropped() {
        let p = Partition::new(ids(&["A", "B", "C"]), vec![1, 1, 2]).unwrap();
        let a = assemble(&p, &cells(&["A", "B"]), &AssemblyParams::default());
        assert_eq!(a.regions.len(), 1);
        assert_eq!(a.warnings.len(), 2);
        assert_eq!(a.warnings[1], AssemblyWarning::EmptyRegion { label: 2 });
    }

    #[test]
    fn test_colors_and_feature_export() {
        let p = Partition::new(ids(&["A", "B"]), vec![1, 2]).unwrap();
        let params = AssemblyParams { palette: RegionPalette::Hue };
        let a = assemble(&p, &cells(&["A", "B"]), &params);

        let r1 = a.regions.iter().find(|r| r.label == 1).unwrap();
        assert_eq!(r1.color, region_color(RegionPalette::Hue, 0, 2));

        let f = r1.to_feature();
        assert_eq!(f.id.as_deref(), Some("region-1"));
        assert_eq!(f.get_property("region"), Some(&AttributeValue::Int(1)));
        assert_eq!(f.get_property("members"), Some(&AttributeValue::Int(1)));
        assert_eq!(f.get_property("color"), Some(&AttributeValue::String(r1.color.to_hex())));
        assert_eq!(a.to_features().len(), 2);
    }
}
