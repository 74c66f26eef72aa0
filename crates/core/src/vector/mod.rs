//! Spatial-unit geometry and exportable features
//!
//! Geometries are owned by the caller and reached through [`GeometryLookup`];
//! the clustering core only ever refers to spatial units by identifier.

use geo_types::{Geometry, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Source of geometries keyed by spatial-unit identifier.
pub trait GeometryLookup: Sync {
    /// Geometry for `unit`, or `None` if the collaborator has none.
    fn geometry(&self, unit: &str) -> Option<&Geometry<f64>>;
}

impl GeometryLookup for HashMap<String, Geometry<f64>> {
    fn geometry(&self, unit: &str) -> Option<&Geometry<f64>> {
        self.get(unit)
    }
}

impl GeometryLookup for BTreeMap<String, Geometry<f64>> {
    fn geometry(&self, unit: &str) -> Option<&Geometry<f64>> {
        self.get(unit)
    }
}

/// Square grid cell of edge `size` centred at `(x, y)`.
pub fn grid_cell(x: f64, y: f64, size: f64) -> Polygon<f64> {
    let h = size / 2.0;
    Polygon::new(
        LineString::from(vec![
            (x - h, y - h),
            (x + h, y - h),
            (x + h, y + h),
            (x - h, y + h),
            (x - h, y - h),
        ]),
        vec![],
    )
}

/// Point geometry at `(x, y)`.
pub fn site_point(x: f64, y: f64) -> Geometry<f64> {
    Geometry::Point(Point::new(x, y))
}

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    /// Optional feature ID
    pub id: Option<String>,
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes, kept sorted for stable output
    pub properties: BTreeMap<String, AttributeValue>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Collection of features
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}
