//! Merging member geometries into one region geometry

use geo::BooleanOps;
use geo_types::{Geometry, GeometryCollection, MultiPoint, MultiPolygon, Point};

/// Merge `parts` into a single geometry.
///
/// Polygons are dissolved into one `MultiPolygon` by boolean union and points
/// are gathered into a `MultiPoint`. When both kinds (or any other kind) are
/// present the pieces are returned together as a `GeometryCollection`.
pub(crate) fn merge_geometries<'a, I>(parts: I) -> Geometry<f64>
where
    I: IntoIterator<Item = &'a Geometry<f64>>,
{
    let mut polygons = Vec::new();
    let mut points: Vec<Point<f64>> = Vec::new();
    let mut others = Vec::new();

    for g in parts {
        match g {
            Geometry::Polygon(p) => polygons.push(p.clone()),
            Geometry::MultiPolygon(mp) => polygons.extend(mp.0.iter().cloned()),
            Geometry::Rect(r) => polygons.push(r.to_polygon()),
            Geometry::Triangle(t) => polygons.push(t.to_polygon()),
            Geometry::Point(p) => points.push(*p),
            Geometry::MultiPoint(mp) => points.extend(mp.0.iter().copied()),
            other => others.push(other.clone()),
        }
    }

    let dissolved = if polygons.is_empty() {
        None
    } else {
        Some(dissolve(polygons))
    };
    let gathered = if points.is_empty() {
        None
    } else {
        Some(MultiPoint::new(points))
    };

    match (dissolved, gathered, others.is_empty()) {
        (Some(mp), None, true) => Geometry::MultiPolygon(mp),
        (None, Some(mp), true) => Geometry::MultiPoint(mp),
        (dissolved, gathered, _) => {
            let mut pieces = Vec::with_capacity(others.len() + 2);
            if let Some(mp) = dissolved {
                pieces.push(Geometry::MultiPolygon(mp));
            }
            if let Some(mp) = gathered {
                pieces.push(Geometry::MultiPoint(mp));
            }
            pieces.extend(others);
            Geometry::GeometryCollection(GeometryCollection(pieces))
        }
    }
}

/// Union of all polygons.
fn dissolve(polygons: Vec<geo_types::Polygon<f64>>) -> MultiPolygon<f64> {
    let mut iter = polygons.into_iter();
    let first = match iter.next() {
        Some(p) => MultiPolygon::new(vec![p]),
        None => return MultiPolygon::new(vec![]),
    };
    iter.fold(first, |acc, p| acc.union(&MultiPolygon::new(vec![p])))
}
