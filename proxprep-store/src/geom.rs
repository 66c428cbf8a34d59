//! Geometry helpers shared by overlay and gap filling.

use geo::InteriorPoint;
use geo_types::{Geometry, MultiPolygon, Point};

use crate::error::{Result, StoreError};

/// A representative point guaranteed to lie inside the geometry's
/// boundary (not merely its bounding envelope). For concave polygons the
/// plain centroid can fall outside; this never does.
pub fn interior_point(geom: &Geometry<f64>) -> Result<Point<f64>> {
    geom.interior_point()
        .ok_or_else(|| StoreError::InvalidGeometry("no interior point (empty geometry)".into()))
}

/// Coerce a geometry to a multipolygon for overlay operations.
///
/// Polygons wrap into a single-part multipolygon; anything non-areal is an
/// error, since overlay input layers are polygon layers by contract.
pub fn to_multi_polygon(geom: &Geometry<f64>) -> Result<MultiPolygon<f64>> {
    match geom {
        Geometry::Polygon(p) => Ok(MultiPolygon(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Ok(mp.clone()),
        other => Err(StoreError::InvalidGeometry(format!(
            "expected polygonal geometry, got {}",
            geometry_kind(other)
        ))),
    }
}

fn geometry_kind(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
