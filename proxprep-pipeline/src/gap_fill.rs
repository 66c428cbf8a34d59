//! Gap Filler: synthesize points for communities that have none.
//!
//! Some community polygons have no associated building point, which would
//! leave them invisible to the downstream proximity analysis. For each
//! such polygon a representative interior point is synthesized and
//! appended to a working copy of the building layer. Existing building
//! points are never altered.

use geo_types::Geometry;
use proxprep_store::{interior_point, FeatureClass, SpatialPredicate};
use proxprep_tabular::Cell;

use crate::error::{PrepError, Result};

/// Result of a gap-fill pass.
#[derive(Debug)]
pub struct GapFillOutcome {
    /// Working copy of the building layer with synthesized points
    /// appended. Identical to the input when nothing was synthesized.
    pub buildings: FeatureClass,

    /// Number of community polygons that had no point.
    pub synthesized: usize,

    /// The synthesized points as their own layer (for the scratch
    /// workspace's centroid artifact). Empty when nothing was synthesized.
    pub centroids: FeatureClass,
}

/// Find community polygons with zero related building points and append a
/// synthesized interior point per such polygon to a copy of the building
/// layer.
///
/// The synthesized rows carry null in every building attribute, matching
/// a schema-less append. Interior-point derivation failure is fatal.
pub fn fill_missing_points(
    communities: &FeatureClass,
    buildings: &FeatureClass,
    predicate: SpatialPredicate,
) -> Result<GapFillOutcome> {
    let mut centroids = FeatureClass::new(
        "ia_centroids",
        communities.wkid(),
        buildings.table().schema().clone(),
    );

    for (row, poly) in communities.geometries().iter().enumerate() {
        let has_point = buildings
            .geometries()
            .iter()
            .any(|p| predicate.eval(poly, p));
        if has_point {
            continue;
        }
        let point = interior_point(poly).map_err(|e| {
            PrepError::GapFill(format!("community row {row}: {e}"))
        })?;
        let nulls = vec![Cell::Null; buildings.table().schema().num_fields()];
        centroids.push(Geometry::Point(point), nulls)?;
    }

    let synthesized = centroids.len();
    tracing::info!(
        count = synthesized,
        "community polygons with no building point"
    );

    let mut buildings = buildings.clone();
    if synthesized > 0 {
        for row in 0..centroids.len() {
            buildings.push(
                centroids.geometries()[row].clone(),
                centroids.table().row(row),
            )?;
        }
    }

    Ok(GapFillOutcome {
        buildings,
        synthesized,
        centroids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Contains;
    use geo_types::{point, polygon};
    use proxprep_tabular::{FieldInfo, FieldType, TableSchema};

    fn square(x: f64, y: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ])
    }

    fn communities(squares: &[(f64, f64)]) -> FeatureClass {
        let schema =
            TableSchema::new(vec![FieldInfo::new("PLACE_ID", FieldType::Int64)]).unwrap();
        let mut fc = FeatureClass::new("ia_a", 4326, schema);
        for (i, &(x, y)) in squares.iter().enumerate() {
            fc.push(square(x, y, 2.0), vec![Cell::I64(i as i64)])
                .unwrap();
        }
        fc
    }

    fn buildings(coords: &[(f64, f64)]) -> FeatureClass {
        let schema = TableSchema::new(vec![FieldInfo::new("bid", FieldType::Int64)]).unwrap();
        let mut fc = FeatureClass::new("bld_p", 4326, schema);
        for (i, &(x, y)) in coords.iter().enumerate() {
            fc.push(Geometry::Point(point!(x: x, y: y)), vec![Cell::I64(i as i64)])
                .unwrap();
        }
        fc
    }

    #[test]
    fn test_adds_one_point_per_empty_polygon() {
        // Three polygons; only the first has a point.
        let comms = communities(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0)]);
        let blds = buildings(&[(1.0, 1.0)]);

        let out = fill_missing_points(&comms, &blds, SpatialPredicate::Intersects).unwrap();
        assert_eq!(out.synthesized, 2);
        assert_eq!(out.buildings.len(), blds.len() + 2);

        // Each synthesized point lies inside its source polygon.
        for (i, poly_row) in [1usize, 2].iter().enumerate() {
            let Some(Geometry::Point(p)) = out.buildings.geometry(blds.len() + i) else {
                panic!("expected point");
            };
            let Some(Geometry::Polygon(poly)) = comms.geometry(*poly_row) else {
                panic!("expected polygon");
            };
            assert!(poly.contains(p));
        }
    }

    #[test]
    fn test_existing_points_untouched() {
        let comms = communities(&[(0.0, 0.0), (10.0, 10.0)]);
        let blds = buildings(&[(1.0, 1.0), (1.5, 0.5)]);

        let out = fill_missing_points(&comms, &blds, SpatialPredicate::Intersects).unwrap();
        assert_eq!(out.synthesized, 1);
        for row in 0..blds.len() {
            assert_eq!(out.buildings.geometry(row), blds.geometry(row));
            assert_eq!(
                out.buildings.table().column("bid").unwrap().get_i64(row),
                Some(row as i64)
            );
        }
        // Synthesized rows carry nulls.
        assert_eq!(out.buildings.table().column("bid").unwrap().get_i64(2), None);
    }

    #[test]
    fn test_no_gap_leaves_layer_unchanged() {
        let comms = communities(&[(0.0, 0.0)]);
        let blds = buildings(&[(1.0, 1.0)]);

        let out = fill_missing_points(&comms, &blds, SpatialPredicate::Intersects).unwrap();
        assert_eq!(out.synthesized, 0);
        assert_eq!(out.buildings.len(), blds.len());
        assert!(out.centroids.is_empty());
    }
}
