//! Identity overlay of polygon layers.
//!
//! The overlay intersects every target feature with every source feature,
//! producing one output feature per overlapping fragment. Fragments carry
//! the target's attributes plus the source's, which is what lets an
//! identifier field propagate from source polygons down to target
//! fragments. Multipart targets and sliver overlaps mean one target row
//! can yield several fragments; resolving that multiplicity is the
//! caller's job (see the identifier propagator).

use geo::{BooleanOps, Intersects};
use geo_types::Geometry;
use proxprep_tabular::TableSchema;

use crate::error::Result;
use crate::feature::FeatureClass;
use crate::geom::to_multi_polygon;

/// Compute the identity overlay of two polygon layers.
///
/// Output schema: all target fields, then the source fields whose names do
/// not collide with a target field (collisions are skipped and logged).
/// Output features are multipolygon fragments in target order, source
/// order within each target.
pub fn identity_overlay(
    target: &FeatureClass,
    source: &FeatureClass,
    out_name: &str,
) -> Result<FeatureClass> {
    let mut fields = target.table().schema().fields().to_vec();
    let mut source_fields = Vec::new();
    for f in source.table().schema().fields() {
        if target.table().schema().contains(&f.name) {
            tracing::debug!(field = %f.name, "overlay: skipping colliding source field");
            continue;
        }
        fields.push(f.clone());
        source_fields.push(f.name.clone());
    }

    let mut out = FeatureClass::new(out_name, target.wkid(), TableSchema::new(fields)?);

    for t_row in 0..target.len() {
        let t_geom = &target.geometries()[t_row];
        let t_mp = to_multi_polygon(t_geom)?;

        for s_row in 0..source.len() {
            let s_geom = &source.geometries()[s_row];
            if !t_geom.intersects(s_geom) {
                continue;
            }
            let s_mp = to_multi_polygon(s_geom)?;
            let fragment = t_mp.intersection(&s_mp);
            if fragment.0.is_empty() {
                // Boundary-only contact; no areal fragment.
                continue;
            }

            let mut cells = target.table().row(t_row);
            for name in &source_fields {
                cells.push(
                    source
                        .table()
                        .cell(s_row, name)
                        .unwrap_or(proxprep_tabular::Cell::Null),
                );
            }
            out.push(Geometry::MultiPolygon(fragment), cells)?;
        }
    }

    tracing::debug!(
        target = %target.name(),
        source = %source.name(),
        fragments = out.len(),
        "identity overlay complete"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;
    use proxprep_tabular::{Cell, FieldInfo, FieldType};

    fn square(x: f64, y: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ])
    }

    fn polygon_class(name: &str, id_field: &str, squares: &[(f64, f64, f64, i64)]) -> FeatureClass {
        let schema =
            TableSchema::new(vec![FieldInfo::new(id_field, FieldType::Int64)]).unwrap();
        let mut fc = FeatureClass::new(name, 4326, schema);
        for &(x, y, size, id) in squares {
            fc.push(square(x, y, size), vec![Cell::I64(id)]).unwrap();
        }
        fc
    }

    #[test]
    fn test_overlay_produces_fragment_per_overlap() {
        // One target square straddling two source squares.
        let target = polygon_class("communities", "PLACE_ID", &[(0.0, 0.0, 4.0, 1)]);
        let source = polygon_class(
            "site_a",
            "PD_Site_ID",
            &[(0.0, 0.0, 2.0, 101), (2.0, 0.0, 2.0, 102), (10.0, 10.0, 1.0, 103)],
        );

        let out = identity_overlay(&target, &source, "scratch").unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.table().schema().contains("PLACE_ID"));
        assert!(out.table().schema().contains("PD_Site_ID"));
        assert_eq!(out.table().column("PLACE_ID").unwrap().get_i64(0), Some(1));
        let sites: Vec<_> = (0..2)
            .map(|i| out.table().column("PD_Site_ID").unwrap().get_i64(i))
            .collect();
        assert_eq!(sites, vec![Some(101), Some(102)]);
    }

    #[test]
    fn test_overlay_skips_disjoint_pairs() {
        let target = polygon_class("t", "PLACE_ID", &[(0.0, 0.0, 1.0, 1)]);
        let source = polygon_class("s", "PD_Site_ID", &[(5.0, 5.0, 1.0, 101)]);
        let out = identity_overlay(&target, &source, "scratch").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_overlay_rejects_point_layers() {
        use geo_types::point;
        let target = polygon_class("t", "PLACE_ID", &[(0.0, 0.0, 1.0, 1)]);
        let schema =
            TableSchema::new(vec![FieldInfo::new("PD_Site_ID", FieldType::Int64)]).unwrap();
        let mut source = FeatureClass::new("s", 4326, schema);
        source
            .push(Geometry::Point(point!(x: 0.5, y: 0.5)), vec![Cell::I64(1)])
            .unwrap();

        assert!(identity_overlay(&target, &source, "scratch").is_err());
    }
}
