//! Join & Materialize: attach resolved identifiers from the community
//! polygons onto each building point and persist the result.

use proxprep_store::{attach_by_location, FeatureClass, JoinTieBreak, SpatialPredicate};

use crate::error::Result;
use crate::scratch::ScratchWorkspace;

/// Spatially join `fields` from `communities` onto `buildings`, name the
/// result `out_name`, and write it to the scratch workspace as a
/// persistent output (it survives scratch cleanup).
///
/// Points outside every community polygon are kept with null identifier
/// values.
pub fn join_and_materialize(
    buildings: &FeatureClass,
    communities: &FeatureClass,
    fields: &[&str],
    out_name: &str,
    predicate: SpatialPredicate,
    tie_break: JoinTieBreak,
    scratch: &ScratchWorkspace,
) -> Result<FeatureClass> {
    let mut joined = attach_by_location(buildings, communities, fields, predicate, tie_break)?;
    joined.set_name(out_name);
    scratch.write_output(&joined)?;
    tracing::info!(
        layer = out_name,
        rows = joined.len(),
        "output feature class written"
    );
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, polygon, Geometry};
    use proxprep_tabular::{Cell, FieldInfo, FieldType, TableSchema};

    fn fixture() -> (FeatureClass, FeatureClass) {
        let schema = TableSchema::new(vec![
            FieldInfo::new("AUTO_ADV_SITE_ID", FieldType::Int64),
            FieldInfo::new("AUTO_PD_SITE_ID", FieldType::Int64),
        ])
        .unwrap();
        let mut communities = FeatureClass::new("ia_a", 4326, schema);
        communities
            .push(
                Geometry::Polygon(polygon![
                    (x: 0.0, y: 0.0),
                    (x: 4.0, y: 0.0),
                    (x: 4.0, y: 4.0),
                    (x: 0.0, y: 4.0),
                    (x: 0.0, y: 0.0),
                ]),
                vec![Cell::I64(201), Cell::I64(101)],
            )
            .unwrap();

        let schema = TableSchema::new(vec![FieldInfo::new("BLD_ID", FieldType::Int64)]).unwrap();
        let mut buildings = FeatureClass::new("bld_p", 4326, schema);
        buildings
            .push(Geometry::Point(point!(x: 1.0, y: 1.0)), vec![Cell::I64(1)])
            .unwrap();
        buildings
            .push(Geometry::Point(point!(x: 9.0, y: 9.0)), vec![Cell::I64(2)])
            .unwrap();
        (buildings, communities)
    }

    #[test]
    fn test_writes_named_output_with_identifiers() {
        let (buildings, communities) = fixture();
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchWorkspace::create(dir.path(), false).unwrap();

        let out = join_and_materialize(
            &buildings,
            &communities,
            &["AUTO_ADV_SITE_ID", "AUTO_PD_SITE_ID"],
            "bld_p_processed",
            SpatialPredicate::Intersects,
            JoinTieBreak::FirstMatch,
            &scratch,
        )
        .unwrap();

        assert_eq!(out.name(), "bld_p_processed");
        assert_eq!(out.len(), 2);
        assert_eq!(
            out.table().column("AUTO_PD_SITE_ID").unwrap().get_i64(0),
            Some(101)
        );
        // The point outside every polygon keeps null identifiers.
        assert_eq!(
            out.table().column("AUTO_PD_SITE_ID").unwrap().get_i64(1),
            None
        );
        assert!(scratch.workspace().exists("bld_p_processed"));
    }

    #[test]
    fn test_output_survives_scratch_cleanup() {
        let (buildings, communities) = fixture();
        let dir = tempfile::tempdir().unwrap();
        {
            let scratch = ScratchWorkspace::create(dir.path(), false).unwrap();
            join_and_materialize(
                &buildings,
                &communities,
                &["AUTO_PD_SITE_ID"],
                "bld_p_processed",
                SpatialPredicate::Intersects,
                JoinTieBreak::FirstMatch,
                &scratch,
            )
            .unwrap();
        }
        assert!(dir.path().join("bld_p_processed.geojson").is_file());
    }
}
