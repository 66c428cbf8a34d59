//! Spatial joins: point counting and attribute attachment.

use geo_types::Geometry;
use proxprep_tabular::{Cell, TabularError};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::feature::FeatureClass;
use crate::predicate::SpatialPredicate;

/// How a point matching several polygons picks its match.
///
/// `FirstMatch` mirrors the default behavior of conventional join engines
/// (first polygon in layer order wins). `MaxPointCount` applies the same
/// rule the identifier propagator uses for overlay fragments: the polygon
/// containing the most points wins, first occurrence breaking residual
/// ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinTieBreak {
    #[default]
    FirstMatch,
    MaxPointCount,
}

/// Count, per polygon feature, the points related to it under the
/// predicate (evaluated as "polygon *predicate* point").
pub fn count_contained_points(
    polygons: &FeatureClass,
    points: &FeatureClass,
    predicate: SpatialPredicate,
) -> Vec<i64> {
    polygons
        .geometries()
        .iter()
        .map(|poly| {
            points
                .geometries()
                .iter()
                .filter(|p| predicate.eval(poly, p))
                .count() as i64
        })
        .collect()
}

/// Spatially join polygon attributes onto points.
///
/// For every point, find the polygons satisfying "point *predicate*
/// polygon", pick one via the tie-break, and attach the named polygon
/// fields to the point. Points matching no polygon keep null in the
/// attached fields. The result is a copy of `points` with the extra
/// fields; an attached field whose name already exists on the point
/// layer is a schema error, so existing point attributes are never
/// altered.
pub fn attach_by_location(
    points: &FeatureClass,
    polygons: &FeatureClass,
    fields: &[&str],
    predicate: SpatialPredicate,
    tie_break: JoinTieBreak,
) -> Result<FeatureClass> {
    // Resolve field infos up front so a bad name fails before any work.
    let infos = fields
        .iter()
        .map(|&name| {
            polygons
                .table()
                .schema()
                .field(name)
                .cloned()
                .ok_or_else(|| TabularError::FieldNotFound(name.to_string()))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // A name collision would silently overwrite a point column.
    for info in &infos {
        if points.table().schema().contains(&info.name) {
            return Err(TabularError::Schema(format!(
                "attached field '{}' already exists on the point layer",
                info.name
            ))
            .into());
        }
    }

    // Point counts per polygon, only needed for the count-based tie-break.
    let counts = match tie_break {
        JoinTieBreak::MaxPointCount => Some(count_contained_points(
            polygons,
            points,
            SpatialPredicate::Intersects,
        )),
        JoinTieBreak::FirstMatch => None,
    };

    let winners: Vec<Option<usize>> = points
        .geometries()
        .iter()
        .map(|p| pick_match(p, polygons, predicate, tie_break, counts.as_deref()))
        .collect();

    let mut out = points.clone();
    for info in infos {
        let values: Vec<Cell> = winners
            .iter()
            .map(|w| match w {
                Some(poly_row) => polygons
                    .table()
                    .cell(*poly_row, &info.name)
                    .unwrap_or(Cell::Null),
                None => Cell::Null,
            })
            .collect();
        out.table_mut().put_field(info, values)?;
    }
    Ok(out)
}

fn pick_match(
    point: &Geometry<f64>,
    polygons: &FeatureClass,
    predicate: SpatialPredicate,
    tie_break: JoinTieBreak,
    counts: Option<&[i64]>,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (row, poly) in polygons.geometries().iter().enumerate() {
        if !predicate.eval(point, poly) {
            continue;
        }
        match tie_break {
            JoinTieBreak::FirstMatch => return Some(row),
            JoinTieBreak::MaxPointCount => {
                let counts = counts.expect("counts computed for MaxPointCount");
                // Strictly greater keeps the first occurrence on ties.
                if best.map_or(true, |b| counts[row] > counts[b]) {
                    best = Some(row);
                }
            }
        }
    }
    best
}
