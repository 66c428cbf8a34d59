//! Consistency Checker: report resolved identifiers absent from the
//! site registry. Read-only; nothing here mutates inputs or touches the
//! scratch workspace.

use proxprep_store::FeatureClass;
use rustc_hash::FxHashSet;

use crate::error::Result;

/// Return the identifiers from `resolved` that do not appear in the
/// registry layer's `site_field` column. Input order and duplicates are
/// preserved so the report mirrors the rows that produced them.
pub fn missing_site_ids(
    resolved: &[i64],
    registry: &FeatureClass,
    site_field: &str,
) -> Result<Vec<i64>> {
    let known: FxHashSet<i64> = registry
        .table()
        .i64_values(site_field)?
        .into_iter()
        .flatten()
        .collect();
    Ok(resolved
        .iter()
        .copied()
        .filter(|id| !known.contains(id))
        .collect())
}
