//! Identifier Propagator: resolve one site identifier per community.
//!
//! Overlay fragments a community polygon into one row per overlapping
//! site polygon, and multipart communities or sliver overlaps can put a
//! single community in several fragments carrying different identifiers.
//! The propagator pins row identity with a synthetic sequential key
//! before the overlay, ranks fragments by how many building points they
//! contain, and keeps exactly one identifier per original row.

use proxprep_store::{count_contained_points, identity_overlay, FeatureClass, SpatialPredicate};
use proxprep_tabular::{AttrTable, MergeKind};

use crate::error::{PrepError, Result};
use crate::scratch::ScratchWorkspace;

/// Synthetic row key carried through overlay and join. Assigned once per
/// propagator call; a prior run's values are overwritten, never reused.
pub const TEMP_ID: &str = "temp_id";

/// Per-fragment contained-point count attached by the spatial join.
pub const JOIN_COUNT: &str = "join_count";

/// Parameters for one propagation pass.
#[derive(Debug, Clone, Copy)]
pub struct PropagateSpec<'a> {
    /// Identifier field carried by the source layer.
    pub id_field: &'a str,
    /// Name the resolved identifier takes in the output.
    pub out_field: &'a str,
    /// Join key linking community rows across tables.
    pub link_field: &'a str,
    /// Scratch layer name for the overlay intermediate (the counted
    /// variant gets a `_2` suffix).
    pub scratch_name: &'a str,
    /// Predicate for the fragment/point counting join.
    pub predicate: SpatialPredicate,
    /// Join discipline for the final merge back onto the working table.
    pub merge_kind: MergeKind,
}

/// Resolve the best-matching source identifier for every target row and
/// merge it onto the working feature class under `spec.out_field`.
///
/// Guarantee: the merged mapping has at most one identifier per original
/// target row.
pub fn resolve_site_ids(
    target: &mut FeatureClass,
    source: &FeatureClass,
    buildings: &FeatureClass,
    working: &FeatureClass,
    scratch: &mut ScratchWorkspace,
    spec: &PropagateSpec<'_>,
) -> Result<FeatureClass> {
    // 1. Synthetic sequential key. Overlay output rows are fragments, so
    //    without this the original row could not be recovered afterwards.
    let keys: Vec<Option<i64>> = (1..=target.len() as i64).map(Some).collect();
    target.table_mut().put_i64_field(TEMP_ID, keys)?;

    // 2. Stale outputs of a prior run would shadow this one's.
    let counted_name = format!("{}_2", spec.scratch_name);
    scratch.delete_stale(spec.scratch_name)?;
    scratch.delete_stale(&counted_name)?;

    // 3. Identity overlay: one row per overlapping fragment, carrying the
    //    source attributes plus the synthetic key.
    let mut overlay = identity_overlay(target, source, spec.scratch_name)?;
    scratch.write_intermediate(&overlay)?;

    // 4. Keep only what the resolution needs.
    let keep = [TEMP_ID, spec.link_field, spec.id_field];
    let drop: Vec<String> = overlay
        .table()
        .schema()
        .names()
        .into_iter()
        .filter(|n| !keep.contains(&n.as_str()))
        .collect();
    let drop_refs: Vec<&str> = drop.iter().map(String::as_str).collect();
    overlay.table_mut().drop_fields(&drop_refs)?;

    // 5. Per-fragment contained-point counts.
    let counts = count_contained_points(&overlay, buildings, spec.predicate);
    overlay
        .table_mut()
        .put_i64_field(JOIN_COUNT, counts.into_iter().map(Some).collect())?;
    overlay.set_name(&counted_name);
    scratch.write_intermediate(&overlay)?;

    // 6. Tie-break: the fragment with the most points decides the
    //    identifier for all parts of its community.
    let mut resolved = overlay.table().keep_max_by(TEMP_ID, JOIN_COUNT)?;

    // 7. A missing identifier field here means the input schemas do not
    //    match expectations; fail with the columns we actually have.
    if !resolved.schema().contains(spec.id_field) {
        let columns = resolved.schema().names();
        tracing::error!(
            field = spec.id_field,
            columns = ?columns,
            "identifier field absent after overlay"
        );
        return Err(PrepError::SchemaFieldMissing {
            field: spec.id_field.to_string(),
            columns,
        });
    }
    resolved.rename_field(spec.id_field, spec.out_field)?;

    // 8. Merge the resolved identifier back onto the working rows.
    let mapping: AttrTable = resolved.project(&[spec.link_field, spec.out_field])?;
    let merged = working.merge(&mapping, spec.link_field, spec.merge_kind)?;

    tracing::info!(
        source = %source.name(),
        out_field = spec.out_field,
        resolved = mapping.num_rows(),
        communities = merged.len(),
        "site identifiers resolved"
    );
    Ok(merged)
}
