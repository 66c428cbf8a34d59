//! Pipeline orchestrator: the four preparation steps, end to end.

use proxprep_store::{FeatureClass, SpatialPredicate, Workspace};

use crate::check::missing_site_ids;
use crate::config::{
    PrepConfig, ADV_OUT_FIELD, ADV_SITE_FIELD, LINK_FIELD, PD_OUT_FIELD, PD_SITE_FIELD,
    SITE_REGISTRY_FIELD,
};
use crate::error::Result;
use crate::gap_fill::fill_missing_points;
use crate::materialize::join_and_materialize;
use crate::propagate::{resolve_site_ids, PropagateSpec};
use crate::scratch::ScratchWorkspace;

/// What a completed run produced, for callers that report or assert on
/// the outcome instead of re-reading the output layer.
#[derive(Debug, Clone)]
pub struct PrepReport {
    /// Community polygons processed.
    pub communities: usize,
    /// Building points synthesized for communities that had none.
    pub synthesized_points: usize,
    /// Resolved primary identifiers absent from the site registry.
    pub missing_primary: Vec<i64>,
    /// Resolved advisory identifiers absent from the site registry.
    pub missing_advisory: Vec<i64>,
    /// Rows in the materialized output layer.
    pub output_rows: usize,
}

/// A validated, ready-to-run pipeline.
#[derive(Debug)]
pub struct PrepRun {
    config: PrepConfig,
}

impl PrepRun {
    /// Validate the configuration up front so a run never fails halfway
    /// through on a bad path or an empty layer name.
    pub fn new(config: PrepConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Execute the full pipeline: synthesize missing building points,
    /// resolve primary and advisory site identifiers onto the community
    /// polygons, check them against the site registry, and join them
    /// onto the building points.
    pub fn run(&self) -> Result<PrepReport> {
        let cfg = &self.config;
        tracing::info!(
            workspace = %cfg.default_workspace.display(),
            output = %cfg.out_name,
            "starting data preparation"
        );

        let source = Workspace::open(&cfg.default_workspace)?;
        let mut scratch = ScratchWorkspace::create(&cfg.scratch_workspace, cfg.keep_artifacts)?;

        let mut communities = source.read_layer(&cfg.community_layer)?;
        let buildings = source.read_layer(&cfg.building_layer)?;
        check_wkid(&communities, cfg.wkid);
        check_wkid(&buildings, cfg.wkid);

        tracing::info!("step 1: synthesize building points for communities without any");
        let gap = fill_missing_points(&communities, &buildings, SpatialPredicate::Intersects)?;
        let mut buildings = gap.buildings;
        if gap.synthesized > 0 {
            scratch.write_intermediate(&gap.centroids)?;
            buildings.set_name(format!("{}_ap", cfg.building_layer));
            scratch.write_intermediate(&buildings)?;
        }

        tracing::info!("step 2: resolve primary and advisory site identifiers per community");
        let site_a = FeatureClass::read_path(&cfg.site_a_path)?;
        let adv_pd = FeatureClass::read_path(&cfg.adv_pd_path)?;
        check_wkid(&site_a, cfg.wkid);
        check_wkid(&adv_pd, cfg.wkid);

        let working = communities.clone();
        let working = resolve_site_ids(
            &mut communities,
            &site_a,
            &buildings,
            &working,
            &mut scratch,
            &PropagateSpec {
                id_field: PD_SITE_FIELD,
                out_field: PD_OUT_FIELD,
                link_field: LINK_FIELD,
                scratch_name: "scratch",
                predicate: SpatialPredicate::Intersects,
                merge_kind: cfg.merge_kind,
            },
        )?;
        let working = resolve_site_ids(
            &mut communities,
            &adv_pd,
            &buildings,
            &working,
            &mut scratch,
            &PropagateSpec {
                id_field: ADV_SITE_FIELD,
                out_field: ADV_OUT_FIELD,
                link_field: LINK_FIELD,
                scratch_name: "scratch_adv",
                predicate: SpatialPredicate::Intersects,
                merge_kind: cfg.merge_kind,
            },
        )?;

        tracing::info!("step 3: check resolved identifiers against the site registry");
        let registry = FeatureClass::read_path(&cfg.site_p_path)?;
        let primary: Vec<i64> = working
            .table()
            .i64_values(PD_OUT_FIELD)?
            .into_iter()
            .flatten()
            .collect();
        let advisory: Vec<i64> = working
            .table()
            .i64_values(ADV_OUT_FIELD)?
            .into_iter()
            .flatten()
            .collect();
        let missing_primary = missing_site_ids(&primary, &registry, SITE_REGISTRY_FIELD)?;
        let missing_advisory = missing_site_ids(&advisory, &registry, SITE_REGISTRY_FIELD)?;
        if missing_primary.is_empty() && missing_advisory.is_empty() {
            tracing::info!("all resolved identifiers exist in the site registry");
        } else {
            tracing::warn!(
                primary = ?missing_primary,
                advisory = ?missing_advisory,
                "resolved identifiers absent from the site registry"
            );
        }

        tracing::info!("step 4: join resolved identifiers onto the building points");
        let output = join_and_materialize(
            &buildings,
            &working,
            &[ADV_OUT_FIELD, PD_OUT_FIELD],
            &cfg.out_name,
            cfg.predicate,
            cfg.join_tie_break,
            &scratch,
        )?;

        tracing::info!(rows = output.len(), "data preparation complete");
        Ok(PrepReport {
            communities: communities.len(),
            synthesized_points: gap.synthesized,
            missing_primary,
            missing_advisory,
            output_rows: output.len(),
        })
    }
}

/// Layers in a different spatial reference are processed as-is; the
/// caller is told, not stopped.
fn check_wkid(fc: &FeatureClass, expected: i32) {
    if fc.wkid() != expected {
        tracing::warn!(
            layer = %fc.name(),
            found = fc.wkid(),
            expected,
            "layer spatial reference differs from configuration; no reprojection is applied"
        );
    }
}
