//! Run configuration and validation.

use std::path::{Path, PathBuf};

use proxprep_store::{JoinTieBreak, SpatialPredicate};
use proxprep_tabular::MergeKind;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Default community polygon layer name.
pub const DEFAULT_COMMUNITY_LAYER: &str = "INDIG_AUTOCH_A";
/// Default building point layer name.
pub const DEFAULT_BUILDING_LAYER: &str = "BUILDING_P";
/// Default output feature class name.
pub const DEFAULT_OUT_NAME: &str = "bld_p_processed";
/// Default spatial reference WKID.
pub const DEFAULT_WKID: i32 = 4326;
/// Join key linking community rows across tables.
pub const LINK_FIELD: &str = "PLACE_ID";
/// Identifier field carried by the primary site-definition layer.
pub const PD_SITE_FIELD: &str = "PD_Site_ID";
/// Identifier field carried by the advisory site-definition layer.
pub const ADV_SITE_FIELD: &str = "ADVPD_Site_ID";
/// Output field for the resolved primary identifier.
pub const PD_OUT_FIELD: &str = "AUTO_PD_SITE_ID";
/// Output field for the resolved advisory identifier.
pub const ADV_OUT_FIELD: &str = "AUTO_ADV_SITE_ID";
/// Identifier field in the canonical site registry.
pub const SITE_REGISTRY_FIELD: &str = "SITE_ID";

/// Configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Default workspace; must pre-exist and contain the community and
    /// building layers.
    pub default_workspace: PathBuf,

    /// Scratch workspace for intermediates and the final output; created
    /// on demand.
    pub scratch_workspace: PathBuf,

    /// Primary site-definition polygon layer (GeoJSON file).
    pub site_a_path: PathBuf,

    /// Advisory site-definition polygon layer (GeoJSON file).
    pub adv_pd_path: PathBuf,

    /// Canonical site-point registry layer (GeoJSON file).
    pub site_p_path: PathBuf,

    /// Community polygon layer name in the default workspace.
    pub community_layer: String,

    /// Building point layer name in the default workspace.
    pub building_layer: String,

    /// Output feature class name in the scratch workspace.
    pub out_name: String,

    /// Spatial reference WKID expected of all layers. Layers carrying a
    /// different WKID are reported, not reprojected.
    pub wkid: i32,

    /// Predicate for the final point/polygon join.
    pub predicate: SpatialPredicate,

    /// Join discipline when merging resolved identifiers back onto
    /// community rows.
    pub merge_kind: MergeKind,

    /// Tie-break when a building point matches several community polygons
    /// in the final join.
    pub join_tie_break: JoinTieBreak,

    /// Keep intermediate scratch layers after a successful run.
    pub keep_artifacts: bool,

    /// Directory for the dated log file.
    pub log_dir: PathBuf,
}

impl PrepConfig {
    /// Create a configuration with default names for the given data paths.
    pub fn new(
        default_workspace: impl Into<PathBuf>,
        scratch_workspace: impl Into<PathBuf>,
        site_a_path: impl Into<PathBuf>,
        adv_pd_path: impl Into<PathBuf>,
        site_p_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            default_workspace: default_workspace.into(),
            scratch_workspace: scratch_workspace.into(),
            site_a_path: site_a_path.into(),
            adv_pd_path: adv_pd_path.into(),
            site_p_path: site_p_path.into(),
            community_layer: DEFAULT_COMMUNITY_LAYER.to_string(),
            building_layer: DEFAULT_BUILDING_LAYER.to_string(),
            out_name: DEFAULT_OUT_NAME.to_string(),
            wkid: DEFAULT_WKID,
            predicate: SpatialPredicate::default(),
            merge_kind: MergeKind::default(),
            join_tie_break: JoinTieBreak::default(),
            keep_artifacts: false,
            log_dir: PathBuf::from("./logs"),
        }
    }

    /// Set the community layer name.
    pub fn with_community_layer(mut self, name: impl Into<String>) -> Self {
        self.community_layer = name.into();
        self
    }

    /// Set the building layer name.
    pub fn with_building_layer(mut self, name: impl Into<String>) -> Self {
        self.building_layer = name.into();
        self
    }

    /// Set the output feature class name.
    pub fn with_out_name(mut self, name: impl Into<String>) -> Self {
        self.out_name = name.into();
        self
    }

    /// Set the expected WKID.
    pub fn with_wkid(mut self, wkid: i32) -> Self {
        self.wkid = wkid;
        self
    }

    /// Keep intermediate scratch layers after the run.
    pub fn with_keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }

    /// Validate the configuration before any processing.
    ///
    /// Each violation is fatal and names the offending parameter.
    pub fn validate(&self) -> Result<()> {
        if !self.default_workspace.is_dir() {
            return Err(PrepError::validation(
                "default_workspace",
                format!(
                    "'{}' does not exist and must exist before processing begins",
                    self.default_workspace.display()
                ),
            ));
        }
        for (param, path) in [
            ("site_a_path", &self.site_a_path),
            ("adv_pd_path", &self.adv_pd_path),
            ("site_p_path", &self.site_p_path),
        ] {
            if !path.is_file() {
                return Err(PrepError::validation(
                    param,
                    format!(
                        "'{}' must be a valid link to the data and must exist before processing begins",
                        path.display()
                    ),
                ));
            }
        }
        for (param, value) in [
            ("community_layer", &self.community_layer),
            ("building_layer", &self.building_layer),
            ("out_name", &self.out_name),
        ] {
            if value.is_empty() {
                return Err(PrepError::validation(param, "must not be empty"));
            }
        }
        if self.wkid <= 0 {
            return Err(PrepError::validation(
                "wkid",
                format!("must be a positive WKID, got {}", self.wkid),
            ));
        }
        Ok(())
    }

    /// Path of the community layer file in the default workspace.
    pub fn community_path(&self) -> PathBuf {
        layer_file(&self.default_workspace, &self.community_layer)
    }

    /// Path of the building layer file in the default workspace.
    pub fn building_path(&self) -> PathBuf {
        layer_file(&self.default_workspace, &self.building_layer)
    }
}

fn layer_file(workspace: &Path, name: &str) -> PathBuf {
    workspace.join(format!("{name}.geojson"))
}
