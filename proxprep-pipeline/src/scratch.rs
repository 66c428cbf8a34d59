//! Scoped scratch workspace.
//!
//! Pipeline steps write intermediate layers (overlay fragments, counted
//! fragments, synthesized centroids, the augmented point copy) into the
//! scratch workspace. Tracked intermediates are deleted when the scope
//! ends unless the run asked to keep them; the final output layer is
//! written untracked, so it always survives cleanup.

use proxprep_store::{FeatureClass, Result as StoreResult, Workspace};

/// Scratch workspace with scoped intermediate-layer lifetime.
#[derive(Debug)]
pub struct ScratchWorkspace {
    workspace: Workspace,
    tracked: Vec<String>,
    keep_artifacts: bool,
}

impl ScratchWorkspace {
    /// Open the scratch workspace, creating the directory if absent.
    pub fn create(path: impl Into<std::path::PathBuf>, keep_artifacts: bool) -> StoreResult<Self> {
        Ok(Self {
            workspace: Workspace::create(path)?,
            tracked: Vec::new(),
            keep_artifacts,
        })
    }

    /// The underlying workspace.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Write an intermediate layer and track it for cleanup.
    pub fn write_intermediate(&mut self, fc: &FeatureClass) -> StoreResult<()> {
        self.workspace.write_layer(fc)?;
        let name = fc.name().to_string();
        if !self.tracked.contains(&name) {
            self.tracked.push(name);
        }
        Ok(())
    }

    /// Write the final output layer, untracked (survives cleanup),
    /// overwriting any prior output of the same name.
    pub fn write_output(&self, fc: &FeatureClass) -> StoreResult<()> {
        self.workspace.write_layer(fc)
    }

    /// Delete a stale layer from a prior run, if present. Used to make
    /// re-runs idempotent.
    pub fn delete_stale(&self, name: &str) -> StoreResult<bool> {
        let removed = self.workspace.delete_layer(name)?;
        if removed {
            tracing::info!(layer = name, "deleted stale scratch layer from prior run");
        }
        Ok(removed)
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if self.keep_artifacts {
            tracing::debug!(
                layers = ?self.tracked,
                "keeping scratch intermediates"
            );
            return;
        }
        for name in &self.tracked {
            if let Err(e) = self.workspace.delete_layer(name) {
                tracing::warn!(layer = %name, error = %e, "failed to delete scratch intermediate");
            }
        }
    }
}
