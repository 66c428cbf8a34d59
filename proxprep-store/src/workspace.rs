//! Directory-based workspaces.
//!
//! A workspace is a directory holding one GeoJSON file per feature class,
//! the geodatabase analog. Workspaces are a single-writer resource:
//! concurrent pipelines against the same directory must be serialized by
//! the caller.

use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::feature::FeatureClass;

/// File extension used for persisted layers.
const LAYER_EXT: &str = "geojson";

/// A directory of feature-class layers.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open an existing workspace. Fails if the directory does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        if !root.is_dir() {
            return Err(StoreError::WorkspaceNotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    /// Open a workspace, creating the directory if absent.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Workspace directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a named layer's file (whether or not it exists).
    pub fn layer_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{LAYER_EXT}"))
    }

    /// Whether a named layer exists.
    pub fn exists(&self, name: &str) -> bool {
        self.layer_path(name).is_file()
    }

    /// Read a named layer.
    pub fn read_layer(&self, name: &str) -> Result<FeatureClass> {
        let path = self.layer_path(name);
        if !path.is_file() {
            return Err(StoreError::LayerNotFound(name.to_string()));
        }
        let mut fc = FeatureClass::read_path(&path)?;
        fc.set_name(name);
        Ok(fc)
    }

    /// Write a layer under its own name, overwriting any existing layer.
    pub fn write_layer(&self, fc: &FeatureClass) -> Result<()> {
        fc.write_path(&self.layer_path(fc.name()))
    }

    /// Delete a named layer. Returns whether a layer was actually removed,
    /// so callers can delete stale outputs idempotently.
    pub fn delete_layer(&self, name: &str) -> Result<bool> {
        let path = self.layer_path(name);
        if !path.is_file() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    /// Names of all layers in the workspace, sorted.
    pub fn list_layers(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(LAYER_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
