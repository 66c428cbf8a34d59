//! Error types for the geometry store.

use thiserror::Error;

/// Geometry store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error during layer read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// GeoJSON parse or conversion error.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Layer file format problem (mixed property types, bad wkid, etc.)
    #[error("layer format error: {0}")]
    Format(String),

    /// Named layer not found in the workspace.
    #[error("layer not found: {0}")]
    LayerNotFound(String),

    /// Workspace directory does not exist.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),

    /// Geometry unusable for the requested operation
    /// (e.g. a point layer passed to a polygon overlay).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Attribute table error.
    #[error("table error: {0}")]
    Tabular(#[from] proxprep_tabular::TabularError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
