//! Error types for the preparation pipeline.

use thiserror::Error;

/// Pipeline errors.
///
/// Validation and schema errors abort the run before or without writing
/// the final output. Data-quality findings (identifiers missing from the
/// registry) are not errors; they are collected into the run report.
#[derive(Debug, Error)]
pub enum PrepError {
    /// Invalid input parameter, raised before any processing.
    #[error("parameter '{param}': {reason}")]
    Validation { param: String, reason: String },

    /// An expected identifier field is absent after overlay. Signals
    /// mismatched input schemas; the columns actually present are listed.
    #[error("field '{field}' absent after overlay; columns present: {columns:?}")]
    SchemaFieldMissing {
        field: String,
        columns: Vec<String>,
    },

    /// Centroid derivation failed for a community polygon.
    #[error("gap fill: {0}")]
    GapFill(String),

    /// Geometry store operation failed. Fatal, no retry, no rollback.
    #[error(transparent)]
    Store(#[from] proxprep_store::StoreError),

    /// Attribute table operation failed.
    #[error(transparent)]
    Tabular(#[from] proxprep_tabular::TabularError),

    /// Logging setup failed.
    #[error("telemetry: {0}")]
    Telemetry(String),
}

impl PrepError {
    /// Convenience constructor for validation failures.
    pub fn validation(param: impl Into<String>, reason: impl Into<String>) -> Self {
        PrepError::Validation {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PrepError>;
