//! Error types for tabular operations.

use thiserror::Error;

/// Errors from attribute table operations.
#[derive(Debug, Error)]
pub enum TabularError {
    /// Schema or structural error (duplicate field, arity mismatch, etc.)
    #[error("schema error: {0}")]
    Schema(String),

    /// A named field is not present in the table.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// A value's type does not match the column it is pushed into.
    #[error("type mismatch in field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        got: &'static str,
    },
}

/// Result type for tabular operations.
pub type Result<T> = std::result::Result<T, TabularError>;
