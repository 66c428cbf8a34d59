//! Columnar attribute tables for proximity-prep.
//!
//! This crate provides the in-memory relational representation of feature
//! attribute tables that the pipeline components operate on. Tables are
//! columnar (typed `Vec` per field, not per-row) and name-keyed.
//!
//! # Design
//!
//! - **Columnar storage**: Data is stored in typed `Vec` per column
//! - **Strongly typed**: All column access is through the `Column` enum, no `dyn Any`
//! - **Name canonical**: Field names are the canonical identifier for columns
//! - **Relational ops**: project, rename, drop, hash merge (inner/left), and
//!   keep-max-per-key deduplication — the primitives the identifier
//!   resolution logic is built from

pub mod error;
pub mod table;

pub use error::{Result, TabularError};
pub use table::{AttrTable, Cell, Column, FieldInfo, FieldType, MergeKind, TableSchema};
