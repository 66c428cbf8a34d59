//! Feature-class storage and spatial operations for proximity-prep.
//!
//! This crate is the pipeline's geometry store: feature classes (a geometry
//! column paired with a columnar attribute table), directory-based
//! workspaces persisting each class as a GeoJSON feature collection, and
//! the spatial operations the pipeline composes:
//!
//! - **Predicates**: intersects / contains / within (exact, via the geo crate)
//! - **Interior points**: a representative point guaranteed to lie inside a
//!   polygon (not merely its bounding envelope)
//! - **Identity overlay**: polygon ∩ polygon fragment generation carrying
//!   combined attributes
//! - **Spatial join**: per-polygon point counting and point-level attribute
//!   attachment with an explicit multi-match tie-break
//!
//! # Modules
//!
//! - [`feature`]: `FeatureClass` and GeoJSON (de)serialization
//! - [`workspace`]: directory workspaces (read/write/delete/list layers)
//! - [`predicate`]: spatial predicate evaluation
//! - [`geom`]: geometry helpers (interior point, polygon coercion)
//! - [`overlay`]: identity overlay
//! - [`join`]: spatial joins and point counting
//! - [`error`]: error types

pub mod error;
pub mod feature;
pub mod geom;
pub mod join;
pub mod overlay;
pub mod predicate;
pub mod workspace;

pub use error::{Result, StoreError};
pub use feature::{FeatureClass, DEFAULT_WKID};
pub use geom::{interior_point, to_multi_polygon};
pub use join::{attach_by_location, count_contained_points, JoinTieBreak};
pub use overlay::identity_overlay;
pub use predicate::SpatialPredicate;
pub use workspace::Workspace;
