//! Data preparation pipeline for proximity analysis.
//!
//! Prepares community polygons, building points and site-definition
//! polygons for a downstream proximity analysis. The pipeline runs four
//! steps, each fully materializing its output before the next begins:
//!
//! ```text
//! Gap Filler ──► Identifier Propagator (×2) ──► Consistency Checker ──► Join & Materialize
//! ```
//!
//! - **Gap Filler**: community polygons containing no building point get a
//!   synthesized interior point appended to a working copy of the point layer.
//! - **Identifier Propagator**: overlays communities with a site-definition
//!   layer, resolves fragment multiplicity by contained-point count, and
//!   maps each community to a single site identifier.
//! - **Consistency Checker**: reports resolved identifiers missing from the
//!   canonical site registry (warning only, never aborts).
//! - **Join & Materialize**: spatially joins both resolved identifiers onto
//!   every building point and persists the result to the scratch workspace.
//!
//! The pipeline is strictly single-threaded and synchronous; the scratch
//! workspace is a single-writer resource, so concurrent runs against the
//! same scratch directory must be serialized by the caller.
//!
//! # Modules
//!
//! - [`config`]: run configuration and validation
//! - [`gap_fill`]: the Gap Filler
//! - [`propagate`]: the Identifier Propagator
//! - [`check`]: the Consistency Checker
//! - [`materialize`]: the final join and output write
//! - [`pipeline`]: the orchestrator ([`PrepRun`])
//! - [`scratch`]: scoped scratch workspace
//! - [`telemetry`]: per-run logging setup
//! - [`error`]: error types

pub mod check;
pub mod config;
pub mod error;
pub mod gap_fill;
pub mod materialize;
pub mod pipeline;
pub mod propagate;
pub mod scratch;
pub mod telemetry;

pub use check::missing_site_ids;
pub use config::PrepConfig;
pub use error::{PrepError, Result};
pub use gap_fill::{fill_missing_points, GapFillOutcome};
pub use materialize::join_and_materialize;
pub use pipeline::{PrepReport, PrepRun};
pub use propagate::{resolve_site_ids, PropagateSpec};
pub use scratch::ScratchWorkspace;
pub use telemetry::{init_logging, LogGuard};
