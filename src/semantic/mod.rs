//! Expression analysis: the dispatcher and the per-family transformers.
//!
//! Everything enters through [`context::AnalysisContext::transform`], which
//! routes raw nodes to the transformers in this module's submodules and
//! produces fully typed expressions.

pub mod coercion;
mod columns;
mod composite;
pub mod context;
mod functions;
mod operators;
mod percentile;
mod rowcompare;
mod subquery;
mod transform;

pub use context::{AnalysisConfig, AnalysisContext, ParamTable};
