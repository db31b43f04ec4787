//! Semantic analysis of SQL value expressions
//!
//! This crate turns raw (parsed but unanalyzed) expression trees into fully
//! typed ones:
//! - Resolves column, parameter, and field references against a namespace
//! - Resolves operator and function overloads and inserts coercions
//! - Rewrites composite constructs (CASE, IN lists, row comparisons,
//!   quantified sublinks) into their executable forms
//! - Deduces parameter types from use, sharing one table across all
//!   subquery levels
//!
//! Statement-level analysis (FROM clauses, target lists, set operations) is
//! out of scope; it plugs in through the [`catalog`] seams.

pub mod catalog;
pub mod error;
pub mod expr;
pub mod parsing;
pub mod semantic;
pub mod types;

pub use error::{Error, ErrorClass, ErrorKind, Result};
pub use expr::TypedExpr;
pub use parsing::ast::RawExpr;
pub use semantic::{AnalysisConfig, AnalysisContext, ParamTable};
pub use types::{DataType, Value};
