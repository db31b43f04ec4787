//! Raw parse-tree representation consumed by the analyzer.

pub mod ast;

pub use ast::{RawExpr, RawLiteral, TypeName};
