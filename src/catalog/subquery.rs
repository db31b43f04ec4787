//! The subquery-analysis seam.
//!
//! Statement-level analysis lives outside this crate; sublinks and TABLE
//! value expressions hand their query payload to a [`SubqueryAnalyzer`] and
//! get back the analyzed output shape. A payload that has already been
//! analyzed is carried as such, and re-analysis is a no-op.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::types::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// One output column of an analyzed query. Junk columns (ordering keys and
/// the like) are invisible to expression sublinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputColumn {
    pub name: String,
    pub ty: DataType,
    pub typmod: i32,
    pub junk: bool,
}

impl OutputColumn {
    pub fn new(name: &str, ty: DataType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            typmod: crate::types::NO_TYPMOD,
            junk: false,
        }
    }
}

/// An unanalyzed subquery as the parser delivers it. The analyzer treats it
/// as opaque apart from handing it to the [`SubqueryAnalyzer`] seam; the
/// declared fields describe the query's own claims about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    pub command: CommandKind,
    pub has_into: bool,
    pub uses_outer_references: bool,
    pub columns: Vec<OutputColumn>,
}

impl RawQuery {
    pub fn select(columns: Vec<OutputColumn>) -> Self {
        Self {
            command: CommandKind::Select,
            has_into: false,
            uses_outer_references: false,
            columns,
        }
    }
}

/// The analyzed form of a subquery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedQuery {
    pub command: CommandKind,
    pub has_into: bool,
    pub uses_outer_references: bool,
    pub columns: Vec<OutputColumn>,
}

impl AnalyzedQuery {
    /// Output columns visible to expression context.
    pub fn visible_columns(&self) -> impl Iterator<Item = &OutputColumn> {
        self.columns.iter().filter(|c| !c.junk)
    }
}

/// A subquery payload inside an expression tree: raw until analyzed, then
/// permanently stamped with its analyzed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubqueryPayload {
    Raw(RawQuery),
    Analyzed(Arc<AnalyzedQuery>),
}

/// Analyzes raw subqueries on behalf of the expression analyzer.
pub trait SubqueryAnalyzer {
    fn analyze(&self, query: &RawQuery) -> Result<AnalyzedQuery>;
}

/// Trusts the raw query's declared output shape. Real statement analysis is
/// out of scope for this crate; callers embedding the analyzer in a full
/// front end supply their own implementation.
#[derive(Debug, Default)]
pub struct DeclaredSubqueryAnalyzer;

impl SubqueryAnalyzer for DeclaredSubqueryAnalyzer {
    fn analyze(&self, query: &RawQuery) -> Result<AnalyzedQuery> {
        Ok(AnalyzedQuery {
            command: query.command,
            has_into: query.has_into,
            uses_outer_references: query.uses_outer_references,
            columns: query.columns.clone(),
        })
    }
}
