//! Collaborator seams the analyzer consumes: type, operator, and function
//! lookup ([`Catalog`]), the statement's range-table view
//! ([`namespace::Namespace`]), and subquery analysis
//! ([`subquery::SubqueryAnalyzer`]).
//!
//! Shipped implementations ([`BuiltinCatalog`], [`namespace::SimpleNamespace`],
//! [`subquery::DeclaredSubqueryAnalyzer`]) make the crate usable standalone;
//! a full front end substitutes its own.

pub mod functions;
pub mod namespace;
pub mod operators;
pub mod subquery;

pub use functions::FunctionSignature;
pub use namespace::{ColumnHit, Namespace, RelationHit, RelationKind, SimpleNamespace};
pub use operators::{BtreeInterpretation, OrderingFamily};
pub use subquery::{
    AnalyzedQuery, DeclaredSubqueryAnalyzer, RawQuery, SubqueryAnalyzer, SubqueryPayload,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ErrorKind, Result};
use crate::parsing::ast::TypeName;
use crate::types::data_type::numeric_typmod;
use crate::types::{DataType, NO_TYPMOD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volatility {
    Immutable,
    Stable,
    Volatile,
}

/// A resolved operator: the operand types it was resolved at and its result
/// type. Comparison operators additionally classify into ordering families
/// through [`Catalog::btree_interpretations`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpSignature {
    pub name: String,
    pub operands: Vec<DataType>,
    pub result: DataType,
    /// Whether the implementing function returns a set. Builtin operators
    /// never do; custom catalogs may.
    pub returns_set: bool,
}

/// One column of a named composite (row) type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeColumn {
    pub name: String,
    pub ty: DataType,
    pub typmod: i32,
}

impl CompositeColumn {
    pub fn new(name: &str, ty: DataType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            typmod: NO_TYPMOD,
        }
    }
}

/// Type, operator, and function lookup.
pub trait Catalog {
    fn database_name(&self) -> &str;

    /// Resolve a type name to a concrete type plus the modifier its
    /// arguments encode (`varchar(10)`, `numeric(8,2)`).
    fn resolve_type(&self, name: &TypeName) -> Result<(DataType, i32)>;

    /// Best-match binary operator resolution.
    fn resolve_operator(&self, op: &str, left: &DataType, right: &DataType)
        -> Result<OpSignature>;

    /// Best-match prefix operator resolution.
    fn resolve_unary_operator(&self, op: &str, operand: &DataType) -> Result<OpSignature>;

    /// The ordering-family classifications of a resolved operator; empty
    /// when the operator is not a comparison.
    fn btree_interpretations(&self, op: &OpSignature) -> Vec<BtreeInterpretation>;

    /// Best-match function overload resolution.
    fn resolve_function(&self, name: &str, args: &[DataType]) -> Result<FunctionSignature>;

    /// The columns of a named composite type, if known.
    fn composite_columns(&self, name: &str) -> Option<Vec<CompositeColumn>>;
}

/// In-memory catalog with synthesized operator families, a small builtin
/// function table, and registries for composite and domain types.
#[derive(Debug, Default)]
pub struct BuiltinCatalog {
    database: String,
    composites: HashMap<String, Vec<CompositeColumn>>,
    domains: HashMap<String, DataType>,
    functions: HashMap<String, Vec<FunctionSignature>>,
}

impl BuiltinCatalog {
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            ..Self::default()
        }
    }

    pub fn register_composite(&mut self, name: &str, columns: Vec<CompositeColumn>) {
        self.composites.insert(name.to_string(), columns);
    }

    pub fn register_domain(&mut self, name: &str, base: DataType) {
        self.domains.insert(name.to_string(), base);
    }

    /// Registered overloads take precedence over the builtin table.
    pub fn register_function(&mut self, sig: FunctionSignature) {
        self.functions
            .entry(sig.name.to_ascii_lowercase())
            .or_default()
            .push(sig);
    }
}

impl Catalog for BuiltinCatalog {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn resolve_type(&self, name: &TypeName) -> Result<(DataType, i32)> {
        let simple = match name.names.last() {
            Some(n) => n.to_ascii_lowercase(),
            None => return Err(ErrorKind::UndefinedType(String::new()).into()),
        };
        let mods = &name.modifiers;
        let (ty, typmod) = match simple.as_str() {
            "bool" | "boolean" => (DataType::Bool, NO_TYPMOD),
            "int2" | "smallint" => (DataType::Int16, NO_TYPMOD),
            "int" | "int4" | "integer" => (DataType::Int32, NO_TYPMOD),
            "int8" | "bigint" => (DataType::Int64, NO_TYPMOD),
            "float4" | "real" => (DataType::Float32, NO_TYPMOD),
            "float8" | "double precision" => (DataType::Float64, NO_TYPMOD),
            "numeric" | "decimal" => {
                let typmod = match mods.as_slice() {
                    [] => NO_TYPMOD,
                    [p] => numeric_typmod(*p as u16, 0),
                    [p, s, ..] => numeric_typmod(*p as u16, *s as u16),
                };
                (DataType::Numeric, typmod)
            }
            "text" => (DataType::Text, NO_TYPMOD),
            "varchar" | "character varying" => {
                (DataType::Varchar, mods.first().copied().unwrap_or(NO_TYPMOD))
            }
            "bytea" => (DataType::Bytea, NO_TYPMOD),
            "date" => (DataType::Date, NO_TYPMOD),
            "time" => (DataType::Time, NO_TYPMOD),
            "timestamp" => (DataType::Timestamp, NO_TYPMOD),
            "timestamptz" | "timestamp with time zone" => (DataType::TimestampTz, NO_TYPMOD),
            "interval" => (DataType::Interval, NO_TYPMOD),
            "xml" => (DataType::Xml, NO_TYPMOD),
            "refcursor" => (DataType::RefCursor, NO_TYPMOD),
            "record" => (DataType::Record, NO_TYPMOD),
            other => {
                if self.composites.contains_key(other) {
                    (DataType::Composite(other.to_string()), NO_TYPMOD)
                } else if let Some(base) = self.domains.get(other) {
                    (
                        DataType::Domain {
                            name: other.to_string(),
                            base: Box::new(base.clone()),
                        },
                        NO_TYPMOD,
                    )
                } else {
                    return Err(
                        ErrorKind::UndefinedType(name.names.join(".")).at(name.location)
                    );
                }
            }
        };
        if name.array_dims > 0 {
            let array = ty
                .array_type_of()
                .ok_or_else(|| ErrorKind::NoArrayType(ty.to_string()).at(name.location))?;
            Ok((array, typmod))
        } else {
            Ok((ty, typmod))
        }
    }

    fn resolve_operator(
        &self,
        op: &str,
        left: &DataType,
        right: &DataType,
    ) -> Result<OpSignature> {
        operators::resolve_binary(op, left, right)
    }

    fn resolve_unary_operator(&self, op: &str, operand: &DataType) -> Result<OpSignature> {
        operators::resolve_unary(op, operand)
    }

    fn btree_interpretations(&self, op: &OpSignature) -> Vec<BtreeInterpretation> {
        operators::btree_interpretations(op)
    }

    fn resolve_function(&self, name: &str, args: &[DataType]) -> Result<FunctionSignature> {
        if let Some(overloads) = self.functions.get(&name.to_ascii_lowercase()) {
            let candidate_args: Vec<&[DataType]> =
                overloads.iter().map(|f| f.arg_types.as_slice()).collect();
            match functions::match_candidates(args, &candidate_args) {
                functions::CandidateMatch::Exact(i) | functions::CandidateMatch::Unique(i) => {
                    return Ok(overloads[i].clone())
                }
                functions::CandidateMatch::Ambiguous => {
                    return Err(ErrorKind::AmbiguousFunction(functions::format_signature(
                        name, args,
                    ))
                    .into())
                }
                functions::CandidateMatch::None => {}
            }
        }
        functions::resolve(name, args)
    }

    fn composite_columns(&self, name: &str) -> Option<Vec<CompositeColumn>> {
        self.composites.get(name).cloned()
    }
}
