//! Raw (unanalyzed) expression nodes.
//!
//! These are the shapes a parser hands to the analyzer. Every variant
//! carries the byte offset of the token that produced it so errors can point
//! back into the statement text. A raw tree may embed already-resolved
//! nodes (`RawExpr::Resolved`); the dispatcher passes those through
//! unchanged for a fixed allow-list of variants, which is what makes
//! re-analysis of a partially processed tree safe.

use serde::{Deserialize, Serialize};

use crate::catalog::subquery::SubqueryPayload;
use crate::expr::TypedExpr;

/// A possibly qualified type name with optional modifiers (`varchar(10)`,
/// `numeric(8,2)`) and array bounds (`int[]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeName {
    pub names: Vec<String>,
    pub modifiers: Vec<i32>,
    pub array_dims: usize,
    pub location: Option<usize>,
}

impl TypeName {
    pub fn simple(name: &str) -> Self {
        Self {
            names: vec![name.to_string()],
            modifiers: Vec::new(),
            array_dims: 0,
            location: None,
        }
    }

    pub fn with_modifiers(name: &str, modifiers: Vec<i32>) -> Self {
        Self {
            modifiers,
            ..Self::simple(name)
        }
    }
}

/// Literal constants as the lexer delivers them. Decimal-form numbers keep
/// their text so precision is not lost before a type is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawLiteral {
    Integer(i64),
    Decimal(String),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOpKind {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantifier {
    Any,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanTestKind {
    IsTrue,
    IsNotTrue,
    IsFalse,
    IsNotFalse,
    IsUnknown,
    IsNotUnknown,
}

/// One arm of a CASE expression. `not_distinct` marks decode-style arms
/// that match the operand with IS NOT DISTINCT FROM instead of `=`; it
/// requires the simple form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCaseWhen {
    pub condition: RawExpr,
    pub result: RawExpr,
    pub not_distinct: bool,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Default,
    Ascending,
    Descending,
}

/// An ORDER BY item attached to an ordered-set (percentile) aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub expr: RawExpr,
    pub direction: SortDirection,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PercentileKind {
    Median,
    Cont,
    Disc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubLinkKind {
    Exists,
    Any,
    All,
    RowCompare,
    Expr,
    Array,
}

/// One step of a postfix indirection chain (`expr.field`, `expr[i]`,
/// `expr[lo:hi]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndirectionItem {
    Field(String),
    Subscript(Box<RawExpr>),
    Slice {
        lower: Option<Box<RawExpr>>,
        upper: Option<Box<RawExpr>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XmlOp {
    Concat,
    Element,
    Forest,
    Parse,
    Pi,
    Root,
    IsDocument,
    /// Produced only by XMLSERIALIZE; never appears raw.
    Serialize,
}

/// Whether XML input parses as a whole document or as content fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XmlOption {
    Document,
    Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CursorRef {
    Name(String),
    Param(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawExpr {
    /// 1-4 dotted names, innermost-last: `col`, `rel.col`,
    /// `schema.rel.col`, `db.schema.rel.col`.
    ColumnRef {
        names: Vec<String>,
        location: Option<usize>,
    },
    /// `$n` positional parameter.
    Parameter {
        number: u32,
        location: Option<usize>,
    },
    /// Field selection or subscripting over an arbitrary expression.
    Indirection {
        arg: Box<RawExpr>,
        items: Vec<IndirectionItem>,
        location: Option<usize>,
    },
    Literal {
        value: RawLiteral,
        type_name: Option<TypeName>,
        location: Option<usize>,
    },
    TypeCast {
        arg: Box<RawExpr>,
        type_name: TypeName,
        location: Option<usize>,
    },
    /// Prefix operator application.
    Unary {
        op: String,
        arg: Box<RawExpr>,
        location: Option<usize>,
    },
    /// Infix operator application.
    Binary {
        op: String,
        left: Box<RawExpr>,
        right: Box<RawExpr>,
        location: Option<usize>,
    },
    /// `left op ANY/ALL (array-expression)`.
    AnyAll {
        op: String,
        quantifier: Quantifier,
        left: Box<RawExpr>,
        right: Box<RawExpr>,
        location: Option<usize>,
    },
    /// `left IS [NOT] DISTINCT FROM right`.
    Distinct {
        negated: bool,
        left: Box<RawExpr>,
        right: Box<RawExpr>,
        location: Option<usize>,
    },
    NullIf {
        left: Box<RawExpr>,
        right: Box<RawExpr>,
        location: Option<usize>,
    },
    /// `arg IS [NOT] OF (type, ...)`.
    IsOf {
        negated: bool,
        arg: Box<RawExpr>,
        types: Vec<TypeName>,
        location: Option<usize>,
    },
    /// `left [NOT] IN (expr, ...)`. IN with a subquery arrives as a
    /// `SubLink` instead.
    InList {
        negated: bool,
        left: Box<RawExpr>,
        items: Vec<RawExpr>,
        location: Option<usize>,
    },
    BoolOp {
        op: BoolOpKind,
        args: Vec<RawExpr>,
        location: Option<usize>,
    },
    FunctionCall {
        name: Vec<String>,
        args: Vec<RawExpr>,
        distinct: bool,
        star: bool,
        /// True when the call carries an OVER clause.
        over_window: bool,
        location: Option<usize>,
    },
    Case {
        operand: Option<Box<RawExpr>>,
        whens: Vec<RawCaseWhen>,
        default: Option<Box<RawExpr>>,
        location: Option<usize>,
    },
    ArrayConstructor {
        elements: Vec<RawExpr>,
        location: Option<usize>,
    },
    Row {
        elements: Vec<RawExpr>,
        location: Option<usize>,
    },
    Coalesce {
        args: Vec<RawExpr>,
        location: Option<usize>,
    },
    Greatest {
        args: Vec<RawExpr>,
        location: Option<usize>,
    },
    Least {
        args: Vec<RawExpr>,
        location: Option<usize>,
    },
    XmlConstruct {
        op: XmlOp,
        name: Option<String>,
        /// Attribute or forest entries with optional explicit names.
        named_args: Vec<(Option<String>, RawExpr)>,
        args: Vec<RawExpr>,
        xml_option: XmlOption,
        location: Option<usize>,
    },
    XmlSerialize {
        arg: Box<RawExpr>,
        type_name: TypeName,
        location: Option<usize>,
    },
    SubLink {
        kind: SubLinkKind,
        /// Left-hand test expression for quantified/row-compare links.
        test: Option<Box<RawExpr>>,
        operator: Option<String>,
        payload: SubqueryPayload,
        location: Option<usize>,
    },
    /// `TABLE(query)` value expression.
    TableValue {
        payload: SubqueryPayload,
        location: Option<usize>,
    },
    NullTest {
        negated: bool,
        arg: Box<RawExpr>,
        location: Option<usize>,
    },
    BooleanTest {
        kind: BooleanTestKind,
        arg: Box<RawExpr>,
        location: Option<usize>,
    },
    Grouping {
        args: Vec<RawExpr>,
        location: Option<usize>,
    },
    GroupId {
        location: Option<usize>,
    },
    Percentile {
        kind: PercentileKind,
        args: Vec<RawExpr>,
        sort: Vec<SortBy>,
        location: Option<usize>,
    },
    CurrentOf {
        cursor: CursorRef,
        location: Option<usize>,
    },
    /// DEFAULT placeholder, legal only where the caller substitutes one.
    SetDefault {
        location: Option<usize>,
    },
    /// Partition boundary specification; each member expression is analyzed
    /// in place.
    PartitionBound {
        start: Vec<RawExpr>,
        end: Vec<RawExpr>,
        every: Vec<RawExpr>,
        location: Option<usize>,
    },
    /// An already-resolved node embedded in a raw tree.
    Resolved(TypedExpr),
}

impl RawExpr {
    pub fn location(&self) -> Option<usize> {
        use RawExpr::*;
        match self {
            ColumnRef { location, .. }
            | Parameter { location, .. }
            | Indirection { location, .. }
            | Literal { location, .. }
            | TypeCast { location, .. }
            | Unary { location, .. }
            | Binary { location, .. }
            | AnyAll { location, .. }
            | Distinct { location, .. }
            | NullIf { location, .. }
            | IsOf { location, .. }
            | InList { location, .. }
            | BoolOp { location, .. }
            | FunctionCall { location, .. }
            | Case { location, .. }
            | ArrayConstructor { location, .. }
            | Row { location, .. }
            | Coalesce { location, .. }
            | Greatest { location, .. }
            | Least { location, .. }
            | XmlConstruct { location, .. }
            | XmlSerialize { location, .. }
            | SubLink { location, .. }
            | TableValue { location, .. }
            | NullTest { location, .. }
            | BooleanTest { location, .. }
            | Grouping { location, .. }
            | GroupId { location }
            | Percentile { location, .. }
            | CurrentOf { location, .. }
            | SetDefault { location }
            | PartitionBound { location, .. } => *location,
            Resolved(_) => None,
        }
    }

    /// Convenience constructors used heavily by callers and tests.
    pub fn column(names: &[&str]) -> Self {
        RawExpr::ColumnRef {
            names: names.iter().map(|s| s.to_string()).collect(),
            location: None,
        }
    }

    pub fn integer(v: i64) -> Self {
        RawExpr::Literal {
            value: RawLiteral::Integer(v),
            type_name: None,
            location: None,
        }
    }

    pub fn string(s: &str) -> Self {
        RawExpr::Literal {
            value: RawLiteral::String(s.to_string()),
            type_name: None,
            location: None,
        }
    }

    pub fn null() -> Self {
        RawExpr::Literal {
            value: RawLiteral::Null,
            type_name: None,
            location: None,
        }
    }

    pub fn binary(op: &str, left: RawExpr, right: RawExpr) -> Self {
        RawExpr::Binary {
            op: op.to_string(),
            left: Box::new(left),
            right: Box::new(right),
            location: None,
        }
    }
}
