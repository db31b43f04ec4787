//! Resolved, typed expression nodes.
//!
//! Every variant knows its result type without consulting a catalog or
//! performing further analysis; see [`typing`] for the total type and
//! type-modifier functions.

pub mod typing;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::subquery::AnalyzedQuery;
use crate::catalog::{OpSignature, Volatility};
use crate::parsing::ast::{
    BoolOpKind, BooleanTestKind, CursorRef, PercentileKind, SortDirection, SubLinkKind, XmlOp,
    XmlOption,
};
use crate::types::{DataType, Value};

/// How a resolved operator application behaves at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOpKind {
    /// Ordinary operator semantics.
    Plain,
    /// IS DISTINCT FROM: null-safe equality, always yields non-null boolean.
    Distinct,
    /// NULLIF: yields NULL when the equality holds, else the first argument.
    NullIf,
}

/// Distinguishes ordinary function calls from cast applications, so
/// length-coercion shapes can be recognized after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionForm {
    Call,
    ImplicitCast,
    ExplicitCast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamKind {
    /// `$n` from the client; deduced types live in the outermost parameter
    /// table.
    External { number: u32 },
    /// A placeholder for the n-th output column of a sublink's subquery
    /// (0-based over visible columns).
    SubqueryOutput { column: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedCaseWhen {
    pub condition: TypedExpr,
    pub result: TypedExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinMaxOp {
    Greatest,
    Least,
}

/// Row-comparison strategies, ordered; ties during interpretation
/// selection resolve to the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RowCompareStrategy {
    Less = 1,
    LessEqual = 2,
    Equal = 3,
    GreaterEqual = 4,
    Greater = 5,
    NotEqual = 6,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedExpr {
    /// A resolved column reference. `attr` of `None` is a whole-row
    /// reference. `levels_up` counts query nesting levels to the
    /// referenced range table.
    Column {
        rel: usize,
        attr: Option<u32>,
        levels_up: u32,
        ty: DataType,
        typmod: i32,
    },
    Constant {
        value: Value,
        ty: DataType,
        typmod: i32,
    },
    Parameter {
        kind: ParamKind,
        ty: DataType,
        typmod: i32,
    },
    Aggregate {
        name: String,
        args: Vec<TypedExpr>,
        distinct: bool,
        star: bool,
        /// True when the call carries an OVER clause (window application).
        over_window: bool,
        ty: DataType,
    },
    /// Array element or slice access. Plain subscripting yields the element
    /// type; slice access yields the array type itself.
    Subscript {
        array: Box<TypedExpr>,
        upper: Vec<TypedExpr>,
        lower: Vec<Option<TypedExpr>>,
        slice: bool,
        array_ty: DataType,
        elem_ty: DataType,
        typmod: i32,
    },
    Function {
        name: String,
        args: Vec<TypedExpr>,
        form: FunctionForm,
        returns_set: bool,
        volatility: Volatility,
        ty: DataType,
    },
    BinaryOp {
        kind: BinaryOpKind,
        op: OpSignature,
        args: Vec<TypedExpr>,
    },
    /// Scalar-vs-array quantified comparison (`x = ANY(arr)`).
    ScalarArrayOp {
        op: OpSignature,
        use_or: bool,
        args: Vec<TypedExpr>,
    },
    BoolExpr {
        op: BoolOpKind,
        args: Vec<TypedExpr>,
    },
    SubLink {
        kind: SubLinkKind,
        /// Combining expression over subquery-output parameters for
        /// quantified and row-compare links.
        test: Option<Box<TypedExpr>>,
        query: Arc<AnalyzedQuery>,
    },
    FieldSelect {
        arg: Box<TypedExpr>,
        field: u32,
        ty: DataType,
        typmod: i32,
    },
    FieldStore {
        arg: Box<TypedExpr>,
        newvals: Vec<(u32, TypedExpr)>,
        ty: DataType,
    },
    /// Binary-compatible cast: same representation, new type label.
    Relabel {
        arg: Box<TypedExpr>,
        ty: DataType,
        typmod: i32,
        form: FunctionForm,
    },
    /// Cast through the textual I/O representation.
    CoerceViaIo {
        arg: Box<TypedExpr>,
        ty: DataType,
        form: FunctionForm,
    },
    /// Element-wise array cast.
    ArrayCoerce {
        arg: Box<TypedExpr>,
        ty: DataType,
        typmod: i32,
        form: FunctionForm,
    },
    /// Cast between structurally compatible row types.
    ConvertRowtype {
        arg: Box<TypedExpr>,
        ty: DataType,
        form: FunctionForm,
    },
    Case {
        operand: Option<Box<TypedExpr>>,
        whens: Vec<TypedCaseWhen>,
        default: Box<TypedExpr>,
        ty: DataType,
    },
    /// Placeholder for the CASE operand inside rewritten WHEN conditions.
    CaseTest {
        ty: DataType,
        typmod: i32,
    },
    ArrayCtor {
        elements: Vec<TypedExpr>,
        elem_ty: DataType,
        multidim: bool,
        ty: DataType,
    },
    Row {
        elements: Vec<TypedExpr>,
        ty: DataType,
    },
    RowCompare {
        strategy: RowCompareStrategy,
        ops: Vec<OpSignature>,
        left: Vec<TypedExpr>,
        right: Vec<TypedExpr>,
    },
    Coalesce {
        args: Vec<TypedExpr>,
        ty: DataType,
    },
    MinMax {
        op: MinMaxOp,
        args: Vec<TypedExpr>,
        ty: DataType,
    },
    Xml {
        op: XmlOp,
        name: Option<String>,
        named_args: Vec<(String, TypedExpr)>,
        args: Vec<TypedExpr>,
        xml_option: XmlOption,
        ty: DataType,
        typmod: i32,
    },
    NullTest {
        negated: bool,
        arg: Box<TypedExpr>,
    },
    BooleanTest {
        kind: BooleanTestKind,
        arg: Box<TypedExpr>,
    },
    CoerceToDomain {
        arg: Box<TypedExpr>,
        ty: DataType,
        typmod: i32,
        form: FunctionForm,
    },
    /// Placeholder for VALUE inside a domain CHECK constraint.
    DomainValue {
        ty: DataType,
        typmod: i32,
    },
    SetToDefault {
        ty: DataType,
        typmod: i32,
    },
    CurrentOf {
        cursor: CursorRef,
        target_rel: usize,
    },
    Grouping {
        args: Vec<TypedExpr>,
    },
    GroupId,
    Percentile {
        kind: PercentileKind,
        args: Vec<TypedExpr>,
        sort_key: Box<TypedExpr>,
        direction: SortDirection,
        ty: DataType,
    },
    TableValue {
        query: Arc<AnalyzedQuery>,
    },
    PartitionBound {
        start: Vec<TypedExpr>,
        end: Vec<TypedExpr>,
        every: Vec<TypedExpr>,
    },
}

impl TypedExpr {
    pub fn constant(value: Value, ty: DataType) -> Self {
        TypedExpr::Constant {
            value,
            ty,
            typmod: crate::types::NO_TYPMOD,
        }
    }

    pub fn bool_constant(b: bool) -> Self {
        Self::constant(Value::Boolean(b), DataType::Bool)
    }

    /// A NULL constant of the given type.
    pub fn null_constant(ty: DataType) -> Self {
        Self::constant(Value::Null, ty)
    }

    pub fn is_null_constant(&self) -> bool {
        matches!(
            self,
            TypedExpr::Constant {
                value: Value::Null,
                ..
            }
        )
    }

    /// A short name for the variant, used in internal-consistency errors.
    pub fn node_kind(&self) -> &'static str {
        use TypedExpr::*;
        match self {
            Column { .. } => "Column",
            Constant { .. } => "Constant",
            Parameter { .. } => "Parameter",
            Aggregate { .. } => "Aggregate",
            Subscript { .. } => "Subscript",
            Function { .. } => "Function",
            BinaryOp { .. } => "BinaryOp",
            ScalarArrayOp { .. } => "ScalarArrayOp",
            BoolExpr { .. } => "BoolExpr",
            SubLink { .. } => "SubLink",
            FieldSelect { .. } => "FieldSelect",
            FieldStore { .. } => "FieldStore",
            Relabel { .. } => "Relabel",
            CoerceViaIo { .. } => "CoerceViaIo",
            ArrayCoerce { .. } => "ArrayCoerce",
            ConvertRowtype { .. } => "ConvertRowtype",
            Case { .. } => "Case",
            CaseTest { .. } => "CaseTest",
            ArrayCtor { .. } => "ArrayCtor",
            Row { .. } => "Row",
            RowCompare { .. } => "RowCompare",
            Coalesce { .. } => "Coalesce",
            MinMax { .. } => "MinMax",
            Xml { .. } => "Xml",
            NullTest { .. } => "NullTest",
            BooleanTest { .. } => "BooleanTest",
            CoerceToDomain { .. } => "CoerceToDomain",
            DomainValue { .. } => "DomainValue",
            SetToDefault { .. } => "SetToDefault",
            CurrentOf { .. } => "CurrentOf",
            Grouping { .. } => "Grouping",
            GroupId => "GroupId",
            Percentile { .. } => "Percentile",
            TableValue { .. } => "TableValue",
            PartitionBound { .. } => "PartitionBound",
        }
    }
}
