//! Error types for expression analysis.

use thiserror::Error;

/// Result type for all analysis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An analysis failure: a classified kind plus an optional source location
/// (byte offset into the original statement text, when the raw node carried
/// one).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}")]
pub struct Error {
    kind: ErrorKind,
    location: Option<usize>,
}

impl Error {
    pub fn new(kind: ErrorKind, location: Option<usize>) -> Self {
        Self { kind, location }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn location(&self) -> Option<usize> {
        self.location
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Attach a location if none was recorded yet. Locations from the
    /// innermost raw node win.
    pub fn at(mut self, location: Option<usize>) -> Self {
        if self.location.is_none() {
            self.location = location;
        }
        self
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind, None)
    }
}

/// Broad classification of analysis failures, mirroring SQLSTATE classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// References to columns, relations, or fields that do not resolve.
    UndefinedReference,
    /// Ambiguous references or overload resolution ties.
    Ambiguous,
    /// Parameter numbering or deduction problems.
    Parameter,
    /// Type mismatches and impossible coercions.
    Type,
    /// Malformed SQL reaching the analyzer.
    Syntax,
    /// Recognized but unsupported constructs.
    Unsupported,
    /// Resource exhaustion (expression depth).
    Resource,
    /// Internal-consistency failures; these indicate a bug upstream,
    /// not a user mistake.
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    // Column and relation references
    #[error("column \"{0}\" does not exist")]
    UndefinedColumn(String),
    #[error("column reference \"{0}\" is ambiguous")]
    AmbiguousColumn(String),
    #[error("missing FROM-clause entry for table \"{0}\"")]
    MissingFromEntry(String),
    #[error("cross-database references are not implemented: \"{0}\"")]
    CrossDatabaseReference(String),
    #[error("improper qualified name (too many dotted names): {0}")]
    ImproperQualifiedName(String),
    #[error("column \"{field}\" not found in data type {ty}")]
    UndefinedField { field: String, ty: String },
    #[error("column notation .{field} applied to type {ty}, which is not a composite type")]
    NotComposite { field: String, ty: String },

    // Parameters
    #[error("there is no parameter ${0}")]
    UndefinedParameter(u32),
    #[error("inconsistent types deduced for parameter ${number}: {first} versus {second}")]
    InconsistentParameterTypes {
        number: u32,
        first: String,
        second: String,
    },

    // Types and coercion
    #[error("type \"{0}\" does not exist")]
    UndefinedType(String),
    #[error("cannot cast type {from} to {to}")]
    CannotCast { from: String, to: String },
    #[error("argument of {construct} must be type boolean, not type {found}")]
    NotBoolean { construct: String, found: String },
    #[error("{context} could not convert type {from} to {to}")]
    CannotCoerce {
        context: String,
        from: String,
        to: String,
    },
    #[error("{context} types {left} and {right} cannot be matched")]
    TypesCannotBeMatched {
        context: String,
        left: String,
        right: String,
    },
    #[error("cannot determine type of empty array")]
    IndeterminateArrayType,
    #[error("could not find array type for data type {0}")]
    NoArrayType(String),
    #[error("cannot subscript type {0} because it is not an array")]
    NotAnArray(String),
    #[error("invalid input syntax for type {ty}: \"{text}\"")]
    InvalidLiteral { ty: String, text: String },

    // Operators and functions
    #[error("operator does not exist: {left} {op} {right}")]
    UndefinedOperator {
        op: String,
        left: String,
        right: String,
    },
    #[error("operator does not exist: {op} {operand}")]
    UndefinedUnaryOperator { op: String, operand: String },
    #[error("function {0} does not exist")]
    UndefinedFunction(String),
    #[error("function {0} is not unique")]
    AmbiguousFunction(String),
    #[error("{construct} requires = operator to yield type boolean")]
    ComparisonNotBoolean { construct: String },
    #[error("operator {0} must return type boolean")]
    OperatorNotBoolean(String),

    // Row comparison
    #[error("unequal number of entries in row expressions")]
    UnequalRowLengths,
    #[error("cannot compare rows of zero length")]
    ZeroLengthRowComparison,
    #[error("row comparison operator must yield type boolean, not type {0}")]
    RowComparisonNotBoolean(String),
    #[error("row comparison operator must not return a set")]
    RowComparisonReturnsSet,
    #[error("could not determine interpretation of row comparison operator {0}")]
    NoRowComparisonInterpretation(String),
    #[error("arguments of row IN must all be row expressions")]
    MixedRowIn,

    // Subqueries
    #[error("subquery must return a column")]
    SubqueryNoColumn,
    #[error("subquery must return only one column")]
    SubqueryTooManyColumns,
    #[error("subquery has too many columns")]
    SubqueryRowTooManyColumns,
    #[error("subquery has too few columns")]
    SubqueryRowTooFewColumns,
    #[error("subquery cannot have SELECT INTO")]
    SubqueryWithInto,
    #[error("subquery in TABLE value expression may not refer to relation of another query level")]
    CorrelatedTableValue,

    // CASE
    #[error("syntax error: NOT DISTINCT WHEN clause requires a CASE operand")]
    CaseDistinctWithoutOperand,

    // XML
    #[error("unnamed XML attribute value must be a column reference")]
    XmlUnnamedAttribute,
    #[error("XML attribute name \"{0}\" appears more than once")]
    XmlDuplicateAttribute(String),

    // Percentile (inverse distribution) functions
    #[error("percentile functions take exactly one ORDER BY expression")]
    PercentileSingleSortKey,
    #[error("argument of percentile function must not contain variables")]
    PercentileContainsColumns,
    #[error("argument of percentile function must not contain aggregates")]
    PercentileContainsAggregates,
    #[error("argument of percentile function must not contain window functions")]
    PercentileContainsWindowFunctions,
    #[error("argument of percentile function must not contain grouping operations")]
    PercentileContainsGrouping,
    #[error("argument of percentile function must not contain set-returning functions")]
    PercentileContainsSetReturning,
    #[error("argument of percentile function must not contain volatile functions")]
    PercentileContainsVolatile,
    #[error("argument of percentile function must not contain subqueries")]
    PercentileContainsSubqueries,

    // CURRENT OF
    #[error("CURRENT OF requires an update target relation in scope")]
    MissingCursorTarget,

    // Resource limits
    #[error("statement too complex: expression depth exceeds limit of {0}")]
    ExpressionTooComplex(usize),

    // General
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("{0} is not supported")]
    NotSupported(String),

    // Internal-consistency failures
    #[error("unrecognized node kind: {0}")]
    UnrecognizedNode(String),
    #[error("unexpected non-SELECT command in subquery")]
    UnexpectedSubqueryCommand,
}

impl ErrorKind {
    pub fn class(&self) -> ErrorClass {
        use ErrorKind::*;
        match self {
            UndefinedColumn(_) | MissingFromEntry(_) | UndefinedField { .. }
            | UndefinedType(_) | UndefinedOperator { .. } | UndefinedUnaryOperator { .. }
            | UndefinedFunction(_) => {
                ErrorClass::UndefinedReference
            }
            AmbiguousColumn(_) | AmbiguousFunction(_)
            | NoRowComparisonInterpretation(_) => ErrorClass::Ambiguous,
            UndefinedParameter(_) | InconsistentParameterTypes { .. } => ErrorClass::Parameter,
            CannotCast { .. } | NotBoolean { .. } | CannotCoerce { .. }
            | TypesCannotBeMatched { .. } | IndeterminateArrayType | NoArrayType(_)
            | NotAnArray(_) | InvalidLiteral { .. } | NotComposite { .. }
            | ComparisonNotBoolean { .. } | OperatorNotBoolean(_)
            | UnequalRowLengths | ZeroLengthRowComparison | RowComparisonNotBoolean(_)
            | RowComparisonReturnsSet | MixedRowIn | SubqueryRowTooManyColumns
            | SubqueryRowTooFewColumns => ErrorClass::Type,
            SubqueryNoColumn | SubqueryTooManyColumns | SubqueryWithInto
            | CaseDistinctWithoutOperand | XmlUnnamedAttribute | XmlDuplicateAttribute(_)
            | Syntax(_) | MissingCursorTarget => ErrorClass::Syntax,
            CrossDatabaseReference(_) | ImproperQualifiedName(_) | NotSupported(_)
            | PercentileSingleSortKey | PercentileContainsColumns
            | PercentileContainsAggregates | PercentileContainsWindowFunctions
            | PercentileContainsGrouping | PercentileContainsSetReturning
            | PercentileContainsVolatile | PercentileContainsSubqueries
            | CorrelatedTableValue => ErrorClass::Unsupported,
            ExpressionTooComplex(_) => ErrorClass::Resource,
            UnrecognizedNode(_) | UnexpectedSubqueryCommand => ErrorClass::Internal,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.class() == ErrorClass::Internal
    }

    pub fn at(self, location: Option<usize>) -> Error {
        Error::new(self, location)
    }
}
