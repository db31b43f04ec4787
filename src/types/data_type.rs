//! SQL data types and type modifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The "no modifier" type modifier. Length-bearing types (varchar, numeric)
/// use non-negative modifiers; everything else carries this.
pub const NO_TYPMOD: i32 = -1;

/// SQL data types known to the analyzer.
///
/// `Unknown` is the type of string and NULL literals before context assigns
/// them a real type. `Record` is the anonymous row type produced by ROW
/// constructors and by whole-row references to joins, subqueries, and VALUES
/// lists; `Composite` is the named row type of a base relation. `AnyTable`
/// is the pseudo-type of TABLE value expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Numeric,
    Text,
    Varchar,
    Bytea,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,
    Xml,
    RefCursor,
    Unknown,
    Record,
    Composite(String),
    Domain {
        name: String,
        base: Box<DataType>,
    },
    Array(Box<DataType>),
    AnyTable,
}

/// Type categories, used by common-type selection to decide when a later
/// input may take over as the resolution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Boolean,
    Numeric,
    String,
    DateTime,
    Timespan,
    Array,
    Composite,
    Xml,
    Unknown,
    Other,
}

impl TypeCategory {
    /// The preferred type of a category wins ties during common-type
    /// selection.
    pub fn preferred_type(self) -> Option<DataType> {
        match self {
            TypeCategory::Boolean => Some(DataType::Bool),
            TypeCategory::Numeric => Some(DataType::Float64),
            TypeCategory::String => Some(DataType::Text),
            TypeCategory::DateTime => Some(DataType::TimestampTz),
            TypeCategory::Timespan => Some(DataType::Interval),
            TypeCategory::Xml => Some(DataType::Xml),
            _ => None,
        }
    }
}

impl DataType {
    pub fn category(&self) -> TypeCategory {
        match self {
            DataType::Bool => TypeCategory::Boolean,
            DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::Float32
            | DataType::Float64
            | DataType::Numeric => TypeCategory::Numeric,
            DataType::Text | DataType::Varchar => TypeCategory::String,
            DataType::Date | DataType::Time | DataType::Timestamp | DataType::TimestampTz => {
                TypeCategory::DateTime
            }
            DataType::Interval => TypeCategory::Timespan,
            DataType::Xml => TypeCategory::Xml,
            DataType::Unknown => TypeCategory::Unknown,
            DataType::Record | DataType::Composite(_) => TypeCategory::Composite,
            DataType::Domain { base, .. } => base.category(),
            DataType::Array(_) => TypeCategory::Array,
            DataType::Bytea | DataType::RefCursor | DataType::AnyTable => TypeCategory::Other,
        }
    }

    /// Whether this type is the preferred type of its category.
    pub fn is_preferred(&self) -> bool {
        self.category().preferred_type().as_ref() == Some(self)
    }

    pub fn is_numeric(&self) -> bool {
        self.category() == TypeCategory::Numeric
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, DataType::Record | DataType::Composite(_))
    }

    /// Strip domains down to their base type.
    pub fn base_type(&self) -> &DataType {
        match self {
            DataType::Domain { base, .. } => base.base_type(),
            other => other,
        }
    }

    /// The array type over this element type, if one exists. Pseudo-types
    /// and row types have no array type. A multidimensional array shares
    /// its array type with its element.
    pub fn array_type_of(&self) -> Option<DataType> {
        match self {
            DataType::Unknown
            | DataType::Record
            | DataType::Composite(_)
            | DataType::RefCursor
            | DataType::AnyTable => None,
            DataType::Array(_) => Some(self.clone()),
            other => Some(DataType::Array(Box::new(other.clone()))),
        }
    }

    /// The element type of an array type, if this is one.
    pub fn element_type(&self) -> Option<&DataType> {
        match self.base_type() {
            DataType::Array(elem) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "boolean"),
            DataType::Int16 => write!(f, "smallint"),
            DataType::Int32 => write!(f, "integer"),
            DataType::Int64 => write!(f, "bigint"),
            DataType::Float32 => write!(f, "real"),
            DataType::Float64 => write!(f, "double precision"),
            DataType::Numeric => write!(f, "numeric"),
            DataType::Text => write!(f, "text"),
            DataType::Varchar => write!(f, "character varying"),
            DataType::Bytea => write!(f, "bytea"),
            DataType::Date => write!(f, "date"),
            DataType::Time => write!(f, "time"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::TimestampTz => write!(f, "timestamp with time zone"),
            DataType::Interval => write!(f, "interval"),
            DataType::Xml => write!(f, "xml"),
            DataType::RefCursor => write!(f, "refcursor"),
            DataType::Unknown => write!(f, "unknown"),
            DataType::Record => write!(f, "record"),
            DataType::Composite(name) => write!(f, "{name}"),
            DataType::Domain { name, .. } => write!(f, "{name}"),
            DataType::Array(elem) => write!(f, "{elem}[]"),
            DataType::AnyTable => write!(f, "anytable"),
        }
    }
}

/// Pack numeric precision and scale into a single modifier, the way
/// length-bearing casts carry them.
pub fn numeric_typmod(precision: u16, scale: u16) -> i32 {
    ((precision as i32) << 16) | (scale as i32 & 0xffff)
}

/// Unpack a numeric modifier into (precision, scale).
pub fn numeric_typmod_parts(typmod: i32) -> Option<(u16, u16)> {
    if typmod < 0 {
        return None;
    }
    Some(((typmod >> 16) as u16, (typmod & 0xffff) as u16))
}
