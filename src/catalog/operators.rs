//! Builtin operator resolution.
//!
//! Operators are synthesized over type families rather than enumerated:
//! comparison operators exist for every orderable family at the common type
//! of their operands, arithmetic over the numeric ladder, concatenation over
//! strings, and a small table of date/time arithmetic.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};
use crate::expr::RowCompareStrategy;
use crate::semantic::coercion::can_coerce_implicitly;
use crate::types::DataType;

use super::OpSignature;

/// Ordering families over which comparison operators are defined. Two
/// comparison operators can combine in a row comparison only when they share
/// a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingFamily {
    Boolean,
    Numeric,
    String,
    DateTime,
    Timespan,
    Bytea,
    Array,
}

/// One classification of a comparison operator: the family it belongs to
/// and the row-comparison strategy it implements there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BtreeInterpretation {
    pub family: OrderingFamily,
    pub strategy: RowCompareStrategy,
}

const COMPARISON_OPS: &[&str] = &["=", "<>", "<", "<=", ">", ">="];

/// The numeric widening ladder, least to most general.
const NUMERIC_LADDER: &[DataType] = &[
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Numeric,
    DataType::Float32,
    DataType::Float64,
];

fn ordering_family(ty: &DataType) -> Option<OrderingFamily> {
    match ty.base_type() {
        DataType::Bool => Some(OrderingFamily::Boolean),
        t if t.is_numeric() => Some(OrderingFamily::Numeric),
        DataType::Text | DataType::Varchar => Some(OrderingFamily::String),
        DataType::Date | DataType::Time | DataType::Timestamp | DataType::TimestampTz => {
            Some(OrderingFamily::DateTime)
        }
        DataType::Interval => Some(OrderingFamily::Timespan),
        DataType::Bytea => Some(OrderingFamily::Bytea),
        DataType::Array(elem) => ordering_family(elem).map(|_| OrderingFamily::Array),
        _ => None,
    }
}

/// Untyped operands adopt the other side's type; two untyped operands
/// compare as text.
fn settle_unknowns(left: &DataType, right: &DataType) -> (DataType, DataType) {
    match (left, right) {
        (DataType::Unknown, DataType::Unknown) => (DataType::Text, DataType::Text),
        (DataType::Unknown, r) => (r.clone(), r.clone()),
        (l, DataType::Unknown) => (l.clone(), l.clone()),
        (l, r) => (l.clone(), r.clone()),
    }
}

fn undefined(op: &str, left: &DataType, right: &DataType) -> crate::error::Error {
    ErrorKind::UndefinedOperator {
        op: op.to_string(),
        left: left.to_string(),
        right: right.to_string(),
    }
    .into()
}

pub fn resolve_binary(op: &str, left: &DataType, right: &DataType) -> Result<OpSignature> {
    let (l, r) = settle_unknowns(left.base_type(), right.base_type());

    if COMPARISON_OPS.contains(&op) {
        let common = if l == r {
            l
        } else if can_coerce_implicitly(&l, &r) {
            r
        } else if can_coerce_implicitly(&r, &l) {
            l
        } else {
            return Err(undefined(op, left, right));
        };
        if ordering_family(&common).is_none() {
            return Err(undefined(op, left, right));
        }
        return Ok(OpSignature {
            name: op.to_string(),
            operands: vec![common.clone(), common],
            result: DataType::Bool,
            returns_set: false,
        });
    }

    match op {
        "+" | "-" | "*" | "/" | "%" => {
            if let Some(sig) = datetime_arithmetic(op, &l, &r) {
                return Ok(sig);
            }
            if op == "%" {
                let exact = |t: &DataType| {
                    t.is_numeric() && !matches!(t, DataType::Float32 | DataType::Float64)
                };
                if !exact(&l) || !exact(&r) {
                    return Err(undefined(op, left, right));
                }
            }
            if l.is_numeric() && r.is_numeric() {
                let common = numeric_promote(&l, &r);
                return Ok(OpSignature {
                    name: op.to_string(),
                    operands: vec![common.clone(), common.clone()],
                    result: common,
                    returns_set: false,
                });
            }
            Err(undefined(op, left, right))
        }
        "||" => {
            let stringy = |t: &DataType| {
                matches!(t, DataType::Text | DataType::Varchar)
                    || can_coerce_implicitly(t, &DataType::Text)
            };
            if stringy(&l) && stringy(&r) {
                Ok(OpSignature {
                    name: "||".to_string(),
                    operands: vec![DataType::Text, DataType::Text],
                    result: DataType::Text,
                    returns_set: false,
                })
            } else {
                Err(undefined(op, left, right))
            }
        }
        _ => Err(undefined(op, left, right)),
    }
}

pub fn resolve_unary(op: &str, operand: &DataType) -> Result<OpSignature> {
    let t = match operand.base_type() {
        DataType::Unknown => DataType::Numeric,
        other => other.clone(),
    };
    match op {
        "-" | "+" if t.is_numeric() => Ok(OpSignature {
            name: op.to_string(),
            operands: vec![t.clone()],
            result: t,
            returns_set: false,
        }),
        "-" if t == DataType::Interval => Ok(OpSignature {
            name: "-".to_string(),
            operands: vec![DataType::Interval],
            result: DataType::Interval,
            returns_set: false,
        }),
        _ => Err(ErrorKind::UndefinedUnaryOperator {
            op: op.to_string(),
            operand: operand.to_string(),
        }
        .into()),
    }
}

/// Later rungs of the ladder absorb earlier ones.
fn numeric_promote(l: &DataType, r: &DataType) -> DataType {
    let rank = |t: &DataType| NUMERIC_LADDER.iter().position(|x| x == t).unwrap_or(0);
    if rank(l) >= rank(r) {
        l.clone()
    } else {
        r.clone()
    }
}

fn datetime_arithmetic(op: &str, l: &DataType, r: &DataType) -> Option<OpSignature> {
    use DataType::*;
    let result = match (op, l, r) {
        ("+", Date, Int32) | ("+", Int32, Date) | ("-", Date, Int32) => Date,
        ("-", Date, Date) => Int32,
        ("+", Date, Interval) | ("-", Date, Interval) => Timestamp,
        ("+", Timestamp, Interval) | ("-", Timestamp, Interval) => Timestamp,
        ("+", TimestampTz, Interval) | ("-", TimestampTz, Interval) => TimestampTz,
        ("-", Timestamp, Timestamp) | ("-", TimestampTz, TimestampTz) => Interval,
        ("+", Interval, Interval) | ("-", Interval, Interval) => Interval,
        ("+", Time, Interval) | ("-", Time, Interval) => Time,
        _ => return None,
    };
    Some(OpSignature {
        name: op.to_string(),
        operands: vec![l.clone(), r.clone()],
        result,
        returns_set: false,
    })
}

pub fn btree_interpretations(op: &OpSignature) -> Vec<BtreeInterpretation> {
    let strategy = match op.name.as_str() {
        "<" => RowCompareStrategy::Less,
        "<=" => RowCompareStrategy::LessEqual,
        "=" => RowCompareStrategy::Equal,
        ">=" => RowCompareStrategy::GreaterEqual,
        ">" => RowCompareStrategy::Greater,
        "<>" => RowCompareStrategy::NotEqual,
        _ => return Vec::new(),
    };
    match op.operands.first().and_then(ordering_family) {
        Some(family) => vec![BtreeInterpretation { family, strategy }],
        None => Vec::new(),
    }
}
