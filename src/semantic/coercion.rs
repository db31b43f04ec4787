//! Type coercion: deciding which conversions are legal and materializing
//! them as resolved nodes.
//!
//! A coercion of an expression that already has the target type and
//! modifier returns the expression untouched, which is what keeps repeated
//! analysis of the same tree stable.

use crate::catalog::Volatility;
use crate::error::{Error, ErrorKind, Result};
use crate::expr::{FunctionForm, ParamKind, TypedExpr};
use crate::types::{DataType, TypeCategory, Value, NO_TYPMOD};

use super::context::AnalysisContext;

const NUMERIC_LADDER: &[DataType] = &[
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Numeric,
    DataType::Float32,
    DataType::Float64,
];

fn ladder_rank(ty: &DataType) -> Option<usize> {
    NUMERIC_LADDER.iter().position(|t| t == ty)
}

/// Whether `from` converts to `to` without the user writing a cast.
pub fn can_coerce_implicitly(from: &DataType, to: &DataType) -> bool {
    if from == to {
        return true;
    }
    if *from == DataType::Unknown {
        return true;
    }
    // domains borrow their base type's casts
    if let DataType::Domain { base, .. } = from {
        return can_coerce_implicitly(base, to);
    }
    if let DataType::Domain { base, .. } = to {
        return can_coerce_implicitly(from, base);
    }
    match (from, to) {
        (DataType::Array(f), DataType::Array(t)) => can_coerce_implicitly(f, t),
        (DataType::Varchar, DataType::Text) | (DataType::Text, DataType::Varchar) => true,
        (DataType::Date, DataType::Timestamp)
        | (DataType::Date, DataType::TimestampTz)
        | (DataType::Timestamp, DataType::TimestampTz) => true,
        _ => match (ladder_rank(from), ladder_rank(to)) {
            (Some(f), Some(t)) => f < t,
            _ => false,
        },
    }
}

/// Same bits, different label.
fn is_binary_compatible(from: &DataType, to: &DataType) -> bool {
    matches!(
        (from.base_type(), to.base_type()),
        (DataType::Varchar, DataType::Text)
            | (DataType::Text, DataType::Varchar)
            | (DataType::Xml, DataType::Text)
    )
}

/// The function name a cast to `target` applies.
fn cast_function_name(target: &DataType) -> String {
    match target {
        DataType::Bool => "bool".into(),
        DataType::Int16 => "int2".into(),
        DataType::Int32 => "int4".into(),
        DataType::Int64 => "int8".into(),
        DataType::Float32 => "float4".into(),
        DataType::Float64 => "float8".into(),
        DataType::Numeric => "numeric".into(),
        DataType::Text => "text".into(),
        DataType::Varchar => "varchar".into(),
        DataType::Date => "date".into(),
        DataType::Time => "time".into(),
        DataType::Timestamp => "timestamp".into(),
        DataType::TimestampTz => "timestamptz".into(),
        DataType::Interval => "interval".into(),
        other => other.to_string(),
    }
}

fn cannot_cast(from: &DataType, to: &DataType, location: Option<usize>) -> Error {
    ErrorKind::CannotCast {
        from: from.to_string(),
        to: to.to_string(),
    }
    .at(location)
}

/// Coerce `expr` to `target` (with optional modifier), implicitly or as an
/// explicit cast. Explicit casts additionally allow downcasts within a
/// category and conversion through the textual representation.
pub fn coerce_to_target_type(
    ctx: &mut AnalysisContext,
    expr: TypedExpr,
    target: &DataType,
    typmod: i32,
    explicit: bool,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let from = expr.data_type();
    let form = if explicit {
        FunctionForm::ExplicitCast
    } else {
        FunctionForm::ImplicitCast
    };

    if &from == target {
        if typmod < 0 || typmod == expr.type_modifier() {
            return Ok(expr);
        }
        // same type, new modifier: apply a length coercion
        return Ok(length_cast(expr, target, typmod, form));
    }

    // untyped literals take the target type directly
    if from == DataType::Unknown {
        if let TypedExpr::Constant { value, .. } = &expr {
            let coerced = match value {
                Value::Null => Value::Null,
                Value::String(text) => {
                    Value::parse_as(target, text).map_err(|k| k.at(location))?
                }
                other => other.clone(),
            };
            return Ok(TypedExpr::Constant {
                value: coerced,
                ty: target.clone(),
                typmod,
            });
        }
        if let TypedExpr::Parameter {
            kind: ParamKind::External { number },
            ..
        } = &expr
        {
            ctx.refine_param(*number, target)
                .map_err(|e| e.at(location))?;
            return Ok(TypedExpr::Parameter {
                kind: ParamKind::External { number: *number },
                ty: target.clone(),
                typmod,
            });
        }
    }

    if let DataType::Domain { base, .. } = target {
        let base = base.as_ref().clone();
        let inner = coerce_to_target_type(ctx, expr, &base, NO_TYPMOD, explicit, location)?;
        return Ok(TypedExpr::CoerceToDomain {
            arg: Box::new(inner),
            ty: target.clone(),
            typmod,
            form,
        });
    }

    if is_binary_compatible(&from, target) {
        return Ok(TypedExpr::Relabel {
            arg: Box::new(expr),
            ty: target.clone(),
            typmod,
            form,
        });
    }

    if let (DataType::Array(f), DataType::Array(t)) = (&from, target) {
        let elem_ok = can_coerce_implicitly(f, t)
            || (explicit && (can_coerce_implicitly(t, f) || (f.is_numeric() && t.is_numeric())));
        if elem_ok {
            return Ok(TypedExpr::ArrayCoerce {
                arg: Box::new(expr),
                ty: target.clone(),
                typmod,
                form,
            });
        }
        return Err(cannot_cast(&from, target, location));
    }

    if explicit && from.is_composite() && target.is_composite() {
        return Ok(TypedExpr::ConvertRowtype {
            arg: Box::new(expr),
            ty: target.clone(),
            form,
        });
    }

    let castable = can_coerce_implicitly(&from, target)
        || (explicit
            && (can_coerce_implicitly(target, &from)
                || (from.is_numeric() && target.is_numeric())));
    if castable {
        let mut args = vec![expr];
        if typmod >= 0 {
            args.push(TypedExpr::constant(Value::Integer(typmod as i64), DataType::Int32));
        }
        return Ok(TypedExpr::Function {
            name: cast_function_name(target),
            args,
            form,
            returns_set: false,
            volatility: Volatility::Immutable,
            ty: target.clone(),
        });
    }

    // explicit casts fall back to the textual representation when either
    // side is a string type
    if explicit
        && (from.category() == TypeCategory::String
            || target.category() == TypeCategory::String)
    {
        return Ok(TypedExpr::CoerceViaIo {
            arg: Box::new(expr),
            ty: target.clone(),
            form,
        });
    }

    Err(cannot_cast(&from, target, location))
}

fn length_cast(expr: TypedExpr, target: &DataType, typmod: i32, form: FunctionForm) -> TypedExpr {
    TypedExpr::Function {
        name: cast_function_name(target),
        args: vec![
            expr,
            TypedExpr::constant(Value::Integer(typmod as i64), DataType::Int32),
        ],
        form,
        returns_set: false,
        volatility: Volatility::Immutable,
        ty: target.clone(),
    }
}

/// Coerce a condition to boolean, naming the construct on failure.
pub fn coerce_to_boolean(
    ctx: &mut AnalysisContext,
    construct: &str,
    expr: TypedExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let from = expr.data_type();
    if from == DataType::Bool {
        return Ok(expr);
    }
    if can_coerce_implicitly(&from, &DataType::Bool) {
        return coerce_to_target_type(ctx, expr, &DataType::Bool, NO_TYPMOD, false, location);
    }
    Err(ErrorKind::NotBoolean {
        construct: construct.to_string(),
        found: from.to_string(),
    }
    .at(location))
}

/// Coerce one input of a multi-arm construct to the already-selected common
/// type.
pub fn coerce_to_common_type(
    ctx: &mut AnalysisContext,
    expr: TypedExpr,
    target: &DataType,
    context: &str,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let from = expr.data_type();
    if &from == target {
        return Ok(expr);
    }
    if can_coerce_implicitly(&from, target) {
        return coerce_to_target_type(ctx, expr, target, NO_TYPMOD, false, location);
    }
    Err(ErrorKind::CannotCoerce {
        context: context.to_string(),
        from: from.to_string(),
        to: target.to_string(),
    }
    .at(location))
}

/// Pick the common type for a list of inputs. Untyped inputs are ignored
/// (all-untyped resolves to text); a later input takes over when it is an
/// implicit superset of the running choice, or is its category's preferred
/// type and reachable from the running choice. A cross-category conflict
/// fails when a construct name is given and reports "no common type"
/// (`None`) otherwise.
pub fn select_common_type(
    types: &[DataType],
    context: Option<&str>,
    location: Option<usize>,
) -> Result<Option<DataType>> {
    let mut iter = types.iter();
    let mut ptype = iter.next().cloned().unwrap_or(DataType::Unknown);
    let mut pcategory = ptype.category();
    for ntype in iter {
        if *ntype == DataType::Unknown {
            continue;
        }
        if ptype == DataType::Unknown {
            ptype = ntype.clone();
            pcategory = ptype.category();
        } else if ntype.category() != pcategory {
            match context {
                Some(construct) => {
                    return Err(ErrorKind::TypesCannotBeMatched {
                        context: construct.to_string(),
                        left: ptype.to_string(),
                        right: ntype.to_string(),
                    }
                    .at(location))
                }
                None => return Ok(None),
            }
        } else if !ptype.is_preferred()
            && can_coerce_implicitly(&ptype, ntype)
            && !can_coerce_implicitly(ntype, &ptype)
        {
            ptype = ntype.clone();
        } else if ntype.is_preferred() && can_coerce_implicitly(&ptype, ntype) {
            ptype = ntype.clone();
        }
    }
    if ptype == DataType::Unknown {
        ptype = DataType::Text;
    }
    Ok(Some(ptype))
}
