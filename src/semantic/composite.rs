//! Composite-value constructs: CASE, array and row constructors, COALESCE,
//! GREATEST/LEAST, the XML family, and grouping operations.

use std::collections::HashSet;

use crate::error::{ErrorKind, Result};
use crate::expr::{MinMaxOp, TypedCaseWhen, TypedExpr};
use crate::parsing::ast::{BoolOpKind, RawCaseWhen, RawExpr, TypeName, XmlOp, XmlOption};
use crate::types::{DataType, TypeCategory, NO_TYPMOD};

use super::coercion::{
    coerce_to_boolean, coerce_to_common_type, coerce_to_target_type, select_common_type,
};
use super::context::AnalysisContext;

/// The simple form plants a placeholder for the operand and rewrites each
/// WHEN condition into a comparison against it, so the conditions resolve
/// through ordinary operator lookup. Result types are unified default-first.
pub(super) fn transform_case(
    ctx: &mut AnalysisContext,
    operand: Option<&RawExpr>,
    whens: &[RawCaseWhen],
    default: Option<&RawExpr>,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let operand_t = match operand {
        Some(op) => {
            let mut t = ctx.transform(op)?;
            // an untyped operand settles as text before the comparisons
            // and the placeholder see it
            if t.data_type() == DataType::Unknown {
                t = coerce_to_common_type(ctx, t, &DataType::Text, "CASE", location)?;
            }
            Some(t)
        }
        None => None,
    };
    let placeholder = operand_t.as_ref().map(|t| TypedExpr::CaseTest {
        ty: t.data_type(),
        typmod: t.type_modifier(),
    });

    let mut conditions = Vec::with_capacity(whens.len());
    let mut results = Vec::with_capacity(whens.len());
    for when in whens {
        let condition = match &placeholder {
            Some(ph) if when.not_distinct => RawExpr::BoolOp {
                op: BoolOpKind::Not,
                args: vec![RawExpr::Distinct {
                    negated: false,
                    left: Box::new(RawExpr::Resolved(ph.clone())),
                    right: Box::new(when.condition.clone()),
                    location: when.location,
                }],
                location: when.location,
            },
            Some(ph) => RawExpr::Binary {
                op: "=".to_string(),
                left: Box::new(RawExpr::Resolved(ph.clone())),
                right: Box::new(when.condition.clone()),
                location: when.location,
            },
            None if when.not_distinct => {
                return Err(ErrorKind::CaseDistinctWithoutOperand.at(when.location))
            }
            None => when.condition.clone(),
        };
        let cond_t = ctx.transform(&condition)?;
        conditions.push(coerce_to_boolean(ctx, "CASE/WHEN", cond_t, when.location)?);
        results.push(ctx.transform(&when.result)?);
    }

    let default_t = match default {
        Some(d) => ctx.transform(d)?,
        None => TypedExpr::null_constant(DataType::Unknown),
    };

    // the ELSE arm leads type selection so an untyped default does not win
    let mut types = vec![default_t.data_type()];
    types.extend(results.iter().map(|r| r.data_type()));
    let ty = select_common_type(&types, Some("CASE"), location)?.unwrap_or(DataType::Text);

    let default_c = coerce_to_common_type(ctx, default_t, &ty, "CASE/ELSE", location)?;
    let mut whens_t = Vec::with_capacity(whens.len());
    for (condition, result) in conditions.into_iter().zip(results) {
        let result = coerce_to_common_type(ctx, result, &ty, "CASE/WHEN", location)?;
        whens_t.push(TypedCaseWhen { condition, result });
    }

    Ok(TypedExpr::Case {
        operand: operand_t.map(Box::new),
        whens: whens_t,
        default: Box::new(default_c),
        ty,
    })
}

/// `target`, when supplied by an enclosing cast, is the array type the
/// constructor must produce; it drives element coercion and permits an
/// empty element list.
pub(super) fn transform_array(
    ctx: &mut AnalysisContext,
    elements: &[RawExpr],
    target: Option<&DataType>,
    location: Option<usize>,
) -> Result<TypedExpr> {
    if let Some(arr) = target {
        let elem = arr
            .element_type()
            .cloned()
            .ok_or_else(|| ErrorKind::NotAnArray(arr.to_string()).at(location))?;
        let mut coerced = Vec::with_capacity(elements.len());
        let mut multidim = false;
        for e in elements {
            match e {
                // nested constructors keep the same array type and add a
                // dimension
                RawExpr::ArrayConstructor {
                    elements: inner,
                    location: inner_loc,
                } => {
                    multidim = true;
                    ctx.descend(*inner_loc)?;
                    let built = transform_array(ctx, inner, Some(arr), *inner_loc);
                    ctx.ascend();
                    coerced.push(built?);
                }
                _ => {
                    let t = ctx.transform(e)?;
                    coerced.push(coerce_to_common_type(ctx, t, &elem, "ARRAY", location)?);
                }
            }
        }
        return Ok(TypedExpr::ArrayCtor {
            elements: coerced,
            elem_ty: elem,
            multidim,
            ty: arr.clone(),
        });
    }

    if elements.is_empty() {
        return Err(ErrorKind::IndeterminateArrayType.at(location));
    }
    let elements_t: Vec<TypedExpr> = elements
        .iter()
        .map(|e| ctx.transform(e))
        .collect::<Result<_>>()?;
    let types: Vec<DataType> = elements_t.iter().map(|e| e.data_type()).collect();
    let common = select_common_type(&types, Some("ARRAY"), location)?.unwrap_or(DataType::Text);

    // elements that are themselves arrays make a multidimensional array
    let (ty, elem_ty, multidim) = match common.element_type() {
        Some(elem) => (common.clone(), elem.clone(), true),
        None => {
            let arr = common
                .array_type_of()
                .ok_or_else(|| ErrorKind::NoArrayType(common.to_string()).at(location))?;
            (arr, common.clone(), false)
        }
    };

    let mut coerced = Vec::with_capacity(elements_t.len());
    for e in elements_t {
        coerced.push(coerce_to_common_type(ctx, e, &common, "ARRAY", location)?);
    }
    Ok(TypedExpr::ArrayCtor {
        elements: coerced,
        elem_ty,
        multidim,
        ty,
    })
}

pub(super) fn transform_row(
    ctx: &mut AnalysisContext,
    elements: &[RawExpr],
) -> Result<TypedExpr> {
    let elements_t: Vec<TypedExpr> = elements
        .iter()
        .map(|e| ctx.transform(e))
        .collect::<Result<_>>()?;
    Ok(TypedExpr::Row {
        elements: elements_t,
        ty: DataType::Record,
    })
}

pub(super) fn transform_coalesce(
    ctx: &mut AnalysisContext,
    args: &[RawExpr],
    location: Option<usize>,
) -> Result<TypedExpr> {
    let args_t: Vec<TypedExpr> = args
        .iter()
        .map(|a| ctx.transform(a))
        .collect::<Result<_>>()?;
    let types: Vec<DataType> = args_t.iter().map(|a| a.data_type()).collect();
    let ty = select_common_type(&types, Some("COALESCE"), location)?.unwrap_or(DataType::Text);
    let mut coerced = Vec::with_capacity(args_t.len());
    for a in args_t {
        coerced.push(coerce_to_common_type(ctx, a, &ty, "COALESCE", location)?);
    }
    Ok(TypedExpr::Coalesce { args: coerced, ty })
}

pub(super) fn transform_minmax(
    ctx: &mut AnalysisContext,
    op: MinMaxOp,
    args: &[RawExpr],
    location: Option<usize>,
) -> Result<TypedExpr> {
    let context = match op {
        MinMaxOp::Greatest => "GREATEST",
        MinMaxOp::Least => "LEAST",
    };
    let args_t: Vec<TypedExpr> = args
        .iter()
        .map(|a| ctx.transform(a))
        .collect::<Result<_>>()?;
    let types: Vec<DataType> = args_t.iter().map(|a| a.data_type()).collect();
    let ty = select_common_type(&types, Some(context), location)?.unwrap_or(DataType::Text);
    let mut coerced = Vec::with_capacity(args_t.len());
    for a in args_t {
        coerced.push(coerce_to_common_type(ctx, a, &ty, context, location)?);
    }
    Ok(TypedExpr::MinMax {
        op,
        args: coerced,
        ty,
    })
}

/// An unnamed attribute or forest entry borrows its column's name; anything
/// else must be named explicitly.
fn infer_xml_name(arg: &RawExpr) -> Result<String> {
    match arg {
        RawExpr::ColumnRef { names, .. } => match names.last() {
            Some(n) if n != "*" => Ok(n.clone()),
            _ => Err(ErrorKind::XmlUnnamedAttribute.into()),
        },
        _ => Err(ErrorKind::XmlUnnamedAttribute.into()),
    }
}

pub(super) fn transform_xml(
    ctx: &mut AnalysisContext,
    op: XmlOp,
    name: Option<&str>,
    named_args: &[(Option<String>, RawExpr)],
    args: &[RawExpr],
    xml_option: XmlOption,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut named_t = Vec::with_capacity(named_args.len());
    for (attr_name, arg) in named_args {
        let attr_name = match attr_name {
            Some(n) => n.clone(),
            None => infer_xml_name(arg).map_err(|e| e.at(arg.location().or(location)))?,
        };
        if op == XmlOp::Element && !seen.insert(attr_name.clone()) {
            return Err(ErrorKind::XmlDuplicateAttribute(attr_name).at(location));
        }
        let t = ctx.transform(arg)?;
        named_t.push((attr_name, t));
    }

    let mut args_t = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        let t = ctx.transform(arg)?;
        let target = match (op, i) {
            (XmlOp::Concat, _) | (XmlOp::Element, _) | (XmlOp::IsDocument, _) => DataType::Xml,
            (XmlOp::Parse, _) | (XmlOp::Pi, _) => DataType::Text,
            (XmlOp::Root, 0) => DataType::Xml,
            (XmlOp::Root, 1) => DataType::Text,
            (XmlOp::Root, _) => DataType::Int32,
            _ => DataType::Xml,
        };
        args_t.push(coerce_to_target_type(
            ctx, t, &target, NO_TYPMOD, false, location,
        )?);
    }

    let ty = if op == XmlOp::IsDocument {
        DataType::Bool
    } else {
        DataType::Xml
    };
    Ok(TypedExpr::Xml {
        op,
        name: name.map(|s| s.to_string()),
        named_args: named_t,
        args: args_t,
        xml_option,
        ty,
        typmod: NO_TYPMOD,
    })
}

/// XMLSERIALIZE renders XML into a string type named in the statement.
pub(super) fn transform_xml_serialize(
    ctx: &mut AnalysisContext,
    arg: &RawExpr,
    type_name: &TypeName,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let t = ctx.transform(arg)?;
    let t = coerce_to_target_type(ctx, t, &DataType::Xml, NO_TYPMOD, true, location)?;
    let (ty, typmod) = ctx
        .catalog
        .resolve_type(type_name)
        .map_err(|e| e.at(type_name.location.or(location)))?;
    if ty.category() != TypeCategory::String {
        return Err(ErrorKind::CannotCast {
            from: DataType::Xml.to_string(),
            to: ty.to_string(),
        }
        .at(location));
    }
    Ok(TypedExpr::Xml {
        op: XmlOp::Serialize,
        name: None,
        named_args: Vec::new(),
        args: vec![t],
        xml_option: XmlOption::Content,
        ty,
        typmod,
    })
}

pub(super) fn transform_grouping(
    ctx: &mut AnalysisContext,
    args: &[RawExpr],
) -> Result<TypedExpr> {
    let args_t: Vec<TypedExpr> = args
        .iter()
        .map(|a| ctx.transform(a))
        .collect::<Result<_>>()?;
    Ok(TypedExpr::Grouping { args: args_t })
}

pub(super) fn transform_partition_bound(
    ctx: &mut AnalysisContext,
    start: &[RawExpr],
    end: &[RawExpr],
    every: &[RawExpr],
) -> Result<TypedExpr> {
    let transform_all = |ctx: &mut AnalysisContext, exprs: &[RawExpr]| -> Result<Vec<TypedExpr>> {
        exprs.iter().map(|e| ctx.transform(e)).collect()
    };
    let start = transform_all(ctx, start)?;
    let end = transform_all(ctx, end)?;
    let every = transform_all(ctx, every)?;
    Ok(TypedExpr::PartitionBound { start, end, every })
}
