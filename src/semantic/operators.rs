//! The boolean and comparison family: operator application, AND/OR/NOT,
//! quantified array comparison, IS DISTINCT FROM, NULLIF, IS OF, and the
//! IN-list rewrite.

use crate::error::{ErrorKind, Result};
use crate::expr::{BinaryOpKind, TypedExpr};
use crate::parsing::ast::{BoolOpKind, Quantifier, RawExpr, RawLiteral, SubLinkKind, TypeName};
use crate::types::{DataType, NO_TYPMOD};

use super::coercion::{coerce_to_boolean, coerce_to_target_type, select_common_type};
use super::context::AnalysisContext;
use super::{rowcompare, subquery};

/// Resolve and apply a binary operator over two resolved operands.
pub(super) fn make_op(
    ctx: &mut AnalysisContext,
    op: &str,
    left: TypedExpr,
    right: TypedExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let lt = left.data_type();
    let rt = right.data_type();
    let sig = ctx
        .catalog
        .resolve_operator(op, &lt, &rt)
        .map_err(|e| e.at(location))?;
    let l = coerce_to_target_type(ctx, left, &sig.operands[0], NO_TYPMOD, false, location)?;
    let r = coerce_to_target_type(ctx, right, &sig.operands[1], NO_TYPMOD, false, location)?;
    Ok(TypedExpr::BinaryOp {
        kind: BinaryOpKind::Plain,
        op: sig,
        args: vec![l, r],
    })
}

fn is_null_literal(expr: &RawExpr) -> bool {
    matches!(
        expr,
        RawExpr::Literal {
            value: RawLiteral::Null,
            type_name: None,
            ..
        }
    )
}

fn null_equals_candidate(expr: &RawExpr) -> bool {
    matches!(expr, RawExpr::ColumnRef { .. } | RawExpr::Parameter { .. })
}

pub(super) fn transform_binary(
    ctx: &mut AnalysisContext,
    op: &str,
    left: &RawExpr,
    right: &RawExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    // legacy `expr = NULL` means `expr IS NULL` when so configured
    if ctx.config.transform_null_equals && op == "=" {
        if is_null_literal(right) && null_equals_candidate(left) {
            let arg = ctx.transform(left)?;
            return Ok(TypedExpr::NullTest {
                negated: false,
                arg: Box::new(arg),
            });
        }
        if is_null_literal(left) && null_equals_candidate(right) {
            let arg = ctx.transform(right)?;
            return Ok(TypedExpr::NullTest {
                negated: false,
                arg: Box::new(arg),
            });
        }
    }

    match (left, right) {
        (RawExpr::Row { elements: l, .. }, RawExpr::Row { elements: r, .. }) => {
            let largs: Vec<TypedExpr> = l.iter().map(|e| ctx.transform(e)).collect::<Result<_>>()?;
            let rargs: Vec<TypedExpr> = r.iter().map(|e| ctx.transform(e)).collect::<Result<_>>()?;
            rowcompare::make_row_comparison(ctx, op, largs, rargs, location)
        }
        // (a, b) op (subquery) compares against the subquery's row
        (
            RawExpr::Row { .. },
            RawExpr::SubLink {
                kind: SubLinkKind::Expr,
                payload,
                ..
            },
        ) => subquery::transform_sublink(
            ctx,
            SubLinkKind::RowCompare,
            Some(left),
            Some(op),
            payload,
            location,
        ),
        _ => {
            let l = ctx.transform(left)?;
            let r = ctx.transform(right)?;
            make_op(ctx, op, l, r, location)
        }
    }
}

pub(super) fn transform_unary(
    ctx: &mut AnalysisContext,
    op: &str,
    arg: &RawExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let arg_t = ctx.transform(arg)?;
    let ty = arg_t.data_type();
    let sig = ctx
        .catalog
        .resolve_unary_operator(op, &ty)
        .map_err(|e| e.at(location))?;
    let coerced = coerce_to_target_type(ctx, arg_t, &sig.operands[0], NO_TYPMOD, false, location)?;
    Ok(TypedExpr::BinaryOp {
        kind: BinaryOpKind::Plain,
        op: sig,
        args: vec![coerced],
    })
}

pub(super) fn transform_any_all(
    ctx: &mut AnalysisContext,
    op: &str,
    quantifier: Quantifier,
    left: &RawExpr,
    right: &RawExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let left_t = ctx.transform(left)?;
    let right_t = ctx.transform(right)?;
    make_scalar_array_op(
        ctx,
        op,
        quantifier == Quantifier::Any,
        left_t,
        right_t,
        location,
    )
}

pub(super) fn make_scalar_array_op(
    ctx: &mut AnalysisContext,
    op: &str,
    use_or: bool,
    left: TypedExpr,
    right: TypedExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let lt = left.data_type();
    let rt = right.data_type();
    // an untyped right side adopts "array of the left type"
    let elem = match rt.element_type() {
        Some(e) => e.clone(),
        None if rt == DataType::Unknown => lt.clone(),
        None => return Err(ErrorKind::NotAnArray(rt.to_string()).at(location)),
    };
    let sig = ctx
        .catalog
        .resolve_operator(op, &lt, &elem)
        .map_err(|e| e.at(location))?;
    if sig.result != DataType::Bool {
        return Err(ErrorKind::OperatorNotBoolean(op.to_string()).at(location));
    }
    let array_ty = sig.operands[1]
        .array_type_of()
        .ok_or_else(|| ErrorKind::NoArrayType(sig.operands[1].to_string()).at(location))?;
    let l = coerce_to_target_type(ctx, left, &sig.operands[0], NO_TYPMOD, false, location)?;
    let r = coerce_to_target_type(ctx, right, &array_ty, NO_TYPMOD, false, location)?;
    Ok(TypedExpr::ScalarArrayOp {
        op: sig,
        use_or,
        args: vec![l, r],
    })
}

pub(super) fn transform_distinct(
    ctx: &mut AnalysisContext,
    negated: bool,
    left: &RawExpr,
    right: &RawExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let result = match (left, right) {
        (RawExpr::Row { elements: l, .. }, RawExpr::Row { elements: r, .. }) => {
            let largs: Vec<TypedExpr> = l.iter().map(|e| ctx.transform(e)).collect::<Result<_>>()?;
            let rargs: Vec<TypedExpr> = r.iter().map(|e| ctx.transform(e)).collect::<Result<_>>()?;
            rowcompare::make_row_distinct_op(ctx, largs, rargs, location)?
        }
        _ => {
            let l = ctx.transform(left)?;
            let r = ctx.transform(right)?;
            rowcompare::make_distinct_op(ctx, l, r, location)?
        }
    };
    if negated {
        Ok(TypedExpr::BoolExpr {
            op: BoolOpKind::Not,
            args: vec![result],
        })
    } else {
        Ok(result)
    }
}

pub(super) fn transform_nullif(
    ctx: &mut AnalysisContext,
    left: &RawExpr,
    right: &RawExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let l = ctx.transform(left)?;
    let r = ctx.transform(right)?;
    let sig = ctx
        .catalog
        .resolve_operator("=", &l.data_type(), &r.data_type())
        .map_err(|e| e.at(location))?;
    if sig.result != DataType::Bool {
        return Err(ErrorKind::ComparisonNotBoolean {
            construct: "NULLIF".to_string(),
        }
        .at(location));
    }
    let l = coerce_to_target_type(ctx, l, &sig.operands[0], NO_TYPMOD, false, location)?;
    let r = coerce_to_target_type(ctx, r, &sig.operands[1], NO_TYPMOD, false, location)?;
    Ok(TypedExpr::BinaryOp {
        kind: BinaryOpKind::NullIf,
        op: sig,
        args: vec![l, r],
    })
}

/// IS [NOT] OF folds to a boolean constant: the expression's type either is
/// in the list or is not, and analysis already knows which.
pub(super) fn transform_is_of(
    ctx: &mut AnalysisContext,
    negated: bool,
    arg: &RawExpr,
    types: &[TypeName],
    location: Option<usize>,
) -> Result<TypedExpr> {
    let arg_t = ctx.transform(arg)?;
    let arg_ty = arg_t.data_type();
    let mut matched = false;
    for tn in types {
        let (ty, _) = ctx.catalog.resolve_type(tn).map_err(|e| e.at(location))?;
        if ty == arg_ty {
            matched = true;
        }
    }
    Ok(TypedExpr::bool_constant(matched != negated))
}

pub(super) fn transform_bool_op(
    ctx: &mut AnalysisContext,
    op: BoolOpKind,
    args: &[RawExpr],
    location: Option<usize>,
) -> Result<TypedExpr> {
    let construct = match op {
        BoolOpKind::And => "AND",
        BoolOpKind::Or => "OR",
        BoolOpKind::Not => "NOT",
    };
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        let t = ctx.transform(arg)?;
        out.push(coerce_to_boolean(ctx, construct, t, location)?);
    }
    Ok(TypedExpr::BoolExpr { op, args: out })
}

/// The IN-list rewrite. Scalar lists fold the right-hand items that share a
/// common type and reference no local columns into a single array
/// comparison; everything else (local column references, or any item when a
/// common type cannot be found) becomes a chain of per-item comparisons,
/// OR-ed for IN and AND-ed for NOT IN. Row lists go through row comparison
/// item by item.
pub(super) fn transform_in_list(
    ctx: &mut AnalysisContext,
    negated: bool,
    left: &RawExpr,
    items: &[RawExpr],
    location: Option<usize>,
) -> Result<TypedExpr> {
    if items.is_empty() {
        return Err(ErrorKind::Syntax("IN must have at least one element".into()).at(location));
    }
    let cmp_op = if negated { "<>" } else { "=" };
    let combine = if negated {
        BoolOpKind::And
    } else {
        BoolOpKind::Or
    };

    let have_row = matches!(left, RawExpr::Row { .. })
        || items.iter().any(|i| matches!(i, RawExpr::Row { .. }));

    let mut clauses: Vec<TypedExpr> = Vec::new();

    if have_row {
        let l_elems = match left {
            RawExpr::Row { elements, .. } => elements,
            _ => return Err(ErrorKind::MixedRowIn.at(location)),
        };
        for item in items {
            let r_elems = match item {
                RawExpr::Row { elements, .. } => elements,
                _ => return Err(ErrorKind::MixedRowIn.at(item.location().or(location))),
            };
            let largs: Vec<TypedExpr> = l_elems
                .iter()
                .map(|e| ctx.transform(e))
                .collect::<Result<_>>()?;
            let rargs: Vec<TypedExpr> = r_elems
                .iter()
                .map(|e| ctx.transform(e))
                .collect::<Result<_>>()?;
            clauses.push(rowcompare::make_row_comparison(
                ctx, cmp_op, largs, rargs, location,
            )?);
        }
    } else {
        let left_probe = ctx.transform(left)?;
        let items_t: Vec<TypedExpr> = items
            .iter()
            .map(|i| ctx.transform(i))
            .collect::<Result<_>>()?;

        let mut types = vec![left_probe.data_type()];
        types.extend(items_t.iter().map(|i| i.data_type()));
        let scalar = select_common_type(&types, None, location)?
            .filter(|t| t.array_type_of().is_some());

        let leftover: Vec<TypedExpr> = match scalar {
            Some(scalar) => {
                let (foldable, mut rest): (Vec<TypedExpr>, Vec<TypedExpr>) = items_t
                    .into_iter()
                    .partition(|i| !i.contains_vars_of_level(0));
                if foldable.len() > 1 {
                    let mut elements = Vec::with_capacity(foldable.len());
                    for item in foldable {
                        elements.push(super::coercion::coerce_to_common_type(
                            ctx, item, &scalar, "IN", location,
                        )?);
                    }
                    let array_ty = scalar.array_type_of().ok_or_else(|| {
                        ErrorKind::NoArrayType(scalar.to_string()).at(location)
                    })?;
                    let array = TypedExpr::ArrayCtor {
                        elements,
                        elem_ty: scalar.clone(),
                        multidim: false,
                        ty: array_ty,
                    };
                    clauses.push(make_scalar_array_op(
                        ctx, cmp_op, !negated, left_probe, array, location,
                    )?);
                } else {
                    rest.extend(foldable);
                }
                rest
            }
            None => items_t,
        };

        for item in leftover {
            let l = ctx.transform(left)?;
            clauses.push(make_op(ctx, cmp_op, l, item, location)?);
        }
    }

    if clauses.len() == 1 {
        return Ok(clauses.pop().unwrap_or(TypedExpr::bool_constant(!negated)));
    }
    Ok(TypedExpr::BoolExpr {
        op: combine,
        args: clauses,
    })
}
