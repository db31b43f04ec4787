//! Row-wise comparison: `(a, b) < (c, d)` and row-valued IS DISTINCT FROM.
//!
//! A row comparison resolves the operator independently at every column
//! position, then intersects the ordering interpretations the positions
//! admit. Equality and inequality fold into AND/OR chains of the per-column
//! comparisons; the ordering strategies keep the positional structure so
//! later columns break ties.

use std::collections::BTreeSet;

use crate::catalog::BtreeInterpretation;
use crate::error::{ErrorKind, Result};
use crate::expr::{BinaryOpKind, RowCompareStrategy, TypedExpr};
use crate::parsing::ast::BoolOpKind;
use crate::types::{DataType, NO_TYPMOD};

use super::coercion::coerce_to_target_type;
use super::context::AnalysisContext;
use super::operators::make_op;

pub(super) fn make_row_comparison(
    ctx: &mut AnalysisContext,
    op: &str,
    largs: Vec<TypedExpr>,
    rargs: Vec<TypedExpr>,
    location: Option<usize>,
) -> Result<TypedExpr> {
    if largs.len() != rargs.len() {
        return Err(ErrorKind::UnequalRowLengths.at(location));
    }
    if largs.is_empty() {
        return Err(ErrorKind::ZeroLengthRowComparison.at(location));
    }

    let mut comparisons = Vec::with_capacity(largs.len());
    let mut interpretations: Vec<Vec<BtreeInterpretation>> = Vec::with_capacity(largs.len());
    for (l, r) in largs.into_iter().zip(rargs) {
        let cmp = make_op(ctx, op, l, r, location)?;
        let sig = match &cmp {
            TypedExpr::BinaryOp { op: sig, .. } => sig.clone(),
            _ => {
                return Err(
                    ErrorKind::RowComparisonNotBoolean(cmp.data_type().to_string()).at(location)
                )
            }
        };
        if sig.result != DataType::Bool {
            return Err(ErrorKind::RowComparisonNotBoolean(sig.result.to_string()).at(location));
        }
        if sig.returns_set {
            return Err(ErrorKind::RowComparisonReturnsSet.at(location));
        }
        interpretations.push(ctx.catalog.btree_interpretations(&sig));
        comparisons.push(cmp);
    }

    // a one-column row comparison is just that comparison, whatever the
    // operator's ordering classification
    if comparisons.len() == 1 {
        if let Some(single) = comparisons.pop() {
            return Ok(single);
        }
    }

    let mut strategies: Option<BTreeSet<RowCompareStrategy>> = None;
    for interps in &interpretations {
        let here: BTreeSet<RowCompareStrategy> = interps.iter().map(|i| i.strategy).collect();
        strategies = Some(match strategies {
            None => here,
            Some(prev) => prev.intersection(&here).copied().collect(),
        });
    }
    let strategy = strategies
        .and_then(|s| s.into_iter().next())
        .ok_or_else(|| ErrorKind::NoRowComparisonInterpretation(op.to_string()).at(location))?;

    // every position must classify the chosen strategy in exactly one
    // ordering family
    for interps in &interpretations {
        if interps.iter().filter(|i| i.strategy == strategy).count() > 1 {
            return Err(ErrorKind::AmbiguousFunction(op.to_string()).at(location));
        }
    }

    match strategy {
        RowCompareStrategy::Equal => Ok(fold_bool(BoolOpKind::And, comparisons)),
        RowCompareStrategy::NotEqual => Ok(fold_bool(BoolOpKind::Or, comparisons)),
        _ => {
            let mut ops = Vec::with_capacity(comparisons.len());
            let mut left = Vec::with_capacity(comparisons.len());
            let mut right = Vec::with_capacity(comparisons.len());
            for cmp in comparisons {
                if let TypedExpr::BinaryOp { op: sig, mut args, .. } = cmp {
                    let r = args.pop();
                    let l = args.pop();
                    match (l, r) {
                        (Some(l), Some(r)) => {
                            ops.push(sig);
                            left.push(l);
                            right.push(r);
                        }
                        _ => {
                            return Err(ErrorKind::UnrecognizedNode(
                                "row comparison operand".to_string(),
                            )
                            .at(location))
                        }
                    }
                }
            }
            Ok(TypedExpr::RowCompare {
                strategy,
                ops,
                left,
                right,
            })
        }
    }
}

fn fold_bool(op: BoolOpKind, mut args: Vec<TypedExpr>) -> TypedExpr {
    if args.len() == 1 {
        match args.pop() {
            Some(single) => single,
            None => TypedExpr::bool_constant(op == BoolOpKind::And),
        }
    } else {
        TypedExpr::BoolExpr { op, args }
    }
}

/// IS DISTINCT FROM over two scalars: an equality comparison evaluated with
/// null-aware semantics.
pub(super) fn make_distinct_op(
    ctx: &mut AnalysisContext,
    left: TypedExpr,
    right: TypedExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let sig = ctx
        .catalog
        .resolve_operator("=", &left.data_type(), &right.data_type())
        .map_err(|e| e.at(location))?;
    if sig.result != DataType::Bool {
        return Err(ErrorKind::ComparisonNotBoolean {
            construct: "IS DISTINCT FROM".to_string(),
        }
        .at(location));
    }
    let l = coerce_to_target_type(ctx, left, &sig.operands[0], NO_TYPMOD, false, location)?;
    let r = coerce_to_target_type(ctx, right, &sig.operands[1], NO_TYPMOD, false, location)?;
    Ok(TypedExpr::BinaryOp {
        kind: BinaryOpKind::Distinct,
        op: sig,
        args: vec![l, r],
    })
}

/// Two rows are distinct when any column pair is distinct.
pub(super) fn make_row_distinct_op(
    ctx: &mut AnalysisContext,
    largs: Vec<TypedExpr>,
    rargs: Vec<TypedExpr>,
    location: Option<usize>,
) -> Result<TypedExpr> {
    if largs.len() != rargs.len() {
        return Err(ErrorKind::UnequalRowLengths.at(location));
    }
    if largs.is_empty() {
        return Ok(TypedExpr::bool_constant(false));
    }
    let mut clauses = Vec::with_capacity(largs.len());
    for (l, r) in largs.into_iter().zip(rargs) {
        clauses.push(make_distinct_op(ctx, l, r, location)?);
    }
    Ok(fold_bool(BoolOpKind::Or, clauses))
}
