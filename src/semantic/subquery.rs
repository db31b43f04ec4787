//! Sublinks, TABLE value expressions, and CURRENT OF.
//!
//! Quantified sublinks build their combining test expression over
//! placeholders standing for the subquery's output columns, so operator
//! resolution and coercion run exactly as they would for ordinary operands.

use std::sync::Arc;

use crate::catalog::subquery::{AnalyzedQuery, CommandKind, SubqueryPayload};
use crate::error::{ErrorKind, Result};
use crate::expr::{ParamKind, TypedExpr};
use crate::parsing::ast::{CursorRef, RawExpr, SubLinkKind};

use super::context::AnalysisContext;
use super::operators::make_op;
use super::rowcompare::make_row_comparison;

fn analyze_payload(
    ctx: &mut AnalysisContext,
    payload: &SubqueryPayload,
) -> Result<Arc<AnalyzedQuery>> {
    match payload {
        SubqueryPayload::Analyzed(query) => Ok(Arc::clone(query)),
        SubqueryPayload::Raw(raw) => Ok(Arc::new(ctx.subqueries.analyze(raw)?)),
    }
}

/// Placeholders for the subquery's visible output columns, in order.
fn output_placeholders(query: &AnalyzedQuery) -> Vec<TypedExpr> {
    query
        .visible_columns()
        .enumerate()
        .map(|(column, col)| TypedExpr::Parameter {
            kind: ParamKind::SubqueryOutput { column },
            ty: col.ty.clone(),
            typmod: col.typmod,
        })
        .collect()
}

pub(super) fn transform_sublink(
    ctx: &mut AnalysisContext,
    kind: SubLinkKind,
    test: Option<&RawExpr>,
    operator: Option<&str>,
    payload: &SubqueryPayload,
    location: Option<usize>,
) -> Result<TypedExpr> {
    ctx.note_sublink();
    let query = analyze_payload(ctx, payload)?;
    if query.command != CommandKind::Select {
        return Err(ErrorKind::UnexpectedSubqueryCommand.at(location));
    }
    if query.has_into {
        return Err(ErrorKind::SubqueryWithInto.at(location));
    }

    match kind {
        // EXISTS ignores what the subquery selects
        SubLinkKind::Exists => Ok(TypedExpr::SubLink {
            kind,
            test: None,
            query,
        }),
        SubLinkKind::Expr | SubLinkKind::Array => {
            let mut cols = query.visible_columns();
            if cols.next().is_none() {
                return Err(ErrorKind::SubqueryNoColumn.at(location));
            }
            if cols.next().is_some() {
                return Err(ErrorKind::SubqueryTooManyColumns.at(location));
            }
            drop(cols);
            Ok(TypedExpr::SubLink {
                kind,
                test: None,
                query,
            })
        }
        SubLinkKind::Any | SubLinkKind::All | SubLinkKind::RowCompare => {
            let op = operator.unwrap_or("=");
            let left = test
                .ok_or_else(|| ErrorKind::UnrecognizedNode("sublink test".into()).at(location))?;
            let placeholders = output_placeholders(&query);
            let test_expr = match left {
                RawExpr::Row { elements, .. } => {
                    if elements.len() > placeholders.len() {
                        return Err(ErrorKind::SubqueryRowTooFewColumns.at(location));
                    }
                    if elements.len() < placeholders.len() {
                        return Err(ErrorKind::SubqueryRowTooManyColumns.at(location));
                    }
                    let largs: Vec<TypedExpr> = elements
                        .iter()
                        .map(|e| ctx.transform(e))
                        .collect::<Result<_>>()?;
                    make_row_comparison(ctx, op, largs, placeholders, location)?
                }
                _ => {
                    if placeholders.len() != 1 {
                        return Err(ErrorKind::SubqueryTooManyColumns.at(location));
                    }
                    let left_t = ctx.transform(left)?;
                    let mut placeholders = placeholders;
                    let placeholder = placeholders
                        .pop()
                        .ok_or_else(|| ErrorKind::SubqueryNoColumn.at(location))?;
                    make_op(ctx, op, left_t, placeholder, location)?
                }
            };
            Ok(TypedExpr::SubLink {
                kind,
                test: Some(Box::new(test_expr)),
                query,
            })
        }
    }
}

pub(super) fn transform_table_value(
    ctx: &mut AnalysisContext,
    payload: &SubqueryPayload,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let query = analyze_payload(ctx, payload)?;
    if query.command != CommandKind::Select {
        return Err(ErrorKind::UnexpectedSubqueryCommand.at(location));
    }
    if query.has_into {
        return Err(ErrorKind::SubqueryWithInto.at(location));
    }
    if query.uses_outer_references {
        return Err(ErrorKind::CorrelatedTableValue.at(location));
    }
    Ok(TypedExpr::TableValue { query })
}

pub(super) fn transform_current_of(
    ctx: &mut AnalysisContext,
    cursor: &CursorRef,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let target_rel = ctx
        .namespace
        .target_relation()
        .ok_or_else(|| ErrorKind::MissingCursorTarget.at(location))?;
    if let CursorRef::Param(number) = cursor {
        ctx.bind_cursor_param(*number).map_err(|e| e.at(location))?;
    }
    Ok(TypedExpr::CurrentOf {
        cursor: cursor.clone(),
        target_rel,
    })
}
