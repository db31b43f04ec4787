//! Percentile (inverse distribution) aggregates: MEDIAN, PERCENTILE_CONT
//! and PERCENTILE_DISC over a single ORDER BY key.

use crate::catalog::functions::{match_candidates, CandidateMatch};
use crate::error::{ErrorKind, Result};
use crate::expr::TypedExpr;
use crate::parsing::ast::{PercentileKind, RawExpr, SortBy, SortDirection};
use crate::types::{DataType, Value, NO_TYPMOD};

use super::coercion::{coerce_to_common_type, coerce_to_target_type};
use super::context::AnalysisContext;

/// Data types an ordered-set percentile can rank over. Numeric inputs
/// funnel to double precision; the datetime kinds interpolate natively.
const PERCENTILE_CANDIDATES: [DataType; 4] = [
    DataType::Float64,
    DataType::Timestamp,
    DataType::TimestampTz,
    DataType::Interval,
];

pub(super) fn transform_percentile(
    ctx: &mut AnalysisContext,
    kind: PercentileKind,
    args: &[RawExpr],
    sort: &[SortBy],
    location: Option<usize>,
) -> Result<TypedExpr> {
    // MEDIAN carries its sort key as the lone argument; the fraction is
    // implicitly one half.
    let (fraction_t, sort_expr, direction) = match kind {
        PercentileKind::Median => {
            if args.len() != 1 || !sort.is_empty() {
                return Err(ErrorKind::PercentileSingleSortKey.at(location));
            }
            let half = TypedExpr::constant(Value::Float(0.5), DataType::Float64);
            (half, &args[0], SortDirection::Default)
        }
        PercentileKind::Cont | PercentileKind::Disc => {
            if args.len() != 1 || sort.len() != 1 {
                return Err(ErrorKind::PercentileSingleSortKey.at(location));
            }
            let f = ctx.transform(&args[0])?;
            let f = coerce_to_target_type(ctx, f, &DataType::Float64, NO_TYPMOD, false, location)?;
            check_fraction_restrictions(&f, location)?;
            (f, &sort[0].expr, sort[0].direction)
        }
    };

    let key_t = ctx.transform(sort_expr)?;
    let key_ty = key_t.data_type();
    let candidates: Vec<&[DataType]> = PERCENTILE_CANDIDATES
        .iter()
        .map(std::slice::from_ref)
        .collect();
    let chosen = match match_candidates(&[key_ty.clone()], &candidates) {
        CandidateMatch::Exact(i) | CandidateMatch::Unique(i) => PERCENTILE_CANDIDATES[i].clone(),
        CandidateMatch::Ambiguous => {
            return Err(ErrorKind::AmbiguousFunction(percentile_name(kind).to_string())
                .at(location))
        }
        CandidateMatch::None => {
            return Err(ErrorKind::UndefinedFunction(format!(
                "{}({})",
                percentile_name(kind),
                key_ty
            ))
            .at(location))
        }
    };
    let key_t = coerce_to_common_type(ctx, key_t, &chosen, percentile_name(kind), location)?;

    ctx.note_aggregate();
    Ok(TypedExpr::Percentile {
        kind,
        args: vec![fraction_t],
        sort_key: Box::new(key_t),
        direction,
        ty: chosen,
    })
}

fn percentile_name(kind: PercentileKind) -> &'static str {
    match kind {
        PercentileKind::Median => "median",
        PercentileKind::Cont => "percentile_cont",
        PercentileKind::Disc => "percentile_disc",
    }
}

/// The fraction must be computable before the aggregate runs: no columns,
/// no nested aggregation, nothing set-returning or volatile, no subqueries.
fn check_fraction_restrictions(fraction: &TypedExpr, location: Option<usize>) -> Result<()> {
    if fraction.contains_columns() {
        return Err(ErrorKind::PercentileContainsColumns.at(location));
    }
    if fraction.contains_aggregates() {
        return Err(ErrorKind::PercentileContainsAggregates.at(location));
    }
    if fraction.contains_window_functions() {
        return Err(ErrorKind::PercentileContainsWindowFunctions.at(location));
    }
    if fraction.contains_grouping() {
        return Err(ErrorKind::PercentileContainsGrouping.at(location));
    }
    if fraction.contains_set_returning() {
        return Err(ErrorKind::PercentileContainsSetReturning.at(location));
    }
    if fraction.contains_volatile() {
        return Err(ErrorKind::PercentileContainsVolatile.at(location));
    }
    if fraction.contains_sublinks() {
        return Err(ErrorKind::PercentileContainsSubqueries.at(location));
    }
    Ok(())
}
