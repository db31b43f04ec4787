//! Column reference resolution: 1-4 dotted names into column variables,
//! including whole-row references.

use tracing::trace;

use crate::catalog::namespace::{RelationHit, RelationKind};
use crate::error::{ErrorKind, Result};
use crate::expr::TypedExpr;
use crate::types::{DataType, NO_TYPMOD};

use super::context::AnalysisContext;
use super::functions;

pub(super) fn transform_column_ref(
    ctx: &mut AnalysisContext,
    names: &[String],
    location: Option<usize>,
) -> Result<TypedExpr> {
    trace!(names = ?names, "resolving column reference");
    match names {
        [name] => {
            // inside a domain CHECK constraint, VALUE refers to the value
            // being checked
            if name == "value" {
                if let Some(sub) = ctx.value_substitute() {
                    return Ok(sub.clone());
                }
            }
            if let Some(hit) = ctx.namespace.resolve_unqualified(name)? {
                return Ok(column_from_hit(hit));
            }
            // a bare relation name stands for its whole row
            if let Some(rel) = ctx.namespace.resolve_relation(None, name) {
                return Ok(whole_row_ref(rel));
            }
            Err(ErrorKind::UndefinedColumn(name.clone()).at(location))
        }
        [rel, col] => resolve_qualified(ctx, None, rel, col, location),
        [schema, rel, col] => resolve_qualified(ctx, Some(schema), rel, col, location),
        [db, schema, rel, col] => {
            if db != ctx.catalog.database_name() {
                return Err(ErrorKind::CrossDatabaseReference(names.join(".")).at(location));
            }
            resolve_qualified(ctx, Some(schema), rel, col, location)
        }
        _ => Err(ErrorKind::ImproperQualifiedName(names.join(".")).at(location)),
    }
}

fn resolve_qualified(
    ctx: &mut AnalysisContext,
    schema: Option<&str>,
    rel: &str,
    col: &str,
    location: Option<usize>,
) -> Result<TypedExpr> {
    if col == "*" {
        let hit = relation_or_implicit(ctx, schema, rel, location)?;
        return Ok(whole_row_ref(hit));
    }
    if let Some(hit) = ctx.namespace.resolve_column(schema, rel, col)? {
        return Ok(column_from_hit(hit));
    }
    // not a column of an in-scope relation; the name may still be a
    // function applied to the relation's whole row
    if let Some(hit) = ctx.namespace.resolve_relation(schema, rel) {
        return functions::field_or_function(ctx, col, whole_row_ref(hit), location)
            .map_err(|_| ErrorKind::UndefinedColumn(format!("{rel}.{col}")).at(location));
    }
    let added = relation_or_implicit(ctx, schema, rel, location)?;
    debug_assert_eq!(added.levels_up, 0);
    match ctx.namespace.resolve_column(schema, rel, col)? {
        Some(hit) => Ok(column_from_hit(hit)),
        None => functions::field_or_function(ctx, col, whole_row_ref(added), location)
            .map_err(|_| ErrorKind::UndefinedColumn(format!("{rel}.{col}")).at(location)),
    }
}

fn relation_or_implicit(
    ctx: &mut AnalysisContext,
    schema: Option<&str>,
    rel: &str,
    location: Option<usize>,
) -> Result<RelationHit> {
    if let Some(hit) = ctx.namespace.resolve_relation(schema, rel) {
        return Ok(hit);
    }
    match ctx.namespace.implicit_relation(schema, rel)? {
        Some(hit) => Ok(hit),
        None => Err(ErrorKind::MissingFromEntry(rel.to_string()).at(location)),
    }
}

fn column_from_hit(hit: crate::catalog::ColumnHit) -> TypedExpr {
    TypedExpr::Column {
        rel: hit.rel,
        attr: Some(hit.attr),
        levels_up: hit.levels_up,
        ty: hit.ty,
        typmod: hit.typmod,
    }
}

/// A whole-row reference types as the relation's named composite type for
/// base tables, the function's result type for functions in FROM, and an
/// anonymous record for joins, subqueries, and VALUES lists.
fn whole_row_ref(rel: RelationHit) -> TypedExpr {
    let ty = match rel.kind {
        RelationKind::Table { rowtype } => DataType::Composite(rowtype),
        RelationKind::Function { result } => result,
        RelationKind::Join | RelationKind::Subquery | RelationKind::Values => DataType::Record,
    };
    TypedExpr::Column {
        rel: rel.index,
        attr: None,
        levels_up: rel.levels_up,
        ty,
        typmod: NO_TYPMOD,
    }
}
