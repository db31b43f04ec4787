//! Function call resolution, including the column-projection fallback:
//! `f(x)` where `x` is a row and `f` names one of its columns is field
//! selection, and `x.f` that names no column of `x` falls back to a
//! one-argument function call over it.

use crate::error::{ErrorKind, Result};
use crate::expr::{FunctionForm, TypedExpr};
use crate::types::DataType;

use super::coercion::coerce_to_target_type;
use super::context::AnalysisContext;

pub(super) fn transform_function_call(
    ctx: &mut AnalysisContext,
    name: &[String],
    args: &[crate::parsing::ast::RawExpr],
    distinct: bool,
    star: bool,
    over_window: bool,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let func_name = match name.last() {
        Some(n) => n.to_ascii_lowercase(),
        None => return Err(ErrorKind::UndefinedFunction(String::new()).at(location)),
    };
    let args_t: Vec<TypedExpr> = args
        .iter()
        .map(|a| ctx.transform(a))
        .collect::<Result<_>>()?;

    // column projection: f(row) where f is a column of the row type
    if args_t.len() == 1 && !star && !distinct && !over_window {
        if let Some(sel) = try_field_select(ctx, &func_name, &args_t[0]) {
            return Ok(sel);
        }
    }

    let arg_types: Vec<DataType> = args_t.iter().map(|a| a.data_type()).collect();
    let sig = ctx
        .catalog
        .resolve_function(&func_name, &arg_types)
        .map_err(|e| e.at(location))?;

    let mut coerced = Vec::with_capacity(args_t.len());
    for (arg, target) in args_t.into_iter().zip(sig.arg_types.iter()) {
        coerced.push(coerce_to_target_type(
            ctx,
            arg,
            target,
            crate::types::NO_TYPMOD,
            false,
            location,
        )?);
    }

    if sig.is_aggregate || sig.is_window || over_window {
        let windowed = sig.is_window || over_window;
        if !windowed {
            ctx.note_aggregate();
        }
        return Ok(TypedExpr::Aggregate {
            name: sig.name,
            args: coerced,
            distinct,
            star,
            over_window: windowed,
            ty: sig.result,
        });
    }
    Ok(TypedExpr::Function {
        name: sig.name,
        args: coerced,
        form: FunctionForm::Call,
        returns_set: sig.returns_set,
        volatility: sig.volatility,
        ty: sig.result,
    })
}

fn try_field_select(
    ctx: &AnalysisContext,
    field: &str,
    arg: &TypedExpr,
) -> Option<TypedExpr> {
    let name = match arg.data_type() {
        DataType::Composite(name) => name,
        _ => return None,
    };
    let columns = ctx.catalog.composite_columns(&name)?;
    let (idx, col) = columns.iter().enumerate().find(|(_, c)| c.name == field)?;
    Some(TypedExpr::FieldSelect {
        arg: Box::new(arg.clone()),
        field: idx as u32,
        ty: col.ty.clone(),
        typmod: col.typmod,
    })
}

/// Resolve `.field` indirection: field selection over a composite, else a
/// one-argument function call over any other type.
pub(super) fn field_or_function(
    ctx: &mut AnalysisContext,
    field: &str,
    base: TypedExpr,
    location: Option<usize>,
) -> Result<TypedExpr> {
    let base_ty = base.data_type();
    if let Some(sel) = try_field_select(ctx, field, &base) {
        return Ok(sel);
    }
    // not a column of the argument's row type; the name may still be a
    // one-argument function over the whole value
    if let Ok(sig) = ctx.catalog.resolve_function(field, &[base_ty.clone()]) {
        let arg = match sig.arg_types.first() {
            Some(target) => coerce_to_target_type(
                ctx,
                base,
                target,
                crate::types::NO_TYPMOD,
                false,
                location,
            )?,
            None => base,
        };
        return Ok(TypedExpr::Function {
            name: sig.name,
            args: vec![arg],
            form: FunctionForm::Call,
            returns_set: sig.returns_set,
            volatility: sig.volatility,
            ty: sig.result,
        });
    }
    match base_ty {
        // the row type is known but has no such column
        DataType::Composite(ref name) if ctx.catalog.composite_columns(name).is_some() => {
            Err(ErrorKind::UndefinedField {
                field: field.to_string(),
                ty: base_ty.to_string(),
            }
            .at(location))
        }
        _ => Err(ErrorKind::NotComposite {
            field: field.to_string(),
            ty: base_ty.to_string(),
        }
        .at(location)),
    }
}
