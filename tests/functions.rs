//! Function calls, aggregates, window functions, and column projection

mod common;

use common::TestContext;
use sql_semantic::error::ErrorKind;
use sql_semantic::expr::FunctionForm;
use sql_semantic::types::DataType;
use sql_semantic::{RawExpr, TypedExpr};

fn call(name: &str, args: Vec<RawExpr>) -> RawExpr {
    RawExpr::FunctionCall {
        name: vec![name.to_string()],
        args,
        distinct: false,
        star: false,
        over_window: false,
        location: None,
    }
}

#[test]
fn test_scalar_function_resolution() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&call("upper", vec![RawExpr::column(&["name"])]))
        .unwrap();
    match result {
        TypedExpr::Function { name, form, ty, .. } => {
            assert_eq!(name, "upper");
            assert_eq!(form, FunctionForm::Call);
            assert_eq!(ty, DataType::Text);
        }
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn test_exact_overload_wins() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&call("abs", vec![RawExpr::column(&["age"])]))
        .unwrap();
    assert_eq!(result.data_type(), DataType::Int32);
}

#[test]
fn test_untyped_argument_picks_preferred_overload() {
    let mut ctx = TestContext::new();
    let result = ctx.transform(&call("abs", vec![RawExpr::string("3")])).unwrap();
    assert_eq!(result.data_type(), DataType::Float64);
}

#[test]
fn test_argument_coerced_to_signature() {
    // length(varchar) resolves against length(text)
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&call("length", vec![RawExpr::column(&["email"])]))
        .unwrap();
    match result {
        TypedExpr::Function { ref args, ref ty, .. } => {
            assert_eq!(*ty, DataType::Int32);
            assert_eq!(args[0].data_type(), DataType::Text);
        }
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn test_sum_is_an_aggregate() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&call("sum", vec![RawExpr::column(&["age"])]))
        .unwrap();
    match result {
        TypedExpr::Aggregate {
            name,
            over_window,
            ty,
            ..
        } => {
            assert_eq!(name, "sum");
            assert!(!over_window);
            assert_eq!(ty, DataType::Int64);
        }
        other => panic!("expected aggregate, got {other:?}"),
    }
}

#[test]
fn test_count_star() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::FunctionCall {
            name: vec!["count".into()],
            args: vec![],
            distinct: false,
            star: true,
            over_window: false,
            location: None,
        })
        .unwrap();
    match result {
        TypedExpr::Aggregate { name, star, ty, .. } => {
            assert_eq!(name, "count");
            assert!(star);
            assert_eq!(ty, DataType::Int64);
        }
        other => panic!("expected aggregate, got {other:?}"),
    }
}

#[test]
fn test_window_function_carries_over_clause() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::FunctionCall {
            name: vec!["row_number".into()],
            args: vec![],
            distinct: false,
            star: false,
            over_window: true,
            location: None,
        })
        .unwrap();
    match result {
        TypedExpr::Aggregate {
            name,
            over_window,
            ty,
            ..
        } => {
            assert_eq!(name, "row_number");
            assert!(over_window);
            assert_eq!(ty, DataType::Int64);
        }
        other => panic!("expected windowed aggregate, got {other:?}"),
    }
}

#[test]
fn test_undefined_function_names_the_call() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&call("frobnicate", vec![RawExpr::integer(1)]))
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::UndefinedFunction("frobnicate(integer)".into())
    );
}

#[test]
fn test_column_projection_over_whole_row() {
    // name(users) selects the column, not a function
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&call("name", vec![RawExpr::column(&["users"])]))
        .unwrap();
    match result {
        TypedExpr::FieldSelect { field, ty, .. } => {
            assert_eq!(field, 1);
            assert_eq!(ty, DataType::Text);
        }
        other => panic!("expected field select, got {other:?}"),
    }
}

#[test]
fn test_min_over_any_orderable_type() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&call("min", vec![RawExpr::column(&["name"])]))
        .unwrap();
    assert_eq!(result.data_type(), DataType::Text);
}
