//! Sublinks, TABLE value expressions, and CURRENT OF

mod common;

use common::TestContext;
use sql_semantic::catalog::subquery::{CommandKind, OutputColumn, RawQuery, SubqueryPayload};
use sql_semantic::error::{ErrorClass, ErrorKind};
use sql_semantic::parsing::ast::{BoolOpKind, CursorRef, SubLinkKind};
use sql_semantic::types::DataType;
use sql_semantic::{RawExpr, TypedExpr};

fn select(columns: Vec<OutputColumn>) -> SubqueryPayload {
    SubqueryPayload::Raw(RawQuery::select(columns))
}

fn sublink(kind: SubLinkKind, test: Option<RawExpr>, operator: Option<&str>, payload: SubqueryPayload) -> RawExpr {
    RawExpr::SubLink {
        kind,
        test: test.map(Box::new),
        operator: operator.map(|s| s.to_string()),
        payload,
        location: None,
    }
}

#[test]
fn test_exists_ignores_columns() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&sublink(
            SubLinkKind::Exists,
            None,
            None,
            select(vec![
                OutputColumn::new("a", DataType::Int32),
                OutputColumn::new("b", DataType::Text),
            ]),
        ))
        .unwrap();
    assert_eq!(result.data_type(), DataType::Bool);
}

#[test]
fn test_expr_sublink_takes_column_type() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&sublink(
            SubLinkKind::Expr,
            None,
            None,
            select(vec![OutputColumn::new("total", DataType::Numeric)]),
        ))
        .unwrap();
    assert_eq!(result.data_type(), DataType::Numeric);
}

#[test]
fn test_expr_sublink_column_count() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&sublink(SubLinkKind::Expr, None, None, select(vec![])))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::SubqueryNoColumn);

    let err = ctx
        .transform(&sublink(
            SubLinkKind::Expr,
            None,
            None,
            select(vec![
                OutputColumn::new("a", DataType::Int32),
                OutputColumn::new("b", DataType::Int32),
            ]),
        ))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::SubqueryTooManyColumns);
}

#[test]
fn test_array_sublink_wraps_element_type() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&sublink(
            SubLinkKind::Array,
            None,
            None,
            select(vec![OutputColumn::new("id", DataType::Int64)]),
        ))
        .unwrap();
    assert_eq!(
        result.data_type(),
        DataType::Array(Box::new(DataType::Int64))
    );
}

#[test]
fn test_array_sublink_needs_exactly_one_column() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&sublink(SubLinkKind::Array, None, None, select(vec![])))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::SubqueryNoColumn);

    let err = ctx
        .transform(&sublink(
            SubLinkKind::Array,
            None,
            None,
            select(vec![
                OutputColumn::new("a", DataType::Int32),
                OutputColumn::new("b", DataType::Int32),
            ]),
        ))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::SubqueryTooManyColumns);
}

#[test]
fn test_junk_columns_are_invisible() {
    let mut ctx = TestContext::new();
    let mut junk = OutputColumn::new("ord", DataType::Int32);
    junk.junk = true;
    let result = ctx
        .transform(&sublink(
            SubLinkKind::Expr,
            None,
            None,
            select(vec![OutputColumn::new("a", DataType::Text), junk]),
        ))
        .unwrap();
    assert_eq!(result.data_type(), DataType::Text);
}

#[test]
fn test_any_sublink_builds_test_expression() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&sublink(
            SubLinkKind::Any,
            Some(RawExpr::column(&["age"])),
            Some("="),
            select(vec![OutputColumn::new("a", DataType::Int32)]),
        ))
        .unwrap();
    match result {
        TypedExpr::SubLink { kind, test, .. } => {
            assert_eq!(kind, SubLinkKind::Any);
            let test = test.expect("quantified sublink carries a test expression");
            assert!(matches!(*test, TypedExpr::BinaryOp { .. }));
        }
        other => panic!("expected sublink, got {other:?}"),
    }
}

#[test]
fn test_row_any_sublink_folds_equality() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&sublink(
            SubLinkKind::Any,
            Some(RawExpr::Row {
                elements: vec![RawExpr::column(&["age"]), RawExpr::column(&["name"])],
                location: None,
            }),
            Some("="),
            select(vec![
                OutputColumn::new("a", DataType::Int32),
                OutputColumn::new("b", DataType::Text),
            ]),
        ))
        .unwrap();
    match result {
        TypedExpr::SubLink { test, .. } => {
            let test = test.expect("test expression");
            assert!(matches!(
                *test,
                TypedExpr::BoolExpr {
                    op: BoolOpKind::And,
                    ..
                }
            ));
        }
        other => panic!("expected sublink, got {other:?}"),
    }
}

#[test]
fn test_row_compare_sublink_keeps_structure() {
    let mut ctx = TestContext::new();
    // (age, id) < (subquery)
    let result = ctx
        .transform(&RawExpr::binary(
            "<",
            RawExpr::Row {
                elements: vec![RawExpr::column(&["age"]), RawExpr::column(&["users", "id"])],
                location: None,
            },
            sublink(
                SubLinkKind::Expr,
                None,
                None,
                select(vec![
                    OutputColumn::new("a", DataType::Int32),
                    OutputColumn::new("b", DataType::Int64),
                ]),
            ),
        ))
        .unwrap();
    match result {
        TypedExpr::SubLink { kind, test, .. } => {
            assert_eq!(kind, SubLinkKind::RowCompare);
            assert!(matches!(
                *test.expect("test expression"),
                TypedExpr::RowCompare { .. }
            ));
        }
        other => panic!("expected row-compare sublink, got {other:?}"),
    }
}

#[test]
fn test_row_width_mismatch_against_subquery() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&sublink(
            SubLinkKind::Any,
            Some(RawExpr::Row {
                elements: vec![RawExpr::column(&["age"])],
                location: None,
            }),
            Some("="),
            select(vec![
                OutputColumn::new("a", DataType::Int32),
                OutputColumn::new("b", DataType::Int32),
            ]),
        ))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::SubqueryRowTooManyColumns);
}

#[test]
fn test_sublink_rejects_select_into() {
    let mut ctx = TestContext::new();
    let payload = SubqueryPayload::Raw(RawQuery {
        command: CommandKind::Select,
        has_into: true,
        uses_outer_references: false,
        columns: vec![OutputColumn::new("a", DataType::Int32)],
    });
    let err = ctx
        .transform(&sublink(SubLinkKind::Expr, None, None, payload))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::SubqueryWithInto);
}

#[test]
fn test_non_select_subquery_is_internal() {
    let mut ctx = TestContext::new();
    let payload = SubqueryPayload::Raw(RawQuery {
        command: CommandKind::Insert,
        has_into: false,
        uses_outer_references: false,
        columns: vec![],
    });
    let err = ctx
        .transform(&sublink(SubLinkKind::Exists, None, None, payload))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnexpectedSubqueryCommand);
    assert_eq!(err.kind().class(), ErrorClass::Internal);
}

#[test]
fn test_table_value_expression() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::TableValue {
            payload: select(vec![OutputColumn::new("a", DataType::Int32)]),
            location: None,
        })
        .unwrap();
    assert_eq!(result.data_type(), DataType::AnyTable);
}

#[test]
fn test_correlated_table_value_fails() {
    let mut ctx = TestContext::new();
    let payload = SubqueryPayload::Raw(RawQuery {
        command: CommandKind::Select,
        has_into: false,
        uses_outer_references: true,
        columns: vec![OutputColumn::new("a", DataType::Int32)],
    });
    let err = ctx
        .transform(&RawExpr::TableValue {
            payload,
            location: None,
        })
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::CorrelatedTableValue);
}

#[test]
fn test_current_of_requires_target() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&RawExpr::CurrentOf {
            cursor: CursorRef::Name("c1".into()),
            location: None,
        })
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MissingCursorTarget);
}

#[test]
fn test_current_of_with_cursor_parameter() {
    let mut ctx = TestContext::new();
    ctx.namespace.set_target(0);
    let result = ctx
        .transform(&RawExpr::CurrentOf {
            cursor: CursorRef::Param(1),
            location: None,
        })
        .unwrap();
    assert!(matches!(
        result,
        TypedExpr::CurrentOf { target_rel: 0, .. }
    ));
    assert_eq!(ctx.deduced_params(), &[Some(DataType::RefCursor)]);
}
