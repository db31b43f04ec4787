//! CASE analysis: searched and simple forms, decode-style arms, result
//! type unification

mod common;

use common::TestContext;
use sql_semantic::error::ErrorKind;
use sql_semantic::expr::BinaryOpKind;
use sql_semantic::parsing::ast::{BoolOpKind, RawCaseWhen};
use sql_semantic::types::DataType;
use sql_semantic::{RawExpr, TypedExpr};

fn when(condition: RawExpr, result: RawExpr) -> RawCaseWhen {
    RawCaseWhen {
        condition,
        result,
        not_distinct: false,
        location: None,
    }
}

fn case(
    operand: Option<RawExpr>,
    whens: Vec<RawCaseWhen>,
    default: Option<RawExpr>,
) -> RawExpr {
    RawExpr::Case {
        operand: operand.map(Box::new),
        whens,
        default: default.map(Box::new),
        location: None,
    }
}

#[test]
fn test_searched_case() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&case(
            None,
            vec![when(
                RawExpr::binary(">", RawExpr::column(&["age"]), RawExpr::integer(30)),
                RawExpr::string("old"),
            )],
            Some(RawExpr::string("young")),
        ))
        .unwrap();
    // all arms untyped; the common type falls back to text
    assert_eq!(result.data_type(), DataType::Text);
}

#[test]
fn test_simple_case_rewrites_conditions() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&case(
            Some(RawExpr::column(&["age"])),
            vec![when(RawExpr::integer(1), RawExpr::string("one"))],
            None,
        ))
        .unwrap();
    match result {
        TypedExpr::Case { operand, whens, .. } => {
            assert!(operand.is_some());
            // the condition became `CaseTest = 1`
            match &whens[0].condition {
                TypedExpr::BinaryOp { op, args, .. } => {
                    assert_eq!(op.name, "=");
                    assert!(matches!(args[0], TypedExpr::CaseTest { .. }));
                }
                other => panic!("expected rewritten condition, got {other:?}"),
            }
        }
        other => panic!("expected CASE, got {other:?}"),
    }
}

#[test]
fn test_untyped_case_operand_settles_as_text() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&case(
            Some(RawExpr::string("b")),
            vec![when(RawExpr::string("a"), RawExpr::integer(1))],
            Some(RawExpr::integer(0)),
        ))
        .unwrap();
    match result {
        TypedExpr::Case { operand, whens, .. } => {
            let operand = operand.expect("simple CASE keeps its operand");
            assert_eq!(operand.data_type(), DataType::Text);
            // the comparison placeholder carries the settled type too
            match &whens[0].condition {
                TypedExpr::BinaryOp { args, .. } => {
                    assert_eq!(args[0].data_type(), DataType::Text);
                }
                other => panic!("expected rewritten condition, got {other:?}"),
            }
        }
        other => panic!("expected CASE, got {other:?}"),
    }
}

#[test]
fn test_missing_else_defaults_to_null() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&case(
            None,
            vec![when(
                RawExpr::binary("=", RawExpr::column(&["age"]), RawExpr::integer(1)),
                RawExpr::integer(10),
            )],
            None,
        ))
        .unwrap();
    match result {
        TypedExpr::Case { default, ty, .. } => {
            assert!(default.is_null_constant());
            assert_eq!(ty, DataType::Int32);
        }
        other => panic!("expected CASE, got {other:?}"),
    }
}

#[test]
fn test_result_type_unifies_across_arms() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&case(
            Some(RawExpr::column(&["age"])),
            vec![
                when(RawExpr::integer(1), RawExpr::integer(10)),
                when(RawExpr::integer(2), RawExpr::column(&["orders", "total"])),
            ],
            Some(RawExpr::integer(0)),
        ))
        .unwrap();
    assert_eq!(result.data_type(), DataType::Numeric);
}

#[test]
fn test_conflicting_arm_types_fail() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&case(
            None,
            vec![when(
                RawExpr::binary("=", RawExpr::column(&["age"]), RawExpr::integer(1)),
                RawExpr::integer(10),
            )],
            Some(RawExpr::column(&["name"])),
        ))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TypesCannotBeMatched { .. }));
}

#[test]
fn test_non_boolean_condition() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&case(
            None,
            vec![when(RawExpr::column(&["name"]), RawExpr::integer(1))],
            None,
        ))
        .unwrap_err();
    match err.kind() {
        ErrorKind::NotBoolean { construct, .. } => assert_eq!(construct, "CASE/WHEN"),
        other => panic!("expected NotBoolean, got {other:?}"),
    }
}

#[test]
fn test_decode_style_arm() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&case(
            Some(RawExpr::column(&["age"])),
            vec![RawCaseWhen {
                condition: RawExpr::null(),
                result: RawExpr::string("missing"),
                not_distinct: true,
                location: None,
            }],
            None,
        ))
        .unwrap();
    match result {
        TypedExpr::Case { whens, .. } => match &whens[0].condition {
            TypedExpr::BoolExpr { op, args } => {
                assert_eq!(*op, BoolOpKind::Not);
                assert!(matches!(
                    args[0],
                    TypedExpr::BinaryOp {
                        kind: BinaryOpKind::Distinct,
                        ..
                    }
                ));
            }
            other => panic!("expected NOT(IS DISTINCT FROM), got {other:?}"),
        },
        other => panic!("expected CASE, got {other:?}"),
    }
}

#[test]
fn test_decode_style_arm_requires_operand() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&case(
            None,
            vec![RawCaseWhen {
                condition: RawExpr::integer(1),
                result: RawExpr::integer(2),
                not_distinct: true,
                location: None,
            }],
            None,
        ))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::CaseDistinctWithoutOperand);
}
