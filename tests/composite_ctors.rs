//! Array/row constructors, COALESCE, GREATEST/LEAST, subscripting, field
//! selection, and the XML family

mod common;

use common::TestContext;
use sql_semantic::error::ErrorKind;
use sql_semantic::expr::MinMaxOp;
use sql_semantic::parsing::ast::{IndirectionItem, TypeName, XmlOp, XmlOption};
use sql_semantic::types::DataType;
use sql_semantic::{RawExpr, TypedExpr};

fn array(elements: Vec<RawExpr>) -> RawExpr {
    RawExpr::ArrayConstructor {
        elements,
        location: None,
    }
}

#[test]
fn test_array_constructor() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&array(vec![RawExpr::integer(1), RawExpr::integer(2)]))
        .unwrap();
    match result {
        TypedExpr::ArrayCtor {
            elem_ty,
            multidim,
            ty,
            ..
        } => {
            assert_eq!(elem_ty, DataType::Int32);
            assert!(!multidim);
            assert_eq!(ty, DataType::Array(Box::new(DataType::Int32)));
        }
        other => panic!("expected array constructor, got {other:?}"),
    }
}

#[test]
fn test_array_elements_unify() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&array(vec![
            RawExpr::integer(1),
            RawExpr::column(&["orders", "total"]),
        ]))
        .unwrap();
    assert_eq!(
        result.data_type(),
        DataType::Array(Box::new(DataType::Numeric))
    );
}

#[test]
fn test_nested_arrays_are_multidimensional() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&array(vec![
            array(vec![RawExpr::integer(1)]),
            array(vec![RawExpr::integer(2)]),
        ]))
        .unwrap();
    match result {
        TypedExpr::ArrayCtor {
            elem_ty, multidim, ..
        } => {
            assert_eq!(elem_ty, DataType::Int32);
            assert!(multidim);
        }
        other => panic!("expected array constructor, got {other:?}"),
    }
}

#[test]
fn test_empty_array_is_indeterminate() {
    let mut ctx = TestContext::new();
    let err = ctx.transform(&array(vec![])).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::IndeterminateArrayType);
}

fn int_array_cast(arg: RawExpr) -> RawExpr {
    let mut type_name = TypeName::simple("int4");
    type_name.array_dims = 1;
    RawExpr::TypeCast {
        arg: Box::new(arg),
        type_name,
        location: None,
    }
}

#[test]
fn test_cast_legitimizes_empty_array() {
    let mut ctx = TestContext::new();
    let result = ctx.transform(&int_array_cast(array(vec![]))).unwrap();
    match result {
        TypedExpr::ArrayCtor {
            elements,
            elem_ty,
            ty,
            ..
        } => {
            assert!(elements.is_empty());
            assert_eq!(elem_ty, DataType::Int32);
            assert_eq!(ty, DataType::Array(Box::new(DataType::Int32)));
        }
        other => panic!("expected array constructor, got {other:?}"),
    }
}

#[test]
fn test_cast_drives_array_element_coercion() {
    // untyped elements adopt the cast's element type directly
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&int_array_cast(array(vec![
            RawExpr::string("1"),
            RawExpr::string("2"),
        ])))
        .unwrap();
    match result {
        TypedExpr::ArrayCtor { elements, ty, .. } => {
            assert_eq!(ty, DataType::Array(Box::new(DataType::Int32)));
            assert!(elements.iter().all(|e| e.data_type() == DataType::Int32));
        }
        other => panic!("expected array constructor, got {other:?}"),
    }
}

#[test]
fn test_row_constructor_is_record() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::Row {
            elements: vec![RawExpr::integer(1), RawExpr::string("a")],
            location: None,
        })
        .unwrap();
    assert_eq!(result.data_type(), DataType::Record);
}

#[test]
fn test_coalesce() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::Coalesce {
            args: vec![RawExpr::null(), RawExpr::column(&["age"])],
            location: None,
        })
        .unwrap();
    assert_eq!(result.data_type(), DataType::Int32);
}

#[test]
fn test_greatest_unifies_numerics() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::Greatest {
            args: vec![
                RawExpr::integer(1),
                RawExpr::column(&["orders", "total"]),
            ],
            location: None,
        })
        .unwrap();
    match result {
        TypedExpr::MinMax { op, ty, .. } => {
            assert_eq!(op, MinMaxOp::Greatest);
            assert_eq!(ty, DataType::Numeric);
        }
        other => panic!("expected GREATEST, got {other:?}"),
    }
}

#[test]
fn test_least_conflict_fails() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&RawExpr::Least {
            args: vec![RawExpr::column(&["age"]), RawExpr::column(&["name"])],
            location: None,
        })
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TypesCannotBeMatched { .. }));
}

#[test]
fn test_subscript_yields_element() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::Indirection {
            arg: Box::new(array(vec![RawExpr::integer(1), RawExpr::integer(2)])),
            items: vec![IndirectionItem::Subscript(Box::new(RawExpr::integer(1)))],
            location: None,
        })
        .unwrap();
    assert_eq!(result.data_type(), DataType::Int32);
}

#[test]
fn test_slice_yields_array() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::Indirection {
            arg: Box::new(array(vec![RawExpr::integer(1), RawExpr::integer(2)])),
            items: vec![IndirectionItem::Slice {
                lower: Some(Box::new(RawExpr::integer(1))),
                upper: Some(Box::new(RawExpr::integer(2))),
            }],
            location: None,
        })
        .unwrap();
    assert_eq!(
        result.data_type(),
        DataType::Array(Box::new(DataType::Int32))
    );
}

#[test]
fn test_subscript_run_flushes_before_field_step() {
    // arr[1].abs collapses the subscript, then falls through to abs()
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::Indirection {
            arg: Box::new(array(vec![RawExpr::integer(-3)])),
            items: vec![
                IndirectionItem::Subscript(Box::new(RawExpr::integer(1))),
                IndirectionItem::Field("abs".into()),
            ],
            location: None,
        })
        .unwrap();
    match result {
        TypedExpr::Function { ref name, ref args, .. } => {
            assert_eq!(name, "abs");
            assert!(matches!(args[0], TypedExpr::Subscript { .. }));
        }
        other => panic!("expected function over the element, got {other:?}"),
    }
    assert_eq!(result.data_type(), DataType::Int32);
}

#[test]
fn test_subscript_of_non_array() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&RawExpr::Indirection {
            arg: Box::new(RawExpr::column(&["age"])),
            items: vec![IndirectionItem::Subscript(Box::new(RawExpr::integer(1)))],
            location: None,
        })
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::NotAnArray(_)));
}

#[test]
fn test_field_selection_over_whole_row() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::Indirection {
            arg: Box::new(RawExpr::column(&["users"])),
            items: vec![IndirectionItem::Field("email".into())],
            location: None,
        })
        .unwrap();
    match result {
        TypedExpr::FieldSelect { field, ty, typmod, .. } => {
            assert_eq!(field, 2);
            assert_eq!(ty, DataType::Varchar);
            assert_eq!(typmod, 100);
        }
        other => panic!("expected field selection, got {other:?}"),
    }
}

#[test]
fn test_unknown_field_over_composite() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&RawExpr::Indirection {
            arg: Box::new(RawExpr::column(&["users"])),
            items: vec![IndirectionItem::Field("nonesuch".into())],
            location: None,
        })
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UndefinedField { .. }));
}

#[test]
fn test_field_over_scalar_falls_back_to_function() {
    // name.length is length(name)
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::Indirection {
            arg: Box::new(RawExpr::column(&["name"])),
            items: vec![IndirectionItem::Field("length".into())],
            location: None,
        })
        .unwrap();
    match result {
        TypedExpr::Function { name, ty, .. } => {
            assert_eq!(name, "length");
            assert_eq!(ty, DataType::Int32);
        }
        other => panic!("expected function call, got {other:?}"),
    }
}

fn xml_element(name: &str, named: Vec<(Option<String>, RawExpr)>) -> RawExpr {
    RawExpr::XmlConstruct {
        op: XmlOp::Element,
        name: Some(name.into()),
        named_args: named,
        args: vec![],
        xml_option: XmlOption::Content,
        location: None,
    }
}

#[test]
fn test_xml_element_attribute_names() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&xml_element(
            "person",
            vec![
                (None, RawExpr::column(&["name"])),
                (Some("years".into()), RawExpr::column(&["age"])),
            ],
        ))
        .unwrap();
    match result {
        TypedExpr::Xml { named_args, ty, .. } => {
            assert_eq!(named_args[0].0, "name");
            assert_eq!(named_args[1].0, "years");
            assert_eq!(ty, DataType::Xml);
        }
        other => panic!("expected XML construct, got {other:?}"),
    }
}

#[test]
fn test_xml_duplicate_attribute() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&xml_element(
            "person",
            vec![
                (Some("a".into()), RawExpr::integer(1)),
                (Some("a".into()), RawExpr::integer(2)),
            ],
        ))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::XmlDuplicateAttribute("a".into()));
}

#[test]
fn test_xml_unnamed_attribute_must_be_column() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&xml_element("person", vec![(None, RawExpr::integer(1))]))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::XmlUnnamedAttribute);
}

#[test]
fn test_xml_is_document_is_boolean() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::XmlConstruct {
            op: XmlOp::IsDocument,
            name: None,
            named_args: vec![],
            args: vec![RawExpr::string("<a/>")],
            xml_option: XmlOption::Content,
            location: None,
        })
        .unwrap();
    assert_eq!(result.data_type(), DataType::Bool);
}

#[test]
fn test_xml_serialize_to_string_type() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::XmlSerialize {
            arg: Box::new(RawExpr::string("<a/>")),
            type_name: TypeName::with_modifiers("varchar", vec![20]),
            location: None,
        })
        .unwrap();
    assert_eq!(result.data_type(), DataType::Varchar);
    assert_eq!(result.type_modifier(), 20);
}

#[test]
fn test_xml_serialize_rejects_non_string_target() {
    let mut ctx = TestContext::new();
    let err = ctx
        .transform(&RawExpr::XmlSerialize {
            arg: Box::new(RawExpr::string("<a/>")),
            type_name: TypeName::simple("int4"),
            location: None,
        })
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::CannotCast { .. }));
}

#[test]
fn test_grouping_and_group_id() {
    let mut ctx = TestContext::new();
    let grouping = ctx
        .transform(&RawExpr::Grouping {
            args: vec![RawExpr::column(&["age"])],
            location: None,
        })
        .unwrap();
    assert_eq!(grouping.data_type(), DataType::Int64);

    let group_id = ctx.transform(&RawExpr::GroupId { location: None }).unwrap();
    assert_eq!(group_id.data_type(), DataType::Int32);
}

#[test]
fn test_partition_bound_members_are_analyzed() {
    let mut ctx = TestContext::new();
    let result = ctx
        .transform(&RawExpr::PartitionBound {
            start: vec![RawExpr::integer(1)],
            end: vec![RawExpr::integer(10)],
            every: vec![],
            location: None,
        })
        .unwrap();
    match result {
        TypedExpr::PartitionBound { start, end, every } => {
            assert_eq!(start.len(), 1);
            assert_eq!(end.len(), 1);
            assert!(every.is_empty());
        }
        other => panic!("expected partition bound, got {other:?}"),
    }
}
