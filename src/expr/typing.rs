//! Total type and type-modifier inference over resolved nodes, plus the
//! tree walkers the transformers use for argument validation.
//!
//! `data_type` and `type_modifier` are pure and never fail: every resolved
//! node carries enough information to answer without catalog access.

use crate::catalog::Volatility;
use crate::parsing::ast::SubLinkKind;
use crate::types::{DataType, Value, NO_TYPMOD};

use super::{BinaryOpKind, FunctionForm, TypedExpr};

impl TypedExpr {
    pub fn data_type(&self) -> DataType {
        use TypedExpr::*;
        match self {
            Column { ty, .. }
            | Constant { ty, .. }
            | Parameter { ty, .. }
            | Aggregate { ty, .. }
            | Function { ty, .. }
            | FieldSelect { ty, .. }
            | FieldStore { ty, .. }
            | Relabel { ty, .. }
            | CoerceViaIo { ty, .. }
            | ArrayCoerce { ty, .. }
            | ConvertRowtype { ty, .. }
            | Case { ty, .. }
            | CaseTest { ty, .. }
            | ArrayCtor { ty, .. }
            | Row { ty, .. }
            | Coalesce { ty, .. }
            | MinMax { ty, .. }
            | Xml { ty, .. }
            | CoerceToDomain { ty, .. }
            | DomainValue { ty, .. }
            | SetToDefault { ty, .. }
            | Percentile { ty, .. } => ty.clone(),
            Subscript {
                slice,
                array_ty,
                elem_ty,
                ..
            } => {
                if *slice {
                    array_ty.clone()
                } else {
                    elem_ty.clone()
                }
            }
            BinaryOp { kind, op, args } => match kind {
                BinaryOpKind::Plain => op.result.clone(),
                BinaryOpKind::Distinct => DataType::Bool,
                // NULLIF yields its first argument unchanged or NULL
                BinaryOpKind::NullIf => args
                    .first()
                    .map(|a| a.data_type())
                    .unwrap_or(DataType::Unknown),
            },
            ScalarArrayOp { .. }
            | BoolExpr { .. }
            | RowCompare { .. }
            | NullTest { .. }
            | BooleanTest { .. }
            | CurrentOf { .. } => DataType::Bool,
            SubLink { kind, query, .. } => match kind {
                SubLinkKind::Expr => query
                    .visible_columns()
                    .next()
                    .map(|c| c.ty.clone())
                    .unwrap_or(DataType::Unknown),
                SubLinkKind::Array => query
                    .visible_columns()
                    .next()
                    .and_then(|c| c.ty.array_type_of())
                    .unwrap_or(DataType::Unknown),
                _ => DataType::Bool,
            },
            Grouping { .. } => DataType::Int64,
            GroupId => DataType::Int32,
            TableValue { .. } => DataType::AnyTable,
            PartitionBound { .. } => DataType::Record,
        }
    }

    pub fn type_modifier(&self) -> i32 {
        use TypedExpr::*;
        match self {
            Column { typmod, .. }
            | Constant { typmod, .. }
            | Parameter { typmod, .. }
            | Subscript { typmod, .. }
            | FieldSelect { typmod, .. }
            | Relabel { typmod, .. }
            | ArrayCoerce { typmod, .. }
            | CaseTest { typmod, .. }
            | Xml { typmod, .. }
            | CoerceToDomain { typmod, .. }
            | DomainValue { typmod, .. }
            | SetToDefault { typmod, .. } => *typmod,
            Function { .. } => self.length_coercion_typmod().unwrap_or(NO_TYPMOD),
            Case {
                whens, default, ty, ..
            } => {
                let mut arms: Vec<&TypedExpr> = whens.iter().map(|w| &w.result).collect();
                arms.push(default);
                agreed_typmod(&arms, ty)
            }
            ArrayCtor { elements, ty, .. } => {
                agreed_typmod(&elements.iter().collect::<Vec<_>>(), ty)
            }
            Coalesce { args, ty } | MinMax { args, ty, .. } => {
                agreed_typmod(&args.iter().collect::<Vec<_>>(), ty)
            }
            SubLink { kind, query, .. } if *kind == SubLinkKind::Expr => query
                .visible_columns()
                .next()
                .map(|c| c.typmod)
                .unwrap_or(NO_TYPMOD),
            _ => NO_TYPMOD,
        }
    }

    /// Recognize the shape a length-bearing cast leaves behind: a cast-form
    /// function application whose trailing argument is an int constant
    /// holding the target modifier.
    pub fn length_coercion_typmod(&self) -> Option<i32> {
        match self {
            TypedExpr::Function { form, args, .. }
                if *form != FunctionForm::Call && args.len() == 2 =>
            {
                match &args[1] {
                    TypedExpr::Constant {
                        value: Value::Integer(n),
                        ty: DataType::Int32,
                        ..
                    } => i32::try_from(*n).ok(),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Visit this node and all children, pre-order. Subquery payloads are
    /// opaque and not descended into.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a TypedExpr)) {
        visit(self);
        self.for_each_child(&mut |child| child.walk(visit));
    }

    fn for_each_child<'a>(&'a self, f: &mut dyn FnMut(&'a TypedExpr)) {
        use TypedExpr::*;
        match self {
            Column { .. } | Constant { .. } | Parameter { .. } | CaseTest { .. }
            | DomainValue { .. } | SetToDefault { .. } | CurrentOf { .. } | GroupId
            | TableValue { .. } => {}
            Aggregate { args, .. }
            | Function { args, .. }
            | BoolExpr { args, .. }
            | Coalesce { args, .. }
            | MinMax { args, .. }
            | Grouping { args }
            | BinaryOp { args, .. }
            | ScalarArrayOp { args, .. } => args.iter().for_each(f),
            Subscript {
                array,
                upper,
                lower,
                ..
            } => {
                f(array);
                upper.iter().for_each(&mut *f);
                lower.iter().flatten().for_each(f);
            }
            SubLink { test, .. } => {
                if let Some(t) = test {
                    f(t);
                }
            }
            FieldSelect { arg, .. }
            | Relabel { arg, .. }
            | CoerceViaIo { arg, .. }
            | ArrayCoerce { arg, .. }
            | ConvertRowtype { arg, .. }
            | NullTest { arg, .. }
            | BooleanTest { arg, .. }
            | CoerceToDomain { arg, .. } => f(arg),
            FieldStore { arg, newvals, .. } => {
                f(arg);
                newvals.iter().for_each(|(_, v)| f(v));
            }
            Case {
                operand,
                whens,
                default,
                ..
            } => {
                if let Some(op) = operand {
                    f(op);
                }
                for w in whens {
                    f(&w.condition);
                    f(&w.result);
                }
                f(default);
            }
            ArrayCtor { elements, .. } | Row { elements, .. } => elements.iter().for_each(f),
            RowCompare { left, right, .. } => {
                left.iter().for_each(&mut *f);
                right.iter().for_each(f);
            }
            Xml {
                named_args, args, ..
            } => {
                named_args.iter().for_each(|(_, v)| f(v));
                args.iter().for_each(f);
            }
            Percentile { args, sort_key, .. } => {
                args.iter().for_each(&mut *f);
                f(sort_key);
            }
            PartitionBound { start, end, every } => {
                start.iter().for_each(&mut *f);
                end.iter().for_each(&mut *f);
                every.iter().for_each(f);
            }
        }
    }

    fn any(&self, pred: &dyn Fn(&TypedExpr) -> bool) -> bool {
        let mut found = false;
        self.walk(&mut |node| {
            if pred(node) {
                found = true;
            }
        });
        found
    }

    /// Any column reference at the given nesting level.
    pub fn contains_vars_of_level(&self, level: u32) -> bool {
        self.any(&|n| matches!(n, TypedExpr::Column { levels_up, .. } if *levels_up == level))
    }

    pub fn contains_columns(&self) -> bool {
        self.any(&|n| matches!(n, TypedExpr::Column { .. }))
    }

    pub fn contains_aggregates(&self) -> bool {
        self.any(&|n| {
            matches!(n, TypedExpr::Aggregate { over_window: false, .. })
                || matches!(n, TypedExpr::Percentile { .. })
        })
    }

    pub fn contains_window_functions(&self) -> bool {
        self.any(&|n| matches!(n, TypedExpr::Aggregate { over_window: true, .. }))
    }

    pub fn contains_sublinks(&self) -> bool {
        self.any(&|n| matches!(n, TypedExpr::SubLink { .. }))
    }

    pub fn contains_set_returning(&self) -> bool {
        self.any(&|n| matches!(n, TypedExpr::Function { returns_set: true, .. }))
    }

    pub fn contains_volatile(&self) -> bool {
        self.any(
            &|n| matches!(n, TypedExpr::Function { volatility: Volatility::Volatile, .. }),
        )
    }

    pub fn contains_grouping(&self) -> bool {
        self.any(&|n| matches!(n, TypedExpr::Grouping { .. } | TypedExpr::GroupId))
    }
}

/// Arms agree on a typmod only when every arm already has the common type
/// and reports the same non-default modifier.
fn agreed_typmod(arms: &[&TypedExpr], common: &DataType) -> i32 {
    let mut iter = arms.iter();
    let first = match iter.next() {
        Some(e) => e,
        None => return NO_TYPMOD,
    };
    let typmod = first.type_modifier();
    if typmod < 0 || first.data_type() != *common {
        return NO_TYPMOD;
    }
    for arm in iter {
        if arm.data_type() != *common || arm.type_modifier() != typmod {
            return NO_TYPMOD;
        }
    }
    typmod
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::TypedCaseWhen;
    use crate::types::Value;

    fn varchar_const(typmod: i32) -> TypedExpr {
        TypedExpr::Constant {
            value: Value::String("x".into()),
            ty: DataType::Varchar,
            typmod,
        }
    }

    #[test]
    fn test_case_typmod_agreement() {
        let case = TypedExpr::Case {
            operand: None,
            whens: vec![TypedCaseWhen {
                condition: TypedExpr::bool_constant(true),
                result: varchar_const(10),
            }],
            default: Box::new(varchar_const(10)),
            ty: DataType::Varchar,
        };
        assert_eq!(case.type_modifier(), 10);
    }

    #[test]
    fn test_case_typmod_disagreement_is_default() {
        let case = TypedExpr::Case {
            operand: None,
            whens: vec![TypedCaseWhen {
                condition: TypedExpr::bool_constant(true),
                result: varchar_const(10),
            }],
            default: Box::new(varchar_const(20)),
            ty: DataType::Varchar,
        };
        assert_eq!(case.type_modifier(), NO_TYPMOD);
    }

    #[test]
    fn test_length_coercion_shape() {
        let cast = TypedExpr::Function {
            name: "varchar".into(),
            args: vec![
                TypedExpr::constant(Value::String("abc".into()), DataType::Text),
                TypedExpr::constant(Value::Integer(10), DataType::Int32),
            ],
            form: FunctionForm::ExplicitCast,
            returns_set: false,
            volatility: Volatility::Immutable,
            ty: DataType::Varchar,
        };
        assert_eq!(cast.type_modifier(), 10);
        assert_eq!(cast.length_coercion_typmod(), Some(10));
    }

    #[test]
    fn test_plain_call_has_no_length_coercion() {
        let call = TypedExpr::Function {
            name: "length".into(),
            args: vec![TypedExpr::constant(
                Value::String("abc".into()),
                DataType::Text,
            )],
            form: FunctionForm::Call,
            returns_set: false,
            volatility: Volatility::Immutable,
            ty: DataType::Int32,
        };
        assert_eq!(call.type_modifier(), NO_TYPMOD);
    }

    #[test]
    fn test_walker_finds_nested_column() {
        let expr = TypedExpr::BoolExpr {
            op: crate::parsing::ast::BoolOpKind::And,
            args: vec![
                TypedExpr::bool_constant(true),
                TypedExpr::NullTest {
                    negated: false,
                    arg: Box::new(TypedExpr::Column {
                        rel: 1,
                        attr: Some(2),
                        levels_up: 0,
                        ty: DataType::Int32,
                        typmod: NO_TYPMOD,
                    }),
                },
            ],
        };
        assert!(expr.contains_columns());
        assert!(expr.contains_vars_of_level(0));
        assert!(!expr.contains_vars_of_level(1));
        assert!(!expr.contains_aggregates());
    }
}
