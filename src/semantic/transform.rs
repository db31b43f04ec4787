//! The expression dispatcher.
//!
//! [`AnalysisContext::transform`] is the single entry point: it guards
//! recursion depth, routes each raw variant to its transformer, and stamps
//! the raw node's location onto any error that bubbles up without one.
//! Already-resolved nodes embedded in the raw tree pass through unchanged,
//! which makes re-analysis of a partially processed tree a no-op.

use tracing::trace;

use crate::error::{ErrorKind, Result};
use crate::expr::{MinMaxOp, ParamKind, TypedExpr};
use crate::parsing::ast::{
    BooleanTestKind, IndirectionItem, RawExpr, RawLiteral, TypeName,
};
use crate::types::{DataType, Value, NO_TYPMOD};

use super::coercion::{coerce_to_boolean, coerce_to_target_type};
use super::context::AnalysisContext;
use super::{columns, composite, functions, operators, percentile, subquery};

impl<'a> AnalysisContext<'a> {
    /// Analyze one raw expression into its typed form.
    pub fn transform(&mut self, expr: &RawExpr) -> Result<TypedExpr> {
        self.descend(expr.location())?;
        let result = self.transform_inner(expr);
        self.ascend();
        result.map_err(|e| e.at(expr.location()))
    }

    fn transform_inner(&mut self, expr: &RawExpr) -> Result<TypedExpr> {
        match expr {
            RawExpr::ColumnRef { names, location } => {
                columns::transform_column_ref(self, names, *location)
            }
            RawExpr::Parameter { number, location } => self.transform_param(*number, *location),
            RawExpr::Indirection {
                arg,
                items,
                location,
            } => self.transform_indirection(arg, items, *location),
            RawExpr::Literal {
                value,
                type_name,
                location,
            } => self.transform_literal(value, type_name.as_ref(), *location),
            RawExpr::TypeCast {
                arg,
                type_name,
                location,
            } => self.transform_typecast(arg, type_name, *location),
            RawExpr::Unary { op, arg, location } => {
                operators::transform_unary(self, op, arg, *location)
            }
            RawExpr::Binary {
                op,
                left,
                right,
                location,
            } => operators::transform_binary(self, op, left, right, *location),
            RawExpr::AnyAll {
                op,
                quantifier,
                left,
                right,
                location,
            } => operators::transform_any_all(self, op, *quantifier, left, right, *location),
            RawExpr::Distinct {
                negated,
                left,
                right,
                location,
            } => operators::transform_distinct(self, *negated, left, right, *location),
            RawExpr::NullIf {
                left,
                right,
                location,
            } => operators::transform_nullif(self, left, right, *location),
            RawExpr::IsOf {
                negated,
                arg,
                types,
                location,
            } => operators::transform_is_of(self, *negated, arg, types, *location),
            RawExpr::InList {
                negated,
                left,
                items,
                location,
            } => operators::transform_in_list(self, *negated, left, items, *location),
            RawExpr::BoolOp { op, args, location } => {
                operators::transform_bool_op(self, *op, args, *location)
            }
            RawExpr::FunctionCall {
                name,
                args,
                distinct,
                star,
                over_window,
                location,
            } => functions::transform_function_call(
                self,
                name,
                args,
                *distinct,
                *star,
                *over_window,
                *location,
            ),
            RawExpr::Case {
                operand,
                whens,
                default,
                location,
            } => composite::transform_case(
                self,
                operand.as_deref(),
                whens,
                default.as_deref(),
                *location,
            ),
            RawExpr::ArrayConstructor { elements, location } => {
                composite::transform_array(self, elements, None, *location)
            }
            RawExpr::Row { elements, .. } => composite::transform_row(self, elements),
            RawExpr::Coalesce { args, location } => {
                composite::transform_coalesce(self, args, *location)
            }
            RawExpr::Greatest { args, location } => {
                composite::transform_minmax(self, MinMaxOp::Greatest, args, *location)
            }
            RawExpr::Least { args, location } => {
                composite::transform_minmax(self, MinMaxOp::Least, args, *location)
            }
            RawExpr::XmlConstruct {
                op,
                name,
                named_args,
                args,
                xml_option,
                location,
            } => composite::transform_xml(
                self,
                *op,
                name.as_deref(),
                named_args,
                args,
                *xml_option,
                *location,
            ),
            RawExpr::XmlSerialize {
                arg,
                type_name,
                location,
            } => composite::transform_xml_serialize(self, arg, type_name, *location),
            RawExpr::SubLink {
                kind,
                test,
                operator,
                payload,
                location,
            } => subquery::transform_sublink(
                self,
                *kind,
                test.as_deref(),
                operator.as_deref(),
                payload,
                *location,
            ),
            RawExpr::TableValue { payload, location } => {
                subquery::transform_table_value(self, payload, *location)
            }
            RawExpr::NullTest { negated, arg, .. } => {
                let arg = self.transform(arg)?;
                Ok(TypedExpr::NullTest {
                    negated: *negated,
                    arg: Box::new(arg),
                })
            }
            RawExpr::BooleanTest {
                kind,
                arg,
                location,
            } => self.transform_boolean_test(*kind, arg, *location),
            RawExpr::Grouping { args, .. } => composite::transform_grouping(self, args),
            RawExpr::GroupId { .. } => Ok(TypedExpr::GroupId),
            RawExpr::Percentile {
                kind,
                args,
                sort,
                location,
            } => percentile::transform_percentile(self, *kind, args, sort, *location),
            RawExpr::CurrentOf { cursor, location } => {
                subquery::transform_current_of(self, cursor, *location)
            }
            RawExpr::SetDefault { .. } => Ok(TypedExpr::SetToDefault {
                ty: DataType::Unknown,
                typmod: NO_TYPMOD,
            }),
            RawExpr::PartitionBound {
                start,
                end,
                every,
                ..
            } => composite::transform_partition_bound(self, start, end, every),
            RawExpr::Resolved(resolved) => self.transform_resolved(resolved),
        }
    }

    fn transform_param(&mut self, number: u32, location: Option<usize>) -> Result<TypedExpr> {
        let ty = self.seed_param(number).map_err(|e| e.at(location))?;
        Ok(TypedExpr::Parameter {
            kind: ParamKind::External { number },
            ty,
            typmod: NO_TYPMOD,
        })
    }

    /// Literal constants. An integer that fits in 32 bits is `int4`;
    /// decimal-form numbers that parse as a whole 64-bit value are `int8`,
    /// everything else numeric. String literals stay untyped until context
    /// claims them. A literal annotated with a type name coerces to it.
    fn transform_literal(
        &mut self,
        value: &RawLiteral,
        type_name: Option<&TypeName>,
        location: Option<usize>,
    ) -> Result<TypedExpr> {
        let constant = match value {
            RawLiteral::Integer(v) => {
                if i32::try_from(*v).is_ok() {
                    TypedExpr::constant(Value::Integer(*v), DataType::Int32)
                } else {
                    TypedExpr::constant(Value::Integer(*v), DataType::Int64)
                }
            }
            RawLiteral::Decimal(text) => match text.parse::<i64>() {
                Ok(v) => TypedExpr::constant(Value::Integer(v), DataType::Int64),
                Err(_) => {
                    let v = Value::parse_as(&DataType::Numeric, text)
                        .map_err(|e| e.at(location))?;
                    TypedExpr::constant(v, DataType::Numeric)
                }
            },
            RawLiteral::String(s) => {
                TypedExpr::constant(Value::String(s.clone()), DataType::Unknown)
            }
            RawLiteral::Boolean(b) => TypedExpr::bool_constant(*b),
            RawLiteral::Null => TypedExpr::null_constant(DataType::Unknown),
        };
        match type_name {
            None => Ok(constant),
            Some(tn) => {
                let (ty, typmod) = self
                    .catalog
                    .resolve_type(tn)
                    .map_err(|e| e.at(tn.location.or(location)))?;
                coerce_to_target_type(self, constant, &ty, typmod, true, location)
            }
        }
    }

    fn transform_typecast(
        &mut self,
        arg: &RawExpr,
        type_name: &TypeName,
        location: Option<usize>,
    ) -> Result<TypedExpr> {
        let (ty, typmod) = self
            .catalog
            .resolve_type(type_name)
            .map_err(|e| e.at(type_name.location.or(location)))?;
        // a bare array constructor adopts the cast's target type directly,
        // which also legitimizes the empty constructor
        let arg_t = match arg {
            RawExpr::ArrayConstructor { elements, location: inner }
                if ty.element_type().is_some() =>
            {
                self.descend(*inner)?;
                let built = composite::transform_array(self, elements, Some(&ty), *inner);
                self.ascend();
                built.map_err(|e| e.at(inner.or(location)))?
            }
            _ => self.transform(arg)?,
        };
        coerce_to_target_type(self, arg_t, &ty, typmod, true, location)
    }

    /// Postfix indirection: runs of subscripts collapse into one subscript
    /// node, and each field step either selects from a composite or falls
    /// back to function-call notation.
    fn transform_indirection(
        &mut self,
        arg: &RawExpr,
        items: &[IndirectionItem],
        location: Option<usize>,
    ) -> Result<TypedExpr> {
        let mut result = self.transform(arg)?;
        let mut pending: Vec<&IndirectionItem> = Vec::new();
        for item in items {
            match item {
                IndirectionItem::Subscript(_) | IndirectionItem::Slice { .. } => {
                    pending.push(item)
                }
                IndirectionItem::Field(name) => {
                    if !pending.is_empty() {
                        result =
                            self.transform_subscripts(result, &std::mem::take(&mut pending), location)?;
                    }
                    result = functions::field_or_function(self, name, result, location)?;
                }
            }
        }
        if !pending.is_empty() {
            result = self.transform_subscripts(result, &pending, location)?;
        }
        Ok(result)
    }

    fn transform_subscripts(
        &mut self,
        array: TypedExpr,
        items: &[&IndirectionItem],
        location: Option<usize>,
    ) -> Result<TypedExpr> {
        let array_ty = array.data_type();
        let elem_ty = array_ty
            .element_type()
            .cloned()
            .ok_or_else(|| ErrorKind::NotAnArray(array_ty.to_string()).at(location))?;
        let typmod = array.type_modifier();
        let slice = items
            .iter()
            .any(|i| matches!(i, IndirectionItem::Slice { .. }));

        let mut upper = Vec::with_capacity(items.len());
        let mut lower = Vec::with_capacity(items.len());
        for item in items {
            match item {
                IndirectionItem::Subscript(e) => {
                    upper.push(self.transform_subscript_index(e, location)?);
                    lower.push(None);
                }
                // the caller peels fields off before collapsing subscripts
                IndirectionItem::Field(_) => unreachable!("field in subscript run"),
                IndirectionItem::Slice {
                    lower: lo,
                    upper: up,
                } => {
                    let up = up.as_deref().ok_or_else(|| {
                        ErrorKind::Syntax("array slice must specify both bounds".into())
                            .at(location)
                    })?;
                    let lo = lo.as_deref().ok_or_else(|| {
                        ErrorKind::Syntax("array slice must specify both bounds".into())
                            .at(location)
                    })?;
                    upper.push(self.transform_subscript_index(up, location)?);
                    lower.push(Some(self.transform_subscript_index(lo, location)?));
                }
            }
        }
        trace!(array = ?array_ty, slice, "resolved subscript chain");
        Ok(TypedExpr::Subscript {
            array: Box::new(array),
            upper,
            lower,
            slice,
            array_ty,
            elem_ty,
            typmod,
        })
    }

    fn transform_subscript_index(
        &mut self,
        expr: &RawExpr,
        location: Option<usize>,
    ) -> Result<TypedExpr> {
        let t = self.transform(expr)?;
        coerce_to_target_type(self, t, &DataType::Int32, NO_TYPMOD, false, location)
    }

    fn transform_boolean_test(
        &mut self,
        kind: BooleanTestKind,
        arg: &RawExpr,
        location: Option<usize>,
    ) -> Result<TypedExpr> {
        let construct = match kind {
            BooleanTestKind::IsTrue => "IS TRUE",
            BooleanTestKind::IsNotTrue => "IS NOT TRUE",
            BooleanTestKind::IsFalse => "IS FALSE",
            BooleanTestKind::IsNotFalse => "IS NOT FALSE",
            BooleanTestKind::IsUnknown => "IS UNKNOWN",
            BooleanTestKind::IsNotUnknown => "IS NOT UNKNOWN",
        };
        let t = self.transform(arg)?;
        let t = coerce_to_boolean(self, construct, t, location)?;
        Ok(TypedExpr::BooleanTest {
            kind,
            arg: Box::new(t),
        })
    }

    /// Already-resolved nodes pass through untouched, except for resolved
    /// row comparisons: those only arise when a tree is spliced together
    /// incorrectly, so they fail as an internal inconsistency.
    fn transform_resolved(&mut self, resolved: &TypedExpr) -> Result<TypedExpr> {
        match resolved {
            TypedExpr::RowCompare { .. } => {
                Err(ErrorKind::UnrecognizedNode(resolved.node_kind().to_string()).into())
            }
            _ => Ok(resolved.clone()),
        }
    }
}
