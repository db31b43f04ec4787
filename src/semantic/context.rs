//! Per-statement analysis state.
//!
//! The parameter table belongs to the outermost context and is shared by
//! handle into contexts for nested query levels, so a parameter first seen
//! deep inside a sublink still deduces its type in one place.

use std::cell::RefCell;
use std::rc::Rc;

use crate::catalog::subquery::SubqueryAnalyzer;
use crate::catalog::{Catalog, Namespace};
use crate::error::{ErrorKind, Result};
use crate::expr::TypedExpr;
use crate::types::DataType;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Rewrite `expr = NULL` into `expr IS NULL` for clients that expect
    /// that legacy behavior.
    pub transform_null_equals: bool,
    /// Maximum expression nesting depth before analysis refuses to recurse
    /// further.
    pub max_expression_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            transform_null_equals: false,
            max_expression_depth: 128,
        }
    }
}

/// The statement's parameter table, indexed by 1-based parameter number.
///
/// In variable mode referencing `$n` grows the table, seeding intermediate
/// slots as undetermined; types are then deduced from use. In fixed mode
/// the caller supplies all types up front and out-of-range references fail.
#[derive(Debug)]
pub struct ParamTable {
    types: Vec<Option<DataType>>,
    variable: bool,
}

impl ParamTable {
    pub fn variable() -> Self {
        Self {
            types: Vec::new(),
            variable: true,
        }
    }

    pub fn fixed(types: Vec<DataType>) -> Self {
        Self {
            types: types.into_iter().map(Some).collect(),
            variable: false,
        }
    }

    /// The current type of `$number`, seeding the slot in variable mode.
    pub fn seed(&mut self, number: u32) -> Result<DataType> {
        if number == 0 {
            return Err(ErrorKind::UndefinedParameter(0).into());
        }
        let idx = number as usize - 1;
        if self.variable {
            if self.types.len() <= idx {
                self.types.resize(idx + 1, None);
            }
            let slot = &mut self.types[idx];
            if slot.is_none() {
                *slot = Some(DataType::Unknown);
            }
            Ok(slot.clone().unwrap_or(DataType::Unknown))
        } else {
            self.types
                .get(idx)
                .cloned()
                .flatten()
                .ok_or_else(|| ErrorKind::UndefinedParameter(number).into())
        }
    }

    /// Record a type deduced for `$number` from context. Conflicting
    /// deductions fail; `Unknown` never overrides a real type.
    pub fn refine(&mut self, number: u32, ty: &DataType) -> Result<()> {
        let idx = number as usize - 1;
        let slot = self
            .types
            .get_mut(idx)
            .ok_or_else(|| crate::error::Error::from(ErrorKind::UndefinedParameter(number)))?;
        match slot {
            None | Some(DataType::Unknown) => {
                *slot = Some(ty.clone());
                Ok(())
            }
            Some(existing) if existing == ty || *ty == DataType::Unknown => Ok(()),
            Some(existing) => Err(ErrorKind::InconsistentParameterTypes {
                number,
                first: existing.to_string(),
                second: ty.to_string(),
            }
            .into()),
        }
    }

    /// Deduced types so far; undetermined slots are `None`.
    pub fn deduced(&self) -> Vec<Option<DataType>> {
        self.types.clone()
    }
}

/// Analysis state for one query level.
pub struct AnalysisContext<'a> {
    pub catalog: &'a dyn Catalog,
    pub namespace: &'a mut dyn Namespace,
    pub subqueries: &'a dyn SubqueryAnalyzer,
    pub config: AnalysisConfig,
    params: Rc<RefCell<ParamTable>>,
    depth: usize,
    value_substitute: Option<TypedExpr>,
    has_aggregates: bool,
    has_sublinks: bool,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        namespace: &'a mut dyn Namespace,
        subqueries: &'a dyn SubqueryAnalyzer,
    ) -> Self {
        Self {
            catalog,
            namespace,
            subqueries,
            config: AnalysisConfig::default(),
            params: Rc::new(RefCell::new(ParamTable::variable())),
            depth: 0,
            value_substitute: None,
            has_aggregates: false,
            has_sublinks: false,
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_params(mut self, params: ParamTable) -> Self {
        self.params = Rc::new(RefCell::new(params));
        self
    }

    /// Handle to the parameter table, for building a context at a nested
    /// query level that shares deductions with this one.
    pub fn param_handle(&self) -> Rc<RefCell<ParamTable>> {
        Rc::clone(&self.params)
    }

    /// Adopt an outer level's parameter table.
    pub fn with_shared_params(mut self, params: Rc<RefCell<ParamTable>>) -> Self {
        self.params = params;
        self
    }

    /// Install the expression VALUE refers to inside a domain CHECK
    /// constraint.
    pub fn set_value_substitute(&mut self, expr: TypedExpr) {
        self.value_substitute = Some(expr);
    }

    pub fn value_substitute(&self) -> Option<&TypedExpr> {
        self.value_substitute.as_ref()
    }

    pub(crate) fn seed_param(&self, number: u32) -> Result<DataType> {
        self.params.borrow_mut().seed(number)
    }

    pub(crate) fn refine_param(&self, number: u32, ty: &DataType) -> Result<()> {
        self.params.borrow_mut().refine(number, ty)
    }

    /// CURRENT OF $n: the parameter must hold a cursor name.
    pub(crate) fn bind_cursor_param(&self, number: u32) -> Result<()> {
        self.seed_param(number)?;
        self.refine_param(number, &DataType::RefCursor)
    }

    pub fn deduced_params(&self) -> Vec<Option<DataType>> {
        self.params.borrow().deduced()
    }

    pub(crate) fn note_aggregate(&mut self) {
        self.has_aggregates = true;
    }

    pub(crate) fn note_sublink(&mut self) {
        self.has_sublinks = true;
    }

    pub fn has_aggregates(&self) -> bool {
        self.has_aggregates
    }

    pub fn has_sublinks(&self) -> bool {
        self.has_sublinks
    }

    /// Depth guard around each dispatcher entry. Fails deterministically
    /// before native-stack recursion can run away.
    pub(crate) fn descend(&mut self, location: Option<usize>) -> Result<()> {
        if self.depth >= self.config.max_expression_depth {
            return Err(
                ErrorKind::ExpressionTooComplex(self.config.max_expression_depth).at(location)
            );
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth -= 1;
    }
}
