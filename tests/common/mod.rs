//! Common test utilities for expression analysis integration tests
#![allow(dead_code)]

use sql_semantic::catalog::namespace::column;
use sql_semantic::catalog::{
    BuiltinCatalog, CompositeColumn, DeclaredSubqueryAnalyzer, SimpleNamespace,
};
use sql_semantic::error::Result;
use sql_semantic::types::DataType;
use sql_semantic::{AnalysisConfig, AnalysisContext, ParamTable, RawExpr, TypedExpr};

/// Test context bundling a catalog, a namespace with a couple of stock
/// relations, and the pass-through subquery analyzer.
pub struct TestContext {
    pub catalog: BuiltinCatalog,
    pub namespace: SimpleNamespace,
    pub subqueries: DeclaredSubqueryAnalyzer,
    pub config: AnalysisConfig,
    params: Option<ParamTable>,
    deduced: Vec<Option<DataType>>,
}

impl TestContext {
    /// A context over `users (id int8, name text, email varchar(100), age int4)`
    /// and `orders (id int8, user_id int8, total numeric(10,2))`.
    pub fn new() -> Self {
        let mut catalog = BuiltinCatalog::new("testdb");
        catalog.register_composite("users", users_columns());
        catalog.register_composite("orders", orders_columns());

        let mut namespace = SimpleNamespace::new();
        namespace.add_table("users", users_columns());
        namespace.add_table("orders", orders_columns());

        Self {
            catalog,
            namespace,
            subqueries: DeclaredSubqueryAnalyzer,
            config: AnalysisConfig::default(),
            params: None,
            deduced: Vec::new(),
        }
    }

    /// A context with no relations in scope.
    pub fn empty() -> Self {
        Self {
            catalog: BuiltinCatalog::new("testdb"),
            namespace: SimpleNamespace::new(),
            subqueries: DeclaredSubqueryAnalyzer,
            config: AnalysisConfig::default(),
            params: None,
            deduced: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_params(mut self, params: ParamTable) -> Self {
        self.params = Some(params);
        self
    }

    /// Analyze one expression, recording deduced parameter types.
    pub fn transform(&mut self, expr: &RawExpr) -> Result<TypedExpr> {
        let mut ctx = AnalysisContext::new(&self.catalog, &mut self.namespace, &self.subqueries)
            .with_config(self.config.clone());
        if let Some(params) = self.params.take() {
            ctx = ctx.with_params(params);
        }
        let result = ctx.transform(expr);
        self.deduced = ctx.deduced_params();
        result
    }

    /// Parameter types deduced by the last `transform` call.
    pub fn deduced_params(&self) -> &[Option<DataType>] {
        &self.deduced
    }
}

pub fn users_columns() -> Vec<CompositeColumn> {
    vec![
        column("id", DataType::Int64),
        column("name", DataType::Text),
        CompositeColumn {
            typmod: 100,
            ..column("email", DataType::Varchar)
        },
        column("age", DataType::Int32),
    ]
}

pub fn orders_columns() -> Vec<CompositeColumn> {
    vec![
        column("id", DataType::Int64),
        column("user_id", DataType::Int64),
        CompositeColumn {
            typmod: sql_semantic::types::data_type::numeric_typmod(10, 2),
            ..column("total", DataType::Numeric)
        },
    ]
}
