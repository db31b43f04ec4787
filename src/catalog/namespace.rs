//! The statement's range-table view: what relations and columns are in
//! scope at each query nesting level.

use crate::error::{ErrorKind, Result};
use crate::types::{DataType, NO_TYPMOD};
use std::collections::HashMap;

use super::CompositeColumn;

/// A successful column lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnHit {
    pub rel: usize,
    /// 0-based attribute index within the relation.
    pub attr: u32,
    pub ty: DataType,
    pub typmod: i32,
    pub levels_up: u32,
}

/// What kind of range-table entry a relation is; decides the type of a
/// whole-row reference to it.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationKind {
    /// Base relation; whole-row references take its named composite type.
    Table { rowtype: String },
    /// Function in FROM; whole-row references take the function's result
    /// type (composite or scalar).
    Function { result: DataType },
    /// Whole-row references to these are anonymous records.
    Join,
    Subquery,
    Values,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationHit {
    pub index: usize,
    pub levels_up: u32,
    pub kind: RelationKind,
}

pub trait Namespace {
    /// Unqualified column lookup across all relations in scope, innermost
    /// level first. Two hits at the same level are ambiguous.
    fn resolve_unqualified(&self, name: &str) -> Result<Option<ColumnHit>>;

    /// Qualified `rel.col` lookup.
    fn resolve_column(
        &self,
        schema: Option<&str>,
        rel: &str,
        name: &str,
    ) -> Result<Option<ColumnHit>>;

    fn resolve_relation(&self, schema: Option<&str>, rel: &str) -> Option<RelationHit>;

    /// Add a range-table entry for a relation referenced before being
    /// listed in FROM, when the namespace permits that.
    fn implicit_relation(&mut self, _schema: Option<&str>, _rel: &str) -> Result<Option<RelationHit>> {
        Ok(None)
    }

    /// The UPDATE/DELETE target relation, for CURRENT OF.
    fn target_relation(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone)]
struct RelationEntry {
    schema: Option<String>,
    name: String,
    kind: RelationKind,
    columns: Vec<CompositeColumn>,
}

/// A straightforward in-memory [`Namespace`]. Outer query levels chain
/// through `outer`; correlated references resolve there with bumped
/// nesting depth.
#[derive(Debug, Default)]
pub struct SimpleNamespace {
    relations: Vec<RelationEntry>,
    outer: Option<Box<SimpleNamespace>>,
    known_tables: HashMap<String, Vec<CompositeColumn>>,
    allow_implicit: bool,
    target: Option<usize>,
}

impl SimpleNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, name: &str, columns: Vec<CompositeColumn>) -> usize {
        self.push(RelationEntry {
            schema: None,
            name: name.to_string(),
            kind: RelationKind::Table {
                rowtype: name.to_string(),
            },
            columns,
        })
    }

    pub fn add_subquery(&mut self, alias: &str, columns: Vec<CompositeColumn>) -> usize {
        self.push(RelationEntry {
            schema: None,
            name: alias.to_string(),
            kind: RelationKind::Subquery,
            columns,
        })
    }

    pub fn add_join(&mut self, alias: &str, columns: Vec<CompositeColumn>) -> usize {
        self.push(RelationEntry {
            schema: None,
            name: alias.to_string(),
            kind: RelationKind::Join,
            columns,
        })
    }

    pub fn add_values(&mut self, alias: &str, columns: Vec<CompositeColumn>) -> usize {
        self.push(RelationEntry {
            schema: None,
            name: alias.to_string(),
            kind: RelationKind::Values,
            columns,
        })
    }

    pub fn add_function(&mut self, alias: &str, result: DataType) -> usize {
        self.push(RelationEntry {
            schema: None,
            name: alias.to_string(),
            kind: RelationKind::Function {
                result: result.clone(),
            },
            columns: vec![CompositeColumn::new(alias, result)],
        })
    }

    fn push(&mut self, entry: RelationEntry) -> usize {
        self.relations.push(entry);
        self.relations.len() - 1
    }

    /// Chain an outer query level behind this one.
    pub fn with_outer(mut self, outer: SimpleNamespace) -> Self {
        self.outer = Some(Box::new(outer));
        self
    }

    /// Permit references to `name` to add a range-table entry on first use.
    pub fn register_known_table(&mut self, name: &str, columns: Vec<CompositeColumn>) {
        self.allow_implicit = true;
        self.known_tables.insert(name.to_string(), columns);
    }

    pub fn set_target(&mut self, rel: usize) {
        self.target = Some(rel);
    }

    fn find_relation(&self, schema: Option<&str>, rel: &str) -> Option<(usize, &RelationEntry)> {
        self.relations.iter().enumerate().find(|(_, e)| {
            e.name == rel && (schema.is_none() || e.schema.as_deref() == schema)
        })
    }
}

impl Namespace for SimpleNamespace {
    fn resolve_unqualified(&self, name: &str) -> Result<Option<ColumnHit>> {
        let mut hit: Option<ColumnHit> = None;
        for (rel_idx, entry) in self.relations.iter().enumerate() {
            for (attr, col) in entry.columns.iter().enumerate() {
                if col.name == name {
                    if hit.is_some() {
                        return Err(ErrorKind::AmbiguousColumn(name.to_string()).into());
                    }
                    hit = Some(ColumnHit {
                        rel: rel_idx,
                        attr: attr as u32,
                        ty: col.ty.clone(),
                        typmod: col.typmod,
                        levels_up: 0,
                    });
                }
            }
        }
        if hit.is_some() {
            return Ok(hit);
        }
        match &self.outer {
            Some(outer) => Ok(outer.resolve_unqualified(name)?.map(|mut h| {
                h.levels_up += 1;
                h
            })),
            None => Ok(None),
        }
    }

    fn resolve_column(
        &self,
        schema: Option<&str>,
        rel: &str,
        name: &str,
    ) -> Result<Option<ColumnHit>> {
        if let Some((rel_idx, entry)) = self.find_relation(schema, rel) {
            let found = entry.columns.iter().enumerate().find_map(|(attr, col)| {
                (col.name == name).then(|| ColumnHit {
                    rel: rel_idx,
                    attr: attr as u32,
                    ty: col.ty.clone(),
                    typmod: col.typmod,
                    levels_up: 0,
                })
            });
            return Ok(found);
        }
        match &self.outer {
            Some(outer) => Ok(outer.resolve_column(schema, rel, name)?.map(|mut h| {
                h.levels_up += 1;
                h
            })),
            None => Ok(None),
        }
    }

    fn resolve_relation(&self, schema: Option<&str>, rel: &str) -> Option<RelationHit> {
        if let Some((index, entry)) = self.find_relation(schema, rel) {
            return Some(RelationHit {
                index,
                levels_up: 0,
                kind: entry.kind.clone(),
            });
        }
        self.outer.as_ref().and_then(|outer| {
            outer.resolve_relation(schema, rel).map(|mut h| {
                h.levels_up += 1;
                h
            })
        })
    }

    fn implicit_relation(
        &mut self,
        _schema: Option<&str>,
        rel: &str,
    ) -> Result<Option<RelationHit>> {
        if !self.allow_implicit {
            return Ok(None);
        }
        match self.known_tables.get(rel) {
            Some(columns) => {
                let columns = columns.clone();
                let index = self.add_table(rel, columns);
                Ok(Some(RelationHit {
                    index,
                    levels_up: 0,
                    kind: RelationKind::Table {
                        rowtype: rel.to_string(),
                    },
                }))
            }
            None => Ok(None),
        }
    }

    fn target_relation(&self) -> Option<usize> {
        self.target
    }
}

/// Shorthand for building column lists in callers and tests.
pub fn column(name: &str, ty: DataType) -> CompositeColumn {
    CompositeColumn {
        name: name.to_string(),
        ty,
        typmod: NO_TYPMOD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tables() -> SimpleNamespace {
        let mut ns = SimpleNamespace::new();
        ns.add_table(
            "orders",
            vec![column("id", DataType::Int32), column("total", DataType::Numeric)],
        );
        ns.add_table(
            "customers",
            vec![column("id", DataType::Int32), column("name", DataType::Text)],
        );
        ns
    }

    #[test]
    fn test_unqualified_unique_hit() {
        let ns = two_tables();
        let hit = ns.resolve_unqualified("total").unwrap().unwrap();
        assert_eq!((hit.rel, hit.attr), (0, 1));
        assert_eq!(hit.ty, DataType::Numeric);
    }

    #[test]
    fn test_unqualified_ambiguous() {
        let ns = two_tables();
        let err = ns.resolve_unqualified("id").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::AmbiguousColumn("id".into()));
    }

    #[test]
    fn test_qualified_lookup() {
        let ns = two_tables();
        let hit = ns
            .resolve_column(None, "customers", "name")
            .unwrap()
            .unwrap();
        assert_eq!((hit.rel, hit.attr), (1, 1));
    }

    #[test]
    fn test_outer_level_bumps_levels_up() {
        let outer = two_tables();
        let inner = SimpleNamespace::new().with_outer(outer);
        let hit = inner.resolve_unqualified("name").unwrap().unwrap();
        assert_eq!(hit.levels_up, 1);
    }

    #[test]
    fn test_implicit_relation_only_when_registered() {
        let mut ns = SimpleNamespace::new();
        assert_eq!(ns.implicit_relation(None, "orders").unwrap(), None);
        ns.register_known_table("orders", vec![column("id", DataType::Int32)]);
        let hit = ns.implicit_relation(None, "orders").unwrap().unwrap();
        assert!(matches!(hit.kind, RelationKind::Table { .. }));
        assert!(ns.resolve_relation(None, "orders").is_some());
    }
}
