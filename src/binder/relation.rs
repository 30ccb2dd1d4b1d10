// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Collects the table names a statement reads from.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::ControlFlow;

use itertools::Itertools;

use crate::parser::*;

/// A table name as written, one entry per part of a qualified name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableName(Vec<String>);

impl TableName {
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// The name if it is not qualified.
    pub fn bare(&self) -> Option<&str> {
        match self.0.as_slice() {
            [name] => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("."))
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        TableName(vec![name.to_string()])
    }
}

/// Returns the distinct table names referenced by `stmts`, as written.
///
/// Only references to base tables are returned. Names of CTEs in scope, derived
/// tables and table functions contribute nothing.
pub fn extract_relations(stmts: &[Statement]) -> BTreeSet<TableName> {
    let mut collector = RelationCollector::default();
    for stmt in stmts {
        let _ = stmt.visit(&mut collector);
    }
    collector.relations
}

/// The CTEs defined by one query.
///
/// A CTE body sees the CTEs defined before it, and itself if the clause is
/// recursive. The main body sees all of them.
#[derive(Default)]
struct CteScope {
    names: Vec<String>,
    recursive: bool,
    /// Number of CTE bodies visited so far.
    visited: usize,
}

impl CteScope {
    fn contains(&self, name: &str) -> bool {
        let visible = if self.recursive && self.visited < self.names.len() {
            self.visited + 1
        } else {
            self.visited
        };
        self.names[..visible].iter().any(|cte| cte == name)
    }
}

#[derive(Default)]
struct RelationCollector {
    /// One scope per enclosing query, innermost last.
    scopes: Vec<CteScope>,
    relations: BTreeSet<TableName>,
}

impl RelationCollector {
    fn is_cte(&self, name: &TableName) -> bool {
        name.bare()
            .is_some_and(|name| self.scopes.iter().any(|scope| scope.contains(name)))
    }
}

impl Visitor for RelationCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        let scope = match &query.with {
            Some(with) => CteScope {
                names: with
                    .cte_tables
                    .iter()
                    .map(|cte| cte.alias.name.value.clone())
                    .collect(),
                recursive: with.recursive,
                visited: 0,
            },
            None => CteScope::default(),
        };
        self.scopes.push(scope);
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<()> {
        self.scopes.pop();
        // The `WITH` clause is visited before the body, so while the parent still
        // has CTEs left, the query just finished is the body of the next one.
        if let Some(parent) = self.scopes.last_mut()
            && parent.visited < parent.names.len()
        {
            parent.visited += 1;
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<()> {
        if let TableFactor::Table {
            name, args: None, ..
        } = table_factor
        {
            let name = table_name(name);
            if !self.is_cte(&name) {
                self.relations.insert(name);
            }
        }
        ControlFlow::Continue(())
    }
}

fn table_name(name: &ObjectName) -> TableName {
    TableName(
        name.0
            .iter()
            .filter_map(|part| match part {
                ObjectNamePart::Identifier(ident) => Some(ident.value.clone()),
                #[allow(unreachable_patterns)]
                _ => None,
            })
            .collect(),
    )
}
