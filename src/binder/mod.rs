// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use datafusion::prelude::SessionContext;
use datafusion::sql::TableReference;
use tracing::debug;

use crate::catalog::{SchemaRegistry, TableKey};
use crate::config::ConnectionInfo;
use crate::parser::*;
use crate::storage::{FormatOptions, ResolveError, local_path};

mod error;
mod relation;

pub use self::error::{BindError, ErrorKind};
pub use self::relation::{TableName, extract_relations};

pub type Result<T> = std::result::Result<T, BindError>;

/// The binder makes every table a statement reads from available in the session.
///
/// Each referenced table that is not registered yet is resolved to a dataset under
/// the storage root, opened with the connection's format, registered under its
/// name and recorded in the schema registry.
pub struct Binder<'a> {
    ctx: &'a SessionContext,
    info: &'a ConnectionInfo,
    options: &'a FormatOptions,
    registry: &'a SchemaRegistry,
}

impl<'a> Binder<'a> {
    pub fn new(
        ctx: &'a SessionContext,
        info: &'a ConnectionInfo,
        options: &'a FormatOptions,
        registry: &'a SchemaRegistry,
    ) -> Self {
        Binder {
            ctx,
            info,
            options,
            registry,
        }
    }

    /// Bind the tables of the SQL text. Returns the names bound by this call.
    ///
    /// The text is parsed with the session's SQL dialect. Nothing is executed.
    pub async fn bind(&self, sql: &str) -> Result<Vec<String>> {
        let dialect = self.ctx.copied_config().options().sql_parser.dialect.to_string();
        let stmts = parse_with_dialect(sql, &dialect)?;
        self.bind_stmts(&stmts).await
    }

    /// Bind the tables of parsed statements. Returns the names bound by this call.
    pub async fn bind_stmts(&self, stmts: &[Statement]) -> Result<Vec<String>> {
        let mut bound = vec![];
        for name in extract_relations(stmts) {
            if let Some(name) = self.bind_table(&name).await? {
                bound.push(name);
            }
        }
        Ok(bound)
    }

    /// Bind a table by name. Returns `None` if the session already knows it.
    async fn bind_table(&self, table: &TableName) -> Result<Option<String>> {
        let Some(name) = table.bare() else {
            return match qualified_reference(table.parts()) {
                Some(reference) if self.is_registered(&reference) => Ok(None),
                _ => Err(ResolveError::QualifiedName(table.to_string()).into()),
            };
        };
        if self.is_registered(&TableReference::bare(name)) {
            debug!(table = name, "already bound");
            return Ok(None);
        }

        let root = self.info.storage_root();
        let path = self.info.format().resolve(root, name)?;
        if let Some(local) = local_path(&path) {
            let exists = tokio::fs::try_exists(local).await.map_err(|e| {
                ResolveError::Inaccessible {
                    table: name.into(),
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;
            if !exists {
                return Err(ResolveError::DatasetNotFound {
                    root: root.into(),
                    table: name.into(),
                    path,
                }
                .into());
            }
        }

        debug!(table = name, %path, format = %self.info.format(), "opening dataset");
        let df = self
            .options
            .open(self.ctx, &path)
            .await
            .map_err(|source| ErrorKind::Open {
                table: name.into(),
                path: path.clone(),
                source,
            })?;
        let schema = Arc::clone(df.schema().inner());

        self.ctx
            .register_table(TableReference::bare(name), df.into_view())
            .map_err(|source| ErrorKind::Register {
                table: name.into(),
                source,
            })?;
        self.registry.upsert(TableKey::new(root, name), schema);
        debug!(table = name, %path, "table bound");
        Ok(Some(name.to_string()))
    }

    fn is_registered(&self, table: &TableReference) -> bool {
        // only fails for unknown catalogs or schemas
        self.ctx.table_exist(table.clone()).unwrap_or(false)
    }
}

/// Builds a reference from the parts of a qualified name, keeping each as written.
fn qualified_reference(parts: &[String]) -> Option<TableReference> {
    match parts {
        [schema, table] => Some(TableReference::partial(schema.as_str(), table.as_str())),
        [catalog, schema, table] => Some(TableReference::full(
            catalog.as_str(),
            schema.as_str(),
            table.as_str(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::config::Properties;

    use super::*;

    fn csv_info(root: &str) -> ConnectionInfo {
        let props = Properties::from([("format".to_string(), "csv".to_string())]);
        ConnectionInfo::new(root, props).unwrap()
    }

    fn write_orders(root: &std::path::Path) {
        let dir = root.join("orders");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("part-0.csv"), "id,name\n1,alice\n2,bob\n").unwrap();
    }

    #[tokio::test]
    async fn bind_once_per_session() {
        let dir = tempfile::tempdir().unwrap();
        write_orders(dir.path());
        let info = csv_info(dir.path().to_str().unwrap());
        let options = info.format_options().unwrap();
        let registry = SchemaRegistry::new();
        let ctx = SessionContext::new();
        let binder = Binder::new(&ctx, &info, &options, &registry);

        let bound = binder
            .bind("SELECT * FROM orders a JOIN orders b ON a.id = b.id")
            .await
            .unwrap();
        assert_eq!(bound, ["orders"]);
        assert!(ctx.table_exist("orders").unwrap());

        let bound = binder.bind("SELECT count(*) FROM orders").await.unwrap();
        assert!(bound.is_empty());
        assert_eq!(registry.len(), 1);

        let schema = registry
            .get(&TableKey::new(info.storage_root(), "ORDERS"))
            .unwrap();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, ["id", "name"]);
    }

    #[tokio::test]
    async fn dataset_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let info = csv_info(dir.path().to_str().unwrap());
        let options = info.format_options().unwrap();
        let registry = SchemaRegistry::new();
        let ctx = SessionContext::new();
        let binder = Binder::new(&ctx, &info, &options, &registry);

        let err = binder.bind("SELECT * FROM missing").await.unwrap_err();
        match err.kind() {
            ErrorKind::Resolve(ResolveError::DatasetNotFound { root, table, path }) => {
                assert_eq!(root, info.storage_root());
                assert_eq!(table, "missing");
                assert!(path.ends_with("/missing"), "{path}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn parse_error_binds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_orders(dir.path());
        let info = csv_info(dir.path().to_str().unwrap());
        let options = info.format_options().unwrap();
        let registry = SchemaRegistry::new();
        let ctx = SessionContext::new();
        let binder = Binder::new(&ctx, &info, &options, &registry);

        let err = binder.bind("SELECT * FROM orders WHERE").await.unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Parse(_)));
        assert!(registry.is_empty());
        assert!(!ctx.table_exist("orders").unwrap());
    }

    #[tokio::test]
    async fn qualified_names() {
        let dir = tempfile::tempdir().unwrap();
        let info = csv_info(dir.path().to_str().unwrap());
        let options = info.format_options().unwrap();
        let registry = SchemaRegistry::new();
        let ctx = SessionContext::new();
        let binder = Binder::new(&ctx, &info, &options, &registry);

        let bound = binder.bind("SELECT * FROM datafusion.public.t").await;
        assert!(matches!(
            bound.unwrap_err().kind(),
            ErrorKind::Resolve(ResolveError::QualifiedName(_))
        ));

        ctx.register_batch(
            "t",
            datafusion::arrow::record_batch::RecordBatch::new_empty(Arc::new(
                datafusion::arrow::datatypes::Schema::empty(),
            )),
        )
        .unwrap();
        let bound = binder.bind("SELECT * FROM public.t").await.unwrap();
        assert!(bound.is_empty());
    }

    #[tokio::test]
    async fn dotted_name_is_one_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("sales.2024");
        fs::create_dir_all(&table).unwrap();
        fs::write(table.join("part-0.csv"), "id\n1\n").unwrap();
        let info = csv_info(dir.path().to_str().unwrap());
        let options = info.format_options().unwrap();
        let registry = SchemaRegistry::new();
        let ctx = SessionContext::new();
        let binder = Binder::new(&ctx, &info, &options, &registry);

        let bound = binder.bind("SELECT * FROM \"sales.2024\"").await.unwrap();
        assert_eq!(bound, ["sales.2024"]);
        assert!(ctx.table_exist(TableReference::bare("sales.2024")).unwrap());
    }

    #[tokio::test]
    async fn inaccessible_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, "").unwrap();
        let info = csv_info(file.to_str().unwrap());
        let options = info.format_options().unwrap();
        let registry = SchemaRegistry::new();
        let ctx = SessionContext::new();
        let binder = Binder::new(&ctx, &info, &options, &registry);

        let err = binder.bind("SELECT * FROM orders").await.unwrap_err();
        match err.kind() {
            ErrorKind::Resolve(ResolveError::Inaccessible { table, path, .. }) => {
                assert_eq!(table, "orders");
                assert!(path.ends_with("not-a-dir/orders"), "{path}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn build_qualified_reference() {
        let parts = |name: &str| name.split('.').map(String::from).collect::<Vec<_>>();
        assert_eq!(
            qualified_reference(&parts("Sales.Orders")),
            Some(TableReference::partial("Sales", "Orders"))
        );
        assert_eq!(
            qualified_reference(&parts("c.s.t")),
            Some(TableReference::full("c", "s", "t"))
        );
        assert_eq!(qualified_reference(&parts("a.b.c.d")), None);
    }
}
