// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use datafusion::arrow::record_batch::RecordBatch;
use datafusion::error::DataFusionError;
use datafusion::execution::context::SQLOptions;
use datafusion::prelude::{DataFrame, SessionConfig, SessionContext};
use tracing::{debug, info};

use crate::binder::{self, BindError, Binder};
use crate::catalog::{
    CatalogError, ColumnDescriptor, SchemaRegistry, SchemaRegistryRef, TableDescriptor, TableKey,
    columns_to_batch, tables_to_batch,
};
use crate::config::{
    ConfigError, ConnectionInfo, ENGINE_PREFIX, EngineConfigProvider, Properties,
    load_config_property, parse_url,
};
use crate::parser::{ParserError, Statement, is_known_dialect, parse_with_dialect};
use crate::storage::FormatOptions;
use crate::types::TypeMappingError;

/// Engine options applied before the connection's own.
///
/// Identifiers keep their case so that a table name resolves to the same path, the
/// same registration and the same registry entry however it is written.
const DEFAULT_ENGINE_OPTIONS: [(&str, &str); 2] = [
    ("datafusion.sql_parser.enable_ident_normalization", "false"),
    ("datafusion.execution.time_zone", "+00:00"),
];

/// Open a session on the datasets under `storage_root`.
///
/// The `config` property, if set, names a TOML file whose settings are used as
/// defaults.
pub fn connect(storage_root: &str, properties: Properties) -> Result<Session, Error> {
    let properties = load_config_property(properties)?;
    let info = ConnectionInfo::new(storage_root, properties)?;
    Session::builder(info).build()
}

/// Open a session from a `filelight:<root>?k=v` URL.
///
/// Properties in the URL override `properties`.
pub fn connect_url(url: &str, mut properties: Properties) -> Result<Session, Error> {
    let (storage_root, url_properties) = parse_url(url)?;
    properties.extend(url_properties);
    let session = connect(&storage_root, properties)?;
    info!(
        root = session.info.storage_root(),
        format = %session.info.format(),
        "connected"
    );
    Ok(session)
}

/// A connection to the datasets under one storage root.
pub struct Session {
    info: Arc<ConnectionInfo>,
    ctx: SessionContext,
    options: FormatOptions,
    registry: SchemaRegistryRef,
    /// SQL dialect of the engine's parser.
    dialect: String,
}

impl Session {
    pub fn builder(info: ConnectionInfo) -> SessionBuilder {
        SessionBuilder {
            info,
            registry: None,
            config_provider: None,
        }
    }

    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    /// The engine context holding the tables bound so far.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn registry(&self) -> &SchemaRegistryRef {
        &self.registry
    }

    fn binder(&self) -> Binder<'_> {
        Binder::new(&self.ctx, &self.info, &self.options, &self.registry)
    }

    /// Bind the tables of a query and plan it.
    ///
    /// The returned frame is the engine's own. Rows are produced when it is
    /// collected or streamed. Only queries are accepted, and anything else is
    /// rejected before any table is bound.
    pub async fn execute_query(&self, sql: &str) -> Result<DataFrame, Error> {
        let stmts = parse_with_dialect(sql, &self.dialect)?;
        if let Some(stmt) = stmts
            .iter()
            .find(|stmt| !matches!(stmt, Statement::Query(_) | Statement::Explain { .. }))
        {
            let msg = format!("only queries are supported: {stmt}");
            return Err(DataFusionError::Plan(msg).into());
        }
        let bound = self.binder().bind_stmts(&stmts).await?;
        if !bound.is_empty() {
            debug!(tables = ?bound, "bound new tables");
        }
        let options = SQLOptions::new()
            .with_allow_ddl(false)
            .with_allow_dml(false)
            .with_allow_statements(false);
        Ok(self.ctx.sql_with_options(sql, options).await?)
    }

    /// Run a query and collect all its rows.
    pub async fn run(&self, sql: &str) -> Result<Vec<RecordBatch>, Error> {
        let df = self.execute_query(sql).await?;
        Ok(df.collect().await?)
    }

    /// Tables bound under this session's storage root, by any session sharing its
    /// registry.
    pub fn list_tables(&self) -> Vec<TableDescriptor> {
        self.registry
            .tables_under(self.info.storage_root())
            .into_iter()
            .map(|(key, _)| TableDescriptor::new(key.table_name()))
            .collect()
    }

    /// Columns of a bound table, in schema order.
    pub fn describe_table(&self, table: &str) -> Result<Vec<ColumnDescriptor>, Error> {
        let root = self.info.storage_root();
        let schema = self
            .registry
            .get(&TableKey::new(root, table))
            .ok_or_else(|| CatalogError::NotLoaded {
                storage_root: root.into(),
                table: table.into(),
            })?;
        Ok(ColumnDescriptor::from_schema(table, &schema)?)
    }

    /// [`Session::list_tables`] as a frame.
    pub fn tables(&self) -> Result<DataFrame, Error> {
        let batch = tables_to_batch(&self.list_tables()).map_err(DataFusionError::from)?;
        Ok(self.ctx.read_batch(batch)?)
    }

    /// [`Session::describe_table`] as a frame.
    pub fn columns(&self, table: &str) -> Result<DataFrame, Error> {
        let columns = self.describe_table(table)?;
        let batch = columns_to_batch(&columns).map_err(DataFusionError::from)?;
        Ok(self.ctx.read_batch(batch)?)
    }
}

/// Builds a [`Session`].
pub struct SessionBuilder {
    info: ConnectionInfo,
    registry: Option<SchemaRegistryRef>,
    config_provider: Option<Arc<dyn EngineConfigProvider>>,
}

impl SessionBuilder {
    /// Use `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: SchemaRegistryRef) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add engine options computed from the connection.
    pub fn config_provider(mut self, provider: Arc<dyn EngineConfigProvider>) -> Self {
        self.config_provider = Some(provider);
        self
    }

    pub fn build(self) -> Result<Session, Error> {
        let options = self.info.format_options()?;

        let mut config = SessionConfig::new();
        let defaults = DEFAULT_ENGINE_OPTIONS
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()));
        let provided = self
            .config_provider
            .as_ref()
            .map(|provider| provider.engine_options(&self.info))
            .unwrap_or_default();
        // later options override earlier ones
        for (key, value) in defaults
            .chain(self.info.engine_options())
            .chain(provided)
        {
            set_engine_option(&mut config, &key, &value)?;
        }

        let dialect = config.options().sql_parser.dialect.to_string();
        if !is_known_dialect(&dialect) {
            return Err(ConfigError::InvalidProperty(format!(
                "datafusion.sql_parser.dialect={dialect}"
            ))
            .into());
        }

        let ctx = SessionContext::new_with_config(config);
        let registry = self.registry.unwrap_or_else(SchemaRegistry::global);
        debug!(
            root = self.info.storage_root(),
            format = %self.info.format(),
            "session created"
        );
        Ok(Session {
            info: Arc::new(self.info),
            ctx,
            options,
            registry,
            dialect,
        })
    }
}

/// Engine option keys are lowercase, so the key is matched ignoring case.
fn set_engine_option(config: &mut SessionConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let key = key.to_ascii_lowercase();
    if !key.starts_with(&format!("{ENGINE_PREFIX}.")) {
        return Err(ConfigError::InvalidProperty(key));
    }
    config
        .options_mut()
        .set(&key, value)
        .map_err(ConfigError::Engine)
}

/// The error type of session operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("parse error: {0}")]
    Parse(#[from] ParserError),
    #[error("bind error: {0}")]
    Bind(#[from] BindError),
    #[error("type mapping error: {0}")]
    TypeMapping(#[from] TypeMappingError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("execute error: {0}")]
    Execute(#[from] DataFusionError),
}

/// Classification of [`Error`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid connection setup.
    Configuration,
    /// Malformed SQL.
    Parse,
    /// A table name without a dataset.
    Resolution,
    /// A column type without a relational mapping.
    TypeMapping,
    /// Metadata requested for a table that was never bound.
    NotLoaded,
    Execution,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Configuration,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Bind(e) => match e.kind() {
                binder::ErrorKind::Parse(_) => ErrorKind::Parse,
                binder::ErrorKind::Resolve(_) | binder::ErrorKind::Open { .. } => {
                    ErrorKind::Resolution
                }
                binder::ErrorKind::Register { .. } => ErrorKind::Execution,
            },
            Error::TypeMapping(_) => ErrorKind::TypeMapping,
            Error::Catalog(CatalogError::NotLoaded { .. }) => ErrorKind::NotLoaded,
            Error::Execute(_) => ErrorKind::Execution,
        }
    }
}
