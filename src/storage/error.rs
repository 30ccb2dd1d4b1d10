// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

/// The error type of resolving table names to datasets.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid table name {0:?}")]
    InvalidTableName(String),
    #[error("qualified table name {0:?} is not supported")]
    QualifiedName(String),
    #[error("dataset not found: table {table:?} under root {root:?} (resolved path {path:?})")]
    DatasetNotFound {
        root: String,
        table: String,
        path: String,
    },
    #[error("cannot access dataset of table {table:?} at {path:?}: {message}")]
    Inaccessible {
        table: String,
        path: String,
        message: String,
    },
}
