// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! The error type of bind operations.
//!
//! To raise an error in binder, construct an `ErrorKind` and convert it:
//!
//! ```ignore
//! return Err(ErrorKind::Open { table, path, source }.into());
//! ```

use datafusion::error::DataFusionError;

use crate::parser::ParserError;
use crate::storage::ResolveError;

/// The error type of bind operations.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct BindError(Box<ErrorKind>);

/// The error type of bind operations.
#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    #[error("parse error: {0}")]
    Parse(#[source] ParserError),
    #[error(transparent)]
    Resolve(ResolveError),
    #[error("failed to open table {table:?} at {path:?}: {source}")]
    Open {
        table: String,
        path: String,
        #[source]
        source: DataFusionError,
    },
    #[error("failed to register table {table:?}: {source}")]
    Register {
        table: String,
        #[source]
        source: DataFusionError,
    },
}

impl BindError {
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }
}

impl From<ErrorKind> for BindError {
    fn from(kind: ErrorKind) -> Self {
        BindError(Box::new(kind))
    }
}

impl From<ParserError> for BindError {
    fn from(e: ParserError) -> Self {
        ErrorKind::Parse(e).into()
    }
}

impl From<ResolveError> for BindError {
    fn from(e: ResolveError) -> Self {
        ErrorKind::Resolve(e).into()
    }
}
