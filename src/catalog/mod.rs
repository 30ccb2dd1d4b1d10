// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Catalog of bound tables.
//!
//! Binding a table records its schema in a [`SchemaRegistry`]. Metadata queries are
//! answered from the registry alone, without touching storage again.

pub use self::descriptor::*;
pub use self::registry::*;

mod descriptor;
mod registry;

/// The error type of catalog operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("table {table:?} under {storage_root:?} has not been loaded, query it first")]
    NotLoaded { storage_root: String, table: String },
}
