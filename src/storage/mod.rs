// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! File formats of the datasets under a storage root.
//!
//! Every format has a path layout ([`PathResolver`]) that turns a table name into a
//! dataset location, and a set of read options ([`FormatOptions`]) used to open that
//! location through the engine.

use std::path::Path;
use std::str::FromStr;

pub use self::error::ResolveError;
pub use self::options::*;
pub use self::resolver::*;
use crate::config::ConfigError;

mod error;
mod options;
mod resolver;

/// Supported storage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    /// Delimited text. Each table is a directory of `.csv` files.
    Csv,
    /// Apache Parquet. Each table is a directory of `.parquet` files.
    Parquet,
    /// Newline-delimited JSON. Each table is a single `<table>.json` file.
    Json,
    /// Arrow IPC. Each table is a single `<table>.arrow` file.
    Arrow,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Csv, Format::Parquet, Format::Json, Format::Arrow];

    /// Lowercase name of the format, also the prefix of its options.
    pub const fn name(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Parquet => "parquet",
            Format::Json => "json",
            Format::Arrow => "arrow",
        }
    }

    /// Returns the path layout of the format.
    pub fn resolver(self) -> &'static dyn PathResolver {
        match self {
            Format::Csv | Format::Parquet => &DirectoryLayout,
            Format::Json => &JSON_LAYOUT,
            Format::Arrow => &ARROW_LAYOUT,
        }
    }

    /// Resolve the location of `table` under `root`.
    pub fn resolve(self, root: &str, table: &str) -> Result<String, ResolveError> {
        check_table_name(table)?;
        Ok(self.resolver().resolve(root, table))
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownFormat(s.to_string()))
    }
}

/// Returns the filesystem path of `location` if it is on the local filesystem.
///
/// Plain paths and `file:` URLs, with or without `//`, are local. Locations with any
/// other scheme are left to the engine's object stores.
pub fn local_path(location: &str) -> Option<&Path> {
    if let Some(path) = location
        .strip_prefix("file://")
        .or_else(|| location.strip_prefix("file:"))
    {
        return Some(Path::new(path));
    }
    if location.contains("://") {
        return None;
    }
    Some(Path::new(location))
}

/// Rejects names that would not map to a distinct entry directly under the root.
fn check_table_name(table: &str) -> Result<(), ResolveError> {
    if table.is_empty() || table == "." || table == ".." || table.contains(['/', '\\']) {
        return Err(ResolveError::InvalidTableName(table.into()));
    }
    Ok(())
}
