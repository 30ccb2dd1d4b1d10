// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Connection configuration.
//!
//! A connection is described by a storage root, a storage format and a flat map of
//! string properties. Properties are namespaced by prefix:
//!
//! - `datafusion.*` options tune the engine and are passed on with their prefix.
//! - `<format>.*` options (e.g. `csv.has_header`) control how datasets are opened
//!   and are passed on with the prefix stripped.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use datafusion::error::DataFusionError;

pub use self::file::ConfigFile;
pub(crate) use self::file::load_config_property;
pub use self::url::{URL_PREFIX, accepts_url, parse_url};
use crate::storage::{Format, FormatOptions};

mod file;
mod url;

/// Flat connection properties.
pub type Properties = BTreeMap<String, String>;

/// Property naming the storage format.
pub const FORMAT_KEY: &str = "format";
/// Property naming a TOML configuration file.
pub const CONFIG_KEY: &str = "config";
/// Prefix of engine options.
pub const ENGINE_PREFIX: &str = "datafusion";

/// The error type of connection configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("storage root must be specified")]
    EmptyRoot,
    #[error("format must be specified")]
    MissingFormat,
    #[error("unknown format {0:?}")]
    UnknownFormat(String),
    #[error("invalid url {0:?}")]
    InvalidUrl(String),
    #[error("invalid property {0:?}")]
    InvalidProperty(String),
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown {format} option {key:?}")]
    UnknownOption { format: Format, key: String },
    #[error("invalid value {value:?} for option {key:?}: {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },
    #[error("invalid engine option: {0}")]
    Engine(#[source] DataFusionError),
}

/// Immutable description of a connection.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    storage_root: String,
    format: Format,
    properties: Properties,
}

impl ConnectionInfo {
    /// Create a connection description from a storage root and properties.
    ///
    /// The format is taken from the `format` property.
    pub fn new(storage_root: &str, properties: Properties) -> Result<Self, ConfigError> {
        let storage_root = normalize_root(storage_root)?;
        let format = properties
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(FORMAT_KEY))
            .map(|(_, value)| value.as_str())
            .ok_or(ConfigError::MissingFormat)?;
        let format = Format::from_str(format)?;
        Ok(ConnectionInfo {
            storage_root,
            format,
            properties,
        })
    }

    /// The base location under which tables are found.
    pub fn storage_root(&self) -> &str {
        &self.storage_root
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Engine options, prefix kept.
    pub fn engine_options(&self) -> Properties {
        filter_options(&self.properties, ENGINE_PREFIX, true)
    }

    /// Parse the options used to open datasets of the connection's format.
    pub fn format_options(&self) -> Result<FormatOptions, ConfigError> {
        let options = filter_options(&self.properties, self.format.name(), false);
        FormatOptions::parse(self.format, &options)
    }
}

/// Returns entries whose key starts with `prefix.`, compared ASCII case-insensitively.
///
/// With `keep_prefix` unset, `prefix.` is removed from the returned keys.
pub fn filter_options(properties: &Properties, prefix: &str, keep_prefix: bool) -> Properties {
    properties
        .iter()
        .filter_map(|(key, value)| {
            let rest = strip_prefix_ignore_case(key, prefix)?.strip_prefix('.')?;
            let key = if keep_prefix { key.clone() } else { rest.to_string() };
            Some((key, value.clone()))
        })
        .collect()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

/// Trailing separators are dropped so that `/data` and `/data/` name the same root.
fn normalize_root(root: &str) -> Result<String, ConfigError> {
    let root = root.trim();
    if root.is_empty() {
        return Err(ConfigError::EmptyRoot);
    }
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.ends_with(':') {
        // `/` itself, or the bare scheme of a URI such as `file:///`
        return Ok(root.to_string());
    }
    Ok(trimmed.to_string())
}

/// Supplies additional engine options for a connection.
///
/// Options returned here are applied after the connection properties and override them.
pub trait EngineConfigProvider: Send + Sync {
    fn engine_options(&self, info: &ConnectionInfo) -> Properties;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn filter_keeps_prefix() {
        let p = props(&[
            ("datafusion.execution.batch_size", "1024"),
            ("DataFusion.catalog.information_schema", "true"),
            ("csv.has_header", "true"),
            ("datafusionx.foo", "bar"),
        ]);
        let filtered = filter_options(&p, "datafusion", true);
        assert_eq!(
            filtered,
            props(&[
                ("DataFusion.catalog.information_schema", "true"),
                ("datafusion.execution.batch_size", "1024"),
            ])
        );
    }

    #[test]
    fn filter_strips_prefix() {
        let p = props(&[
            ("CSV.delimiter", ";"),
            ("csv.has_header", "false"),
            ("csv", "bare key"),
            ("parquet.skip_metadata", "true"),
        ]);
        let filtered = filter_options(&p, "csv", false);
        assert_eq!(
            filtered,
            props(&[("delimiter", ";"), ("has_header", "false")])
        );
    }

    #[test]
    fn filter_handles_short_and_non_ascii_keys() {
        let p = props(&[("c", "1"), ("é.x", "2"), ("csv.é", "3")]);
        assert_eq!(filter_options(&p, "csv", false), props(&[("é", "3")]));
    }

    #[test]
    fn connection_info_normalizes_root() {
        let info = ConnectionInfo::new("/data/", props(&[("format", "CSV")])).unwrap();
        assert_eq!(info.storage_root(), "/data");
        assert_eq!(info.format(), Format::Csv);

        let info = ConnectionInfo::new("/", props(&[("format", "csv")])).unwrap();
        assert_eq!(info.storage_root(), "/");

        let info = ConnectionInfo::new("s3://bucket/warehouse//", props(&[("Format", "parquet")]))
            .unwrap();
        assert_eq!(info.storage_root(), "s3://bucket/warehouse");
        assert_eq!(info.format(), Format::Parquet);
    }

    #[test]
    fn connection_info_requires_root_and_format() {
        assert!(matches!(
            ConnectionInfo::new("  ", props(&[("format", "csv")])),
            Err(ConfigError::EmptyRoot)
        ));
        assert!(matches!(
            ConnectionInfo::new("/data", Properties::new()),
            Err(ConfigError::MissingFormat)
        ));
        assert!(matches!(
            ConnectionInfo::new("/data", props(&[("format", "xlsx")])),
            Err(ConfigError::UnknownFormat(f)) if f == "xlsx"
        ));
    }

    #[test]
    fn format_options_are_validated() {
        let info = ConnectionInfo::new(
            "/data",
            props(&[("format", "csv"), ("csv.delimiter", ";;")]),
        )
        .unwrap();
        assert!(matches!(
            info.format_options(),
            Err(ConfigError::InvalidOption { key, .. }) if key == "delimiter"
        ));

        let info = ConnectionInfo::new(
            "/data",
            props(&[("format", "csv"), ("csv.colour", "blue")]),
        )
        .unwrap();
        assert!(matches!(
            info.format_options(),
            Err(ConfigError::UnknownOption { key, .. }) if key == "colour"
        ));
    }
}
