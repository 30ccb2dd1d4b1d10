// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! TOML configuration files.
//!
//! ```toml
//! format = "csv"
//!
//! [properties]
//! "csv.has_header" = "true"
//! "datafusion.execution.batch_size" = "4096"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{CONFIG_KEY, ConfigError, FORMAT_KEY, Properties};

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Storage format of the datasets.
    #[serde(default)]
    pub format: Option<String>,
    /// Connection properties.
    #[serde(default)]
    pub properties: Properties,
}

impl ConfigFile {
    /// Loads a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the file's settings as properties, overridden by `properties`.
    pub fn merge(self, properties: Properties) -> Properties {
        let mut merged = self.properties;
        if let Some(format) = self.format {
            merged.insert(FORMAT_KEY.into(), format);
        }
        // an explicit `format` may differ in case from the file's key
        if properties
            .keys()
            .any(|key| key.eq_ignore_ascii_case(FORMAT_KEY))
        {
            merged.retain(|key, _| !key.eq_ignore_ascii_case(FORMAT_KEY));
        }
        merged.extend(properties);
        merged
    }
}

/// Expands the `config` property, if set, into the properties from that file.
pub(crate) fn load_config_property(properties: Properties) -> Result<Properties, ConfigError> {
    let path = properties
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(CONFIG_KEY))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            Ok(ConfigFile::from_file(&path)?.merge(properties))
        }
        None => Ok(properties),
    }
}
