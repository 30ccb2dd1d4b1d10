// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Connection URLs of the form `filelight:<storage-root>[?key=value&...]`.

use ::url::form_urlencoded;

use super::{ConfigError, Properties};

/// Prefix of every connection URL.
pub const URL_PREFIX: &str = "filelight:";

/// Returns true if the URL is handled by this driver.
pub fn accepts_url(url: &str) -> bool {
    url.starts_with(URL_PREFIX)
}

/// Split a connection URL into the storage root and the properties in its query string.
///
/// Keys and values are percent-decoded. Every pair must contain exactly one `=`.
pub fn parse_url(url: &str) -> Result<(String, Properties), ConfigError> {
    let body = url
        .strip_prefix(URL_PREFIX)
        .ok_or_else(|| ConfigError::InvalidUrl(url.to_string()))?;
    let (root, query) = match body.split_once('?') {
        Some((root, query)) => (root, Some(query)),
        None => (body, None),
    };

    let mut properties = Properties::new();
    for pair in query.into_iter().flat_map(|q| q.split('&')) {
        if pair.is_empty() {
            continue;
        }
        if pair.matches('=').count() != 1 {
            return Err(ConfigError::InvalidProperty(pair.to_string()));
        }
        // a single pair decodes to exactly one (key, value)
        for (key, value) in form_urlencoded::parse(pair.as_bytes()) {
            if key.is_empty() {
                return Err(ConfigError::InvalidProperty(pair.to_string()));
            }
            properties.insert(key.into_owned(), value.into_owned());
        }
    }
    Ok((root.to_string(), properties))
}
