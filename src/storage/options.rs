// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Per-format read options.
//!
//! Options arrive as strings with the format prefix stripped (`has_header`,
//! `delimiter`, ...) and are parsed once per connection.
//!
//! `file_extension` is only accepted by formats stored as directories, since the
//! engine checks it against single-file paths.

use datafusion::datasource::file_format::options::{
    ArrowReadOptions, CsvReadOptions, NdJsonReadOptions, ParquetReadOptions,
};
use datafusion::error::Result as DFResult;
use datafusion::prelude::{DataFrame, SessionContext};

use super::Format;
use crate::config::{ConfigError, Properties};

/// Options of CSV datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvOptions {
    pub has_header: Option<bool>,
    pub delimiter: Option<u8>,
    pub quote: Option<u8>,
    pub escape: Option<u8>,
    pub comment: Option<u8>,
    pub file_extension: Option<String>,
    pub schema_infer_max_records: Option<usize>,
}

/// Options of Parquet datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParquetOptions {
    pub file_extension: Option<String>,
    pub parquet_pruning: Option<bool>,
    pub skip_metadata: Option<bool>,
}

/// Options of newline-delimited JSON datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonOptions {
    pub schema_infer_max_records: Option<usize>,
}

/// Options of Arrow IPC datasets. There are none yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrowOptions {}

/// Read options of a connection's format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOptions {
    Csv(CsvOptions),
    Parquet(ParquetOptions),
    Json(JsonOptions),
    Arrow(ArrowOptions),
}

impl FormatOptions {
    /// Parse options of `format`. Keys are matched case-insensitively.
    pub fn parse(format: Format, options: &Properties) -> Result<Self, ConfigError> {
        let mut parsed = match format {
            Format::Csv => FormatOptions::Csv(CsvOptions::default()),
            Format::Parquet => FormatOptions::Parquet(ParquetOptions::default()),
            Format::Json => FormatOptions::Json(JsonOptions::default()),
            Format::Arrow => FormatOptions::Arrow(ArrowOptions::default()),
        };
        for (key, value) in options {
            let opt = Opt { key, value };
            let name = key.to_ascii_lowercase();
            match &mut parsed {
                FormatOptions::Csv(csv) => match name.as_str() {
                    "has_header" | "header" => csv.has_header = Some(opt.bool()?),
                    "delimiter" | "sep" => csv.delimiter = Some(opt.byte()?),
                    "quote" => csv.quote = Some(opt.byte()?),
                    "escape" => csv.escape = Some(opt.byte()?),
                    "comment" => csv.comment = Some(opt.byte()?),
                    "file_extension" => csv.file_extension = Some(opt.extension()),
                    "schema_infer_max_records" => {
                        csv.schema_infer_max_records = Some(opt.usize()?)
                    }
                    _ => return Err(unknown(format, key)),
                },
                FormatOptions::Parquet(parquet) => match name.as_str() {
                    "file_extension" => parquet.file_extension = Some(opt.extension()),
                    "parquet_pruning" => parquet.parquet_pruning = Some(opt.bool()?),
                    "skip_metadata" => parquet.skip_metadata = Some(opt.bool()?),
                    _ => return Err(unknown(format, key)),
                },
                FormatOptions::Json(json) => match name.as_str() {
                    "schema_infer_max_records" => {
                        json.schema_infer_max_records = Some(opt.usize()?)
                    }
                    _ => return Err(unknown(format, key)),
                },
                FormatOptions::Arrow(_) => return Err(unknown(format, key)),
            }
        }
        Ok(parsed)
    }

    pub fn format(&self) -> Format {
        match self {
            FormatOptions::Csv(_) => Format::Csv,
            FormatOptions::Parquet(_) => Format::Parquet,
            FormatOptions::Json(_) => Format::Json,
            FormatOptions::Arrow(_) => Format::Arrow,
        }
    }

    /// Open the dataset at `path` as a relation.
    pub async fn open(&self, ctx: &SessionContext, path: &str) -> DFResult<DataFrame> {
        match self {
            FormatOptions::Csv(csv) => ctx.read_csv(path, csv.read_options()).await,
            FormatOptions::Parquet(parquet) => {
                ctx.read_parquet(path, parquet.read_options()).await
            }
            FormatOptions::Json(json) => ctx.read_json(path, json.read_options()).await,
            FormatOptions::Arrow(arrow) => ctx.read_arrow(path, arrow.read_options()).await,
        }
    }
}

impl CsvOptions {
    fn read_options(&self) -> CsvReadOptions<'_> {
        let mut options = CsvReadOptions::new();
        if let Some(has_header) = self.has_header {
            options.has_header = has_header;
        }
        if let Some(delimiter) = self.delimiter {
            options.delimiter = delimiter;
        }
        if let Some(quote) = self.quote {
            options.quote = quote;
        }
        options.escape = self.escape.or(options.escape);
        options.comment = self.comment.or(options.comment);
        if let Some(ext) = &self.file_extension {
            options.file_extension = ext;
        }
        if let Some(max) = self.schema_infer_max_records {
            options.schema_infer_max_records = max;
        }
        options
    }
}

impl ParquetOptions {
    fn read_options(&self) -> ParquetReadOptions<'_> {
        let mut options = ParquetReadOptions::default();
        if let Some(ext) = &self.file_extension {
            options.file_extension = ext;
        }
        options.parquet_pruning = self.parquet_pruning.or(options.parquet_pruning);
        options.skip_metadata = self.skip_metadata.or(options.skip_metadata);
        options
    }
}

impl JsonOptions {
    fn read_options(&self) -> NdJsonReadOptions<'_> {
        let mut options = NdJsonReadOptions::default();
        if let Some(max) = self.schema_infer_max_records {
            options.schema_infer_max_records = max;
        }
        options
    }
}

impl ArrowOptions {
    fn read_options(&self) -> ArrowReadOptions<'_> {
        ArrowReadOptions::default()
    }
}

fn unknown(format: Format, key: &str) -> ConfigError {
    ConfigError::UnknownOption {
        format,
        key: key.to_string(),
    }
}

/// A raw option being parsed.
struct Opt<'a> {
    key: &'a str,
    value: &'a str,
}

impl Opt<'_> {
    fn invalid(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidOption {
            key: self.key.to_string(),
            value: self.value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn bool(&self) -> Result<bool, ConfigError> {
        self.value
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| self.invalid("expected true or false"))
    }

    fn usize(&self) -> Result<usize, ConfigError> {
        self.value
            .trim()
            .parse()
            .map_err(|_| self.invalid("expected a non-negative integer"))
    }

    /// A single ASCII character, or `\t`.
    fn byte(&self) -> Result<u8, ConfigError> {
        match self.value.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            b"\\t" => Ok(b'\t'),
            _ => Err(self.invalid("expected a single ASCII character")),
        }
    }

    /// Extensions are matched with their leading dot, which users tend to omit.
    fn extension(&self) -> String {
        let ext = self.value.trim();
        if ext.is_empty() || ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{ext}")
        }
    }
}
