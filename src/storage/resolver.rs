// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

/// Maps a table name under a storage root to the location of its dataset.
///
/// Implementations must be pure and give distinct tables under the same root
/// distinct locations. Table names are validated before they get here, so they
/// never contain path separators.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, root: &str, table: &str) -> String;
}

/// Each table is a directory named after the table: `<root>/<table>`.
///
/// This is the layout of partitioned datasets, where one table is spread over
/// many files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryLayout;

impl PathResolver for DirectoryLayout {
    fn resolve(&self, root: &str, table: &str) -> String {
        join(root, table)
    }
}

/// Each table is a single file: `<root>/<table>.<extension>`.
#[derive(Debug, Clone, Copy)]
pub struct FileLayout {
    pub extension: &'static str,
}

impl PathResolver for FileLayout {
    fn resolve(&self, root: &str, table: &str) -> String {
        format!("{}.{}", join(root, table), self.extension)
    }
}

pub static JSON_LAYOUT: FileLayout = FileLayout { extension: "json" };
pub static ARROW_LAYOUT: FileLayout = FileLayout { extension: "arrow" };

fn join(root: &str, name: &str) -> String {
    if root.ends_with('/') {
        format!("{root}{name}")
    } else {
        format!("{root}/{name}")
    }
}
