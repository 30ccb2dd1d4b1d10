// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use datafusion::arrow::datatypes::SchemaRef;
use itertools::Itertools;
use parking_lot::RwLock;

pub type SchemaRegistryRef = Arc<SchemaRegistry>;

/// Identity of a table: its storage root and its name.
///
/// Both parts compare case-insensitively, while the original spelling is kept for
/// display.
#[derive(Debug, Clone)]
pub struct TableKey {
    storage_root: String,
    table_name: String,
    normalized: (String, String),
}

impl TableKey {
    pub fn new(storage_root: &str, table_name: &str) -> Self {
        TableKey {
            storage_root: storage_root.to_string(),
            table_name: table_name.to_string(),
            normalized: (normalize(storage_root), normalize(table_name)),
        }
    }

    pub fn storage_root(&self) -> &str {
        &self.storage_root
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn is_under(&self, normalized_root: &str) -> bool {
        self.normalized.0 == normalized_root
    }
}

impl PartialEq for TableKey {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for TableKey {}

impl Hash for TableKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

/// The single normalization used by both `Eq` and `Hash`.
fn normalize(s: &str) -> String {
    s.to_lowercase()
}

static GLOBAL: LazyLock<SchemaRegistryRef> = LazyLock::new(|| Arc::new(SchemaRegistry::new()));

/// Schemas of every table bound so far, keyed by [`TableKey`].
///
/// Entries are added on the first bind of a table and are never removed, so the
/// schema of a dataset that changes afterwards is not refreshed.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TableKey, SchemaRef>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    ///
    /// It is shared by every session that does not bring its own, so tables bound
    /// by one connection are listed by all connections on the same storage root.
    pub fn global() -> SchemaRegistryRef {
        GLOBAL.clone()
    }

    /// Insert or replace the schema of `key`.
    pub fn upsert(&self, key: TableKey, schema: SchemaRef) {
        self.schemas.write().insert(key, schema);
    }

    pub fn get(&self, key: &TableKey) -> Option<SchemaRef> {
        self.schemas.read().get(key).cloned()
    }

    /// Returns the entries under `storage_root`, ordered by table name.
    pub fn tables_under(&self, storage_root: &str) -> Vec<(TableKey, SchemaRef)> {
        let root = normalize(storage_root);
        self.schemas
            .read()
            .iter()
            .filter(|(key, _)| key.is_under(&root))
            .map(|(key, schema)| (key.clone(), schema.clone()))
            .sorted_by(|(a, _), (b, _)| a.normalized.1.cmp(&b.normalized.1))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}
