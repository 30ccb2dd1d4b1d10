// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Metadata rows describing tables and their columns.
//!
//! Column names and order of both row shapes are fixed, since tools built for
//! relational drivers read them by name.

use std::sync::{Arc, LazyLock};

use datafusion::arrow::array::{ArrayRef, Int32Builder, StringBuilder};
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::error::ArrowError;
use datafusion::arrow::record_batch::RecordBatch;

use crate::types::{TypeMappingError, jdbc_type};

/// A row of the table listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub table_name: String,
    pub table_type: String,
    pub table_schem: String,
    pub table_cat: String,
}

impl TableDescriptor {
    /// Datasets have no native catalog, schema or table type, so those are blank.
    pub fn new(table_name: &str) -> Self {
        TableDescriptor {
            table_name: table_name.into(),
            table_type: String::new(),
            table_schem: String::new(),
            table_cat: String::new(),
        }
    }
}

/// A row of a table description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub table_cat: String,
    pub table_schem: String,
    pub table_name: String,
    pub column_name: String,
    pub data_type: i32,
    pub type_name: String,
}

impl ColumnDescriptor {
    /// Describe every field of `schema`, in order.
    pub fn from_schema(table_name: &str, schema: &Schema) -> Result<Vec<Self>, TypeMappingError> {
        schema
            .fields()
            .iter()
            .map(|field| {
                let ty = jdbc_type(field.data_type())?;
                Ok(ColumnDescriptor {
                    table_cat: String::new(),
                    table_schem: String::new(),
                    table_name: table_name.into(),
                    column_name: field.name().clone(),
                    data_type: ty.code,
                    type_name: ty.name,
                })
            })
            .collect()
    }
}

pub static TABLES_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("TABLE_NAME", DataType::Utf8, true),
        Field::new("TABLE_TYPE", DataType::Utf8, true),
        Field::new("TABLE_SCHEM", DataType::Utf8, true),
        Field::new("TABLE_CAT", DataType::Utf8, true),
    ]))
});

pub static COLUMNS_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("TABLE_CAT", DataType::Utf8, true),
        Field::new("TABLE_SCHEM", DataType::Utf8, true),
        Field::new("TABLE_NAME", DataType::Utf8, true),
        Field::new("COLUMN_NAME", DataType::Utf8, true),
        Field::new("DATA_TYPE", DataType::Int32, true),
        Field::new("TYPE_NAME", DataType::Utf8, true),
    ]))
});

/// Returns the table listing as a batch of [`TABLES_SCHEMA`].
pub fn tables_to_batch(tables: &[TableDescriptor]) -> Result<RecordBatch, ArrowError> {
    let mut table_name = StringBuilder::new();
    let mut table_type = StringBuilder::new();
    let mut table_schem = StringBuilder::new();
    let mut table_cat = StringBuilder::new();

    for table in tables {
        table_name.append_value(&table.table_name);
        table_type.append_value(&table.table_type);
        table_schem.append_value(&table.table_schem);
        table_cat.append_value(&table.table_cat);
    }
    let columns: Vec<ArrayRef> = vec![
        Arc::new(table_name.finish()),
        Arc::new(table_type.finish()),
        Arc::new(table_schem.finish()),
        Arc::new(table_cat.finish()),
    ];
    RecordBatch::try_new(TABLES_SCHEMA.clone(), columns)
}

/// Returns a table description as a batch of [`COLUMNS_SCHEMA`].
pub fn columns_to_batch(columns: &[ColumnDescriptor]) -> Result<RecordBatch, ArrowError> {
    let mut table_cat = StringBuilder::new();
    let mut table_schem = StringBuilder::new();
    let mut table_name = StringBuilder::new();
    let mut column_name = StringBuilder::new();
    let mut data_type = Int32Builder::new();
    let mut type_name = StringBuilder::new();

    for column in columns {
        table_cat.append_value(&column.table_cat);
        table_schem.append_value(&column.table_schem);
        table_name.append_value(&column.table_name);
        column_name.append_value(&column.column_name);
        data_type.append_value(column.data_type);
        type_name.append_value(&column.type_name);
    }
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(table_cat.finish()),
        Arc::new(table_schem.finish()),
        Arc::new(table_name.finish()),
        Arc::new(column_name.finish()),
        Arc::new(data_type.finish()),
        Arc::new(type_name.finish()),
    ];
    RecordBatch::try_new(COLUMNS_SCHEMA.clone(), arrays)
}

#[cfg(test)]
mod tests {
    use datafusion::arrow::array::{AsArray, Int32Array};
    use datafusion::arrow::datatypes::{Int32Type, TimeUnit, UnionFields, UnionMode};

    use super::*;

    #[test]
    fn describe_schema() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
            Field::new(
                "ts",
                DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
                true,
            ),
        ]);
        let columns = ColumnDescriptor::from_schema("Orders", &schema).unwrap();
        let rows: Vec<_> = columns
            .iter()
            .map(|c| (c.table_name.as_str(), c.column_name.as_str(), c.data_type, c.type_name.as_str()))
            .collect();
        assert_eq!(
            rows,
            [
                ("Orders", "id", -5, "BIGINT"),
                ("Orders", "name", 12, "VARCHAR"),
                ("Orders", "ts", 2014, "TIMESTAMP WITH TIME ZONE"),
            ]
        );
        assert!(columns.iter().all(|c| c.table_cat.is_empty() && c.table_schem.is_empty()));
    }

    #[test]
    fn unmapped_column_type() {
        let schema = Schema::new(vec![Field::new(
            "u",
            DataType::Union(UnionFields::empty(), UnionMode::Sparse),
            true,
        )]);
        assert!(ColumnDescriptor::from_schema("t", &schema).is_err());
    }

    #[test]
    fn table_batch_layout() {
        let batch = tables_to_batch(&[TableDescriptor::new("items"), TableDescriptor::new("orders")])
            .unwrap();
        let names: Vec<_> = batch.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(names, ["TABLE_NAME", "TABLE_TYPE", "TABLE_SCHEM", "TABLE_CAT"]);
        assert_eq!(batch.num_rows(), 2);

        let table_name = batch.column(0).as_string::<i32>();
        assert_eq!(table_name.value(1), "orders");
        assert_eq!(batch.column(3).as_string::<i32>().value(0), "");
    }

    #[test]
    fn column_batch_layout() {
        let schema = Schema::new(vec![Field::new("id", DataType::Int32, true)]);
        let columns = ColumnDescriptor::from_schema("t", &schema).unwrap();
        let batch = columns_to_batch(&columns).unwrap();
        let names: Vec<_> = batch.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(
            names,
            ["TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME", "COLUMN_NAME", "DATA_TYPE", "TYPE_NAME"]
        );
        let data_type = batch.column(4).as_primitive::<Int32Type>();
        assert_eq!(data_type, &Int32Array::from(vec![4]));
        assert_eq!(batch.column(5).as_string::<i32>().value(0), "INTEGER");
    }
}
