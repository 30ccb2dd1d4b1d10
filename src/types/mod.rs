// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Mapping from Arrow data types to JDBC type descriptors.
//!
//! Metadata queries report every column as a `java.sql.Types` code together with
//! a type name, so that JDBC-oriented tooling can consume them unchanged.

use datafusion::arrow::datatypes::DataType;

/// Type codes from `java.sql.Types`.
pub mod code {
    pub const NULL: i32 = 0;
    pub const BOOLEAN: i32 = 16;
    pub const TINYINT: i32 = -6;
    pub const SMALLINT: i32 = 5;
    pub const INTEGER: i32 = 4;
    pub const BIGINT: i32 = -5;
    pub const REAL: i32 = 7;
    pub const DOUBLE: i32 = 8;
    pub const DECIMAL: i32 = 3;
    pub const VARCHAR: i32 = 12;
    pub const LONGVARCHAR: i32 = -1;
    pub const BINARY: i32 = -2;
    pub const VARBINARY: i32 = -3;
    pub const LONGVARBINARY: i32 = -4;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
    pub const TIMESTAMP_WITH_TIMEZONE: i32 = 2014;
    pub const OTHER: i32 = 1111;
    pub const JAVA_OBJECT: i32 = 2000;
    pub const STRUCT: i32 = 2002;
    pub const ARRAY: i32 = 2003;
}

/// A relational type descriptor: the JDBC type code and its type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JdbcType {
    pub code: i32,
    pub name: String,
}

impl JdbcType {
    fn new(code: i32, name: impl Into<String>) -> Self {
        JdbcType {
            code,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for JdbcType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.code)
    }
}

/// The error type of type mapping.
///
/// Hitting this means the engine produced a type this driver does not know,
/// which is a version mismatch rather than something a caller can fix.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeMappingError {
    #[error("no relational type for native type {0}")]
    Unsupported(DataType),
}

/// Returns the JDBC type descriptor of an Arrow data type.
pub fn jdbc_type(data_type: &DataType) -> Result<JdbcType, TypeMappingError> {
    use DataType::*;
    Ok(match data_type {
        Null => JdbcType::new(code::NULL, "NULL"),
        Boolean => JdbcType::new(code::BOOLEAN, "BOOLEAN"),
        Int8 => JdbcType::new(code::TINYINT, "TINYINT"),
        Int16 | UInt8 => JdbcType::new(code::SMALLINT, "SMALLINT"),
        Int32 | UInt16 => JdbcType::new(code::INTEGER, "INTEGER"),
        Int64 | UInt32 => JdbcType::new(code::BIGINT, "BIGINT"),
        UInt64 => JdbcType::new(code::DECIMAL, "DECIMAL(20,0)"),
        Float16 | Float32 => JdbcType::new(code::REAL, "REAL"),
        Float64 => JdbcType::new(code::DOUBLE, "DOUBLE"),
        Decimal128(precision, scale) | Decimal256(precision, scale) => {
            JdbcType::new(code::DECIMAL, format!("DECIMAL({precision},{scale})"))
        }
        Utf8 | Utf8View => JdbcType::new(code::VARCHAR, "VARCHAR"),
        LargeUtf8 => JdbcType::new(code::LONGVARCHAR, "LONGVARCHAR"),
        Binary | BinaryView => JdbcType::new(code::VARBINARY, "VARBINARY"),
        LargeBinary => JdbcType::new(code::LONGVARBINARY, "LONGVARBINARY"),
        FixedSizeBinary(width) => JdbcType::new(code::BINARY, format!("BINARY({width})")),
        Date32 | Date64 => JdbcType::new(code::DATE, "DATE"),
        Time32(_) | Time64(_) => JdbcType::new(code::TIME, "TIME"),
        Timestamp(_, None) => JdbcType::new(code::TIMESTAMP, "TIMESTAMP"),
        Timestamp(_, Some(_)) => {
            JdbcType::new(code::TIMESTAMP_WITH_TIMEZONE, "TIMESTAMP WITH TIME ZONE")
        }
        Interval(_) | Duration(_) => JdbcType::new(code::OTHER, "INTERVAL"),
        List(_) | LargeList(_) | FixedSizeList(_, _) | ListView(_) | LargeListView(_) => {
            JdbcType::new(code::ARRAY, "ARRAY")
        }
        Struct(_) => JdbcType::new(code::STRUCT, "STRUCT"),
        Map(_, _) => JdbcType::new(code::JAVA_OBJECT, "MAP"),
        // encodings report the type of the values they wrap
        Dictionary(_, value) => return jdbc_type(value),
        RunEndEncoded(_, values) => return jdbc_type(values.data_type()),
        other => return Err(TypeMappingError::Unsupported(other.clone())),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use datafusion::arrow::datatypes::{Field, IntervalUnit, TimeUnit, UnionFields, UnionMode};
    use test_case::test_case;

    use super::*;

    #[test_case(DataType::Int32, 4, "INTEGER")]
    #[test_case(DataType::Int64, -5, "BIGINT")]
    #[test_case(DataType::Int16, 5, "SMALLINT")]
    #[test_case(DataType::Int8, -6, "TINYINT")]
    #[test_case(DataType::UInt64, 3, "DECIMAL(20,0)")]
    #[test_case(DataType::Float32, 7, "REAL")]
    #[test_case(DataType::Float64, 8, "DOUBLE")]
    #[test_case(DataType::Boolean, 16, "BOOLEAN")]
    #[test_case(DataType::Utf8, 12, "VARCHAR")]
    #[test_case(DataType::Utf8View, 12, "VARCHAR")]
    #[test_case(DataType::LargeUtf8, -1, "LONGVARCHAR")]
    #[test_case(DataType::Binary, -3, "VARBINARY")]
    #[test_case(DataType::FixedSizeBinary(16), -2, "BINARY(16)")]
    #[test_case(DataType::Date32, 91, "DATE")]
    #[test_case(DataType::Time64(TimeUnit::Nanosecond), 92, "TIME")]
    #[test_case(DataType::Timestamp(TimeUnit::Microsecond, None), 93, "TIMESTAMP")]
    #[test_case(DataType::Decimal128(10, 2), 3, "DECIMAL(10,2)")]
    #[test_case(DataType::Interval(IntervalUnit::MonthDayNano), 1111, "INTERVAL")]
    #[test_case(DataType::Null, 0, "NULL")]
    fn maps_scalar_types(data_type: DataType, code: i32, name: &str) {
        assert_eq!(jdbc_type(&data_type).unwrap(), JdbcType::new(code, name));
    }

    #[test]
    fn timestamp_with_zone() {
        let ty = DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into()));
        assert_eq!(
            jdbc_type(&ty).unwrap(),
            JdbcType::new(code::TIMESTAMP_WITH_TIMEZONE, "TIMESTAMP WITH TIME ZONE")
        );
    }

    #[test]
    fn nested_types() {
        let item = Arc::new(Field::new("item", DataType::Int32, true));
        assert_eq!(jdbc_type(&DataType::List(item)).unwrap().code, code::ARRAY);

        let fields = vec![Field::new("a", DataType::Utf8, true)];
        assert_eq!(
            jdbc_type(&DataType::Struct(fields.into())).unwrap().code,
            code::STRUCT
        );
    }

    #[test]
    fn dictionary_reports_value_type() {
        let ty = DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8));
        assert_eq!(
            jdbc_type(&ty).unwrap(),
            JdbcType::new(code::VARCHAR, "VARCHAR")
        );
    }

    #[test]
    fn union_is_unsupported() {
        let ty = DataType::Union(UnionFields::empty(), UnionMode::Sparse);
        assert_eq!(
            jdbc_type(&ty),
            Err(TypeMappingError::Unsupported(ty.clone()))
        );
    }
}
