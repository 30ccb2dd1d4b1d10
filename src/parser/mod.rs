// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! The parser module directly uses the [`sqlparser`] crate shipped with the engine
//! and re-exports its AST types.
//!
//! [`sqlparser`]: datafusion::sql::sqlparser

pub use datafusion::sql::sqlparser::ast::*;
use datafusion::sql::sqlparser::dialect::{GenericDialect, dialect_from_str};
use datafusion::sql::sqlparser::parser::Parser;
pub use datafusion::sql::sqlparser::parser::ParserError;

/// Parse the SQL string into a list of ASTs.
pub fn parse(sql: &str) -> Result<Vec<Statement>, ParserError> {
    let dialect = GenericDialect {};
    Parser::parse_sql(&dialect, sql)
}

/// Parse the SQL string with the dialect named `dialect`, as the engine names them
/// (e.g. `generic`, `postgresql`, `mssql`).
pub fn parse_with_dialect(sql: &str, dialect: &str) -> Result<Vec<Statement>, ParserError> {
    let dialect = dialect_from_str(dialect)
        .ok_or_else(|| ParserError::ParserError(format!("unsupported SQL dialect: {dialect}")))?;
    Parser::parse_sql(dialect.as_ref(), sql)
}

/// Returns true if `dialect` names a dialect the parser knows.
pub fn is_known_dialect(dialect: &str) -> bool {
    dialect_from_str(dialect).is_some()
}
