//! SQLite backend.

use crate::config::BackendKind;
use crate::db::types::RowValues;
use crate::db::{Backend, flag_cell, quote_literal, text_cell};
use crate::error::{InsightError, InsightResult};
use crate::models::{ColumnDescriptor, ResultSet};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Column, ConnectOptions, Connection, Executor, Statement};
use std::path::Path;
use tracing::{debug, warn};

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT name FROM sqlite_master
        WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
        ORDER BY name
        "#;
}

/// SQLite database file, opened per statement.
pub struct SqliteBackend {
    path: String,
    options: SqliteConnectOptions,
}

impl SqliteBackend {
    /// Create a backend for an existing database file.
    pub fn new(path: impl Into<String>) -> InsightResult<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(InsightError::config("SQLite path must not be empty"));
        }
        let options = SqliteConnectOptions::new()
            .filename(Path::new(&path))
            .create_if_missing(false);
        Ok(Self { path, options })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn connect(&self) -> InsightResult<SqliteConnection> {
        self.options.connect().await.map_err(|e| {
            InsightError::connection(
                format!("Cannot open SQLite database '{}': {}", self.path, e),
                "Check that the database file exists and is readable",
            )
        })
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn execute(&self, sql: &str) -> InsightResult<ResultSet> {
        let mut conn = self.connect().await?;
        let result = fetch_result_set(&mut conn, sql).await;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close SQLite connection");
        }
        result
    }

    async fn list_tables(&self) -> InsightResult<Vec<String>> {
        let result = self.execute(queries::LIST_TABLES).await?;
        let tables: Vec<String> = (0..result.row_count())
            .filter_map(|i| text_cell(&result, i, "name"))
            .collect();
        debug!(count = tables.len(), "Listed SQLite tables");
        Ok(tables)
    }

    async fn describe_columns(&self, table: &str) -> InsightResult<Vec<ColumnDescriptor>> {
        let sql = format!("PRAGMA table_info({})", quote_literal(table));
        let result = self.execute(&sql).await?;
        Ok((0..result.row_count())
            .filter_map(|i| {
                let name = text_cell(&result, i, "name")?;
                let data_type = text_cell(&result, i, "type").unwrap_or_default();
                Some(
                    ColumnDescriptor::new(name, data_type)
                        .with_primary_key(flag_cell(&result, i, "pk")),
                )
            })
            .collect())
    }
}

/// Run the statement and collect rows plus column names.
///
/// Column names come from the first row, or from the prepared statement when
/// no rows came back. A statement that cannot be re-prepared after running
/// (e.g. DDL) has no result descriptor.
async fn fetch_result_set(conn: &mut SqliteConnection, sql: &str) -> InsightResult<ResultSet> {
    let rows = (&mut *conn).fetch_all(sql).await?;

    let columns = match rows.first() {
        Some(row) => row.column_names(),
        None => match (&mut *conn).prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            Err(e) => {
                debug!(error = %e, "No result descriptor for statement");
                Vec::new()
            }
        },
    };

    let rows = rows.iter().map(RowValues::values).collect();
    Ok(ResultSet::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_rejected() {
        assert!(SqliteBackend::new("  ").is_err());
    }

    #[test]
    fn test_quote_identifier() {
        let backend = SqliteBackend::new("insurance.db").unwrap();
        assert_eq!(backend.quote_identifier("claims"), "\"claims\"");
        assert_eq!(backend.quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(backend.path(), "insurance.db");
    }
}
