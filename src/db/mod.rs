//! Database abstraction layer.
//!
//! This module provides store access functionality:
//! - A `Backend` trait with one implementation per store
//! - Query execution over a fresh connection per call
//! - Schema introspection queries per backend
//! - Type mappings from driver rows to JSON values

pub mod databricks;
pub mod executor;
pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod types;

pub use databricks::DatabricksBackend;
pub use executor::QueryExecutor;
pub use mysql::MySqlBackend;
pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;

use crate::config::{BackendKind, StoreConfig};
use crate::error::{InsightError, InsightResult};
use crate::models::{ColumnDescriptor, ResultSet, value_as_i64};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// A relational store reachable by literal SQL strings.
///
/// Implementations open a new connection for every `execute` call and close
/// it before returning, on success and on failure.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Execute one statement verbatim and fetch all rows.
    async fn execute(&self, sql: &str) -> InsightResult<ResultSet>;

    /// Names of the user tables, in a stable order.
    async fn list_tables(&self) -> InsightResult<Vec<String>>;

    /// Columns of a table in declaration order.
    async fn describe_columns(&self, table: &str) -> InsightResult<Vec<ColumnDescriptor>>;

    /// Quote an identifier for use in generated SQL.
    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Exact row count of a table.
    async fn row_count(&self, table: &str) -> InsightResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.quote_identifier(table));
        let result = self.execute(&sql).await?;
        result
            .scalar()
            .and_then(value_as_i64)
            .map(|n| n.max(0) as u64)
            .ok_or_else(|| {
                InsightError::database(format!("Row count query returned no value for '{table}'"))
            })
    }
}

/// Quote a string literal for use in generated SQL.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Text value of a result cell, by column name.
pub(crate) fn text_cell(result: &ResultSet, row: usize, column: &str) -> Option<String> {
    result.value(row, column).and_then(|v| match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    })
}

/// Truthiness of a result cell, by column name (1, "1", true, "t", "YES").
pub(crate) fn flag_cell(result: &ResultSet, row: usize, column: &str) -> bool {
    match result.value(row, column) {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(n)) => n.as_i64().is_some_and(|v| v > 0),
        Some(serde_json::Value::String(s)) => {
            matches!(s.to_ascii_lowercase().as_str(), "1" | "t" | "true" | "yes")
        }
        _ => false,
    }
}

/// Construct the backend selected by configuration.
///
/// The choice is made once here; callers only see the trait object.
pub fn connect_backend(config: &StoreConfig) -> InsightResult<Arc<dyn Backend>> {
    info!(backend = %config.kind(), "Configuring store backend");
    let backend: Arc<dyn Backend> = match config {
        StoreConfig::Sqlite { path } => Arc::new(SqliteBackend::new(path)?),
        StoreConfig::Postgres { url } => Arc::new(PostgresBackend::new(url)?),
        StoreConfig::MySql { url } => Arc::new(MySqlBackend::new(url)?),
        StoreConfig::Databricks(cfg) => Arc::new(DatabricksBackend::new(cfg)?),
    };
    Ok(backend)
}
