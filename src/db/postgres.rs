//! PostgreSQL backend.

use crate::config::BackendKind;
use crate::db::types::RowValues;
use crate::db::{Backend, flag_cell, quote_literal, text_cell};
use crate::error::{InsightError, InsightResult};
use crate::models::{ColumnDescriptor, ResultSet};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Column, ConnectOptions, Connection, Executor, Statement};
use std::str::FromStr;
use tracing::{debug, warn};

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT table_name::text AS table_name
        FROM information_schema.tables
        WHERE table_schema = current_schema()
        AND table_type = 'BASE TABLE'
        ORDER BY table_name
        "#;

    /// Columns with a primary key flag. `{table}` is a quoted literal.
    pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            c.column_name::text AS column_name,
            c.data_type::text AS data_type,
            CASE WHEN pk.column_name IS NOT NULL THEN 1 ELSE 0 END AS is_primary_key
        FROM information_schema.columns c
        LEFT JOIN (
            SELECT kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.constraint_type = 'PRIMARY KEY'
            AND tc.table_schema = current_schema()
            AND tc.table_name = {table}
        ) pk ON pk.column_name = c.column_name
        WHERE c.table_schema = current_schema()
        AND c.table_name = {table}
        ORDER BY c.ordinal_position
        "#;
}

pub struct PostgresBackend {
    options: PgConnectOptions,
}

impl PostgresBackend {
    pub fn new(url: &str) -> InsightResult<Self> {
        let options = PgConnectOptions::from_str(url).map_err(|e| {
            InsightError::config(format!("Invalid PostgreSQL connection URL: {e}"))
        })?;
        Ok(Self { options })
    }

    async fn connect(&self) -> InsightResult<PgConnection> {
        self.options.connect().await.map_err(|e| {
            InsightError::connection(
                format!("Cannot connect to PostgreSQL: {e}"),
                "Check that the server is running and the connection URL is correct",
            )
        })
    }
}

#[async_trait]
impl Backend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn execute(&self, sql: &str) -> InsightResult<ResultSet> {
        let mut conn = self.connect().await?;
        let result = fetch_result_set(&mut conn, sql).await;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close PostgreSQL connection");
        }
        result
    }

    async fn list_tables(&self) -> InsightResult<Vec<String>> {
        let result = self.execute(queries::LIST_TABLES).await?;
        Ok((0..result.row_count())
            .filter_map(|i| text_cell(&result, i, "table_name"))
            .collect())
    }

    async fn describe_columns(&self, table: &str) -> InsightResult<Vec<ColumnDescriptor>> {
        let sql = queries::DESCRIBE_COLUMNS.replace("{table}", &quote_literal(table));
        let result = self.execute(&sql).await?;
        Ok((0..result.row_count())
            .filter_map(|i| {
                let name = text_cell(&result, i, "column_name")?;
                let data_type = text_cell(&result, i, "data_type").unwrap_or_default();
                Some(
                    ColumnDescriptor::new(name, data_type)
                        .with_primary_key(flag_cell(&result, i, "is_primary_key")),
                )
            })
            .collect())
    }
}

async fn fetch_result_set(conn: &mut PgConnection, sql: &str) -> InsightResult<ResultSet> {
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
    fn test_invalid_url_is_config_error() {
        let err = PostgresBackend::new("not a url").err().unwrap();
        assert!(matches!(err, InsightError::Config { .. }));
    }

    #[test]
    fn test_describe_query_quotes_table() {
        let sql = queries::DESCRIBE_COLUMNS.replace("{table}", &quote_literal("claims"));
        assert!(sql.contains("c.table_name = 'claims'"));
        assert!(!sql.contains("{table}"));
    }
}
