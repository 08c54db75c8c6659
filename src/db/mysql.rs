//! MySQL backend.

use crate::config::BackendKind;
use crate::db::types::RowValues;
use crate::db::{Backend, quote_literal, text_cell};
use crate::error::{InsightError, InsightResult};
use crate::models::{ColumnDescriptor, ResultSet};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Column, ConnectOptions, Connection, Executor, Statement};
use std::str::FromStr;
use tracing::{debug, warn};

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT CAST(TABLE_NAME AS CHAR) AS table_name
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = DATABASE()
        AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
        "#;

    /// `{table}` is a quoted literal.
    pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            CAST(COLUMN_NAME AS CHAR) AS column_name,
            CAST(COLUMN_TYPE AS CHAR) AS column_type,
            CAST(COLUMN_KEY AS CHAR) AS column_key
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE()
        AND TABLE_NAME = {table}
        ORDER BY ORDINAL_POSITION
        "#;
}

pub struct MySqlBackend {
    options: MySqlConnectOptions,
}

impl MySqlBackend {
    pub fn new(url: &str) -> InsightResult<Self> {
        let options = MySqlConnectOptions::from_str(url)
            .map_err(|e| InsightError::config(format!("Invalid MySQL connection URL: {e}")))?;
        Ok(Self { options })
    }

    async fn connect(&self) -> InsightResult<MySqlConnection> {
        self.options.connect().await.map_err(|e| {
            InsightError::connection(
                format!("Cannot connect to MySQL: {e}"),
                "Check that the server is running and the connection URL is correct",
            )
        })
    }
}

#[async_trait]
impl Backend for MySqlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mysql
    }

    async fn execute(&self, sql: &str) -> InsightResult<ResultSet> {
        let mut conn = self.connect().await?;
        let result = fetch_result_set(&mut conn, sql).await;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close MySQL connection");
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
                let data_type = text_cell(&result, i, "column_type").unwrap_or_default();
                let primary_key = text_cell(&result, i, "column_key").as_deref() == Some("PRI");
                Some(ColumnDescriptor::new(name, data_type).with_primary_key(primary_key))
            })
            .collect())
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }
}

/// Some statements (e.g. `CREATE PROCEDURE`) cannot go through the prepared
/// protocol, so a failed prepare only means there is no descriptor.
async fn fetch_result_set(conn: &mut MySqlConnection, sql: &str) -> InsightResult<ResultSet> {
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
