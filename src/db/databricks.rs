//! Databricks SQL warehouse backend.
//!
//! Statements go through the SQL Statement Execution REST API. Each call
//! submits one statement, polls until it reaches a terminal state and then
//! follows the inline result chunks.

use crate::config::{BackendKind, DatabricksConfig};
use crate::db::types::{TypeCategory, categorize_type, text_to_json};
use crate::db::{Backend, text_cell};
use crate::error::{InsightError, InsightResult};
use crate::models::{ColumnDescriptor, ResultSet};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const STATEMENTS_PATH: &str = "api/2.0/sql/statements";
const WAIT_TIMEOUT: &str = "50s";
const POLL_INTERVAL: Duration = Duration::from_millis(500);

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StatementResponse {
    statement_id: String,
    status: StatementStatus,
    #[serde(default)]
    manifest: Option<Manifest>,
    #[serde(default)]
    result: Option<ResultChunk>,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: String,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    schema: ManifestSchema,
}

#[derive(Debug, Deserialize)]
struct ManifestSchema {
    #[serde(default)]
    columns: Vec<ManifestColumn>,
}

#[derive(Debug, Deserialize)]
struct ManifestColumn {
    name: String,
    #[serde(default)]
    type_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ResultChunk {
    #[serde(default)]
    data_array: Vec<Vec<Option<String>>>,
    #[serde(default)]
    next_chunk_internal_link: Option<String>,
}

impl StatementResponse {
    fn is_running(&self) -> bool {
        matches!(self.status.state.as_str(), "PENDING" | "RUNNING")
    }

    fn failure(&self) -> Option<String> {
        match self.status.state.as_str() {
            "SUCCEEDED" | "PENDING" | "RUNNING" => None,
            state => Some(
                self.status
                    .error
                    .as_ref()
                    .and_then(|e| e.message.clone())
                    .unwrap_or_else(|| format!("Statement ended in state {state}")),
            ),
        }
    }
}

// =============================================================================
// Backend
// =============================================================================

pub struct DatabricksBackend {
    client: reqwest::Client,
    base_url: Url,
    warehouse_id: String,
    access_token: String,
    catalog: String,
    schema: String,
}

impl DatabricksBackend {
    pub fn new(config: &DatabricksConfig) -> InsightResult<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url()?,
            warehouse_id: config.warehouse_id()?,
            access_token: config.access_token.clone(),
            catalog: config.catalog.clone(),
            schema: config.schema.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> InsightResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| InsightError::config(format!("Invalid Databricks endpoint '{path}': {e}")))
    }

    fn qualified_schema(&self) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(&self.catalog),
            self.quote_identifier(&self.schema)
        )
    }

    async fn submit(&self, sql: &str) -> InsightResult<StatementResponse> {
        let body = json!({
            "statement": sql,
            "warehouse_id": self.warehouse_id,
            "catalog": self.catalog,
            "schema": self.schema,
            "wait_timeout": WAIT_TIMEOUT,
            "on_wait_timeout": "CONTINUE",
            "disposition": "INLINE",
            "format": "JSON_ARRAY",
        });
        let request = self
            .client
            .post(self.endpoint(STATEMENTS_PATH)?)
            .bearer_auth(&self.access_token)
            .json(&body);
        self.send(request).await
    }

    async fn poll(&self, statement_id: &str) -> InsightResult<StatementResponse> {
        let url = self.endpoint(&format!("{STATEMENTS_PATH}/{statement_id}"))?;
        let request = self.client.get(url).bearer_auth(&self.access_token);
        self.send(request).await
    }

    async fn fetch_chunk(&self, link: &str) -> InsightResult<ResultChunk> {
        let url = self.endpoint(link.trim_start_matches('/'))?;
        let request = self.client.get(url).bearer_auth(&self.access_token);
        self.send(request).await
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> InsightResult<T> {
        let response = request.send().await.map_err(|e| {
            InsightError::connection(
                format!("Cannot reach Databricks workspace: {e}"),
                "Check the workspace host and your network connection",
            )
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(InsightError::connection(
                format!("Databricks rejected the access token ({status})"),
                "Check that DATABRICKS_TOKEN is valid for this workspace",
            ));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(InsightError::database(format!(
                "Databricks API error {status}: {text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| InsightError::database(format!("Invalid Databricks response: {e}")))
    }
}

#[async_trait]
impl Backend for DatabricksBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Databricks
    }

    async fn execute(&self, sql: &str) -> InsightResult<ResultSet> {
        let mut response = self.submit(sql).await?;
        while response.is_running() {
            debug!(statement_id = %response.statement_id, state = %response.status.state, "Waiting for statement");
            tokio::time::sleep(POLL_INTERVAL).await;
            response = self.poll(&response.statement_id).await?;
        }
        if let Some(message) = response.failure() {
            return Err(InsightError::database(message));
        }

        let manifest_columns = response
            .manifest
            .map(|m| m.schema.columns)
            .unwrap_or_default();
        let categories: Vec<_> = manifest_columns
            .iter()
            .map(|c| categorize_type(&c.type_name, BackendKind::Databricks))
            .collect();
        let columns = manifest_columns.into_iter().map(|c| c.name).collect();

        let mut rows = Vec::new();
        let mut chunk = response.result.unwrap_or_default();
        loop {
            rows.extend(chunk.data_array.into_iter().map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(idx, cell)| match cell {
                        Some(text) => text_to_json(
                            &text,
                            categories.get(idx).copied().unwrap_or(TypeCategory::Unknown),
                        ),
                        None => JsonValue::Null,
                    })
                    .collect::<Vec<_>>()
            }));
            match chunk.next_chunk_internal_link {
                Some(link) => chunk = self.fetch_chunk(&link).await?,
                None => break,
            }
        }

        Ok(ResultSet::new(columns, rows))
    }

    async fn list_tables(&self) -> InsightResult<Vec<String>> {
        let sql = format!("SHOW TABLES IN {}", self.qualified_schema());
        let result = self.execute(&sql).await?;
        let mut tables: Vec<String> = (0..result.row_count())
            .filter_map(|i| {
                text_cell(&result, i, "tableName").or_else(|| {
                    result
                        .rows
                        .get(i)
                        .and_then(|row| row.get(1))
                        .and_then(|v| v.as_str().map(String::from))
                })
            })
            .collect();
        tables.sort();
        Ok(tables)
    }

    async fn describe_columns(&self, table: &str) -> InsightResult<Vec<ColumnDescriptor>> {
        let sql = format!(
            "DESCRIBE TABLE {}.{}",
            self.qualified_schema(),
            self.quote_identifier(table)
        );
        let result = self.execute(&sql).await?;
        let mut columns = Vec::new();
        for i in 0..result.row_count() {
            let Some(name) = text_cell(&result, i, "col_name") else {
                break;
            };
            // Partition and metadata sections follow a blank or '#' row
            if name.trim().is_empty() || name.starts_with('#') {
                break;
            }
            let data_type = text_cell(&result, i, "data_type").unwrap_or_default();
            columns.push(ColumnDescriptor::new(name, data_type));
        }
        if columns.is_empty() {
            warn!(table = %table, "DESCRIBE TABLE returned no columns");
        }
        Ok(columns)
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }
}
