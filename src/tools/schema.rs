//! Schema description for prompt grounding.
//!
//! `SchemaDescriber` introspects the live store (tables, row counts, columns)
//! and renders the text block the translator embeds in every prompt.

use crate::db::QueryExecutor;
use crate::error::{InsightError, InsightResult};
use crate::models::{ResultSet, SchemaDescriptor, TableDescriptor, TableStats};
use tracing::debug;

/// Foreign-key links among the insurance tables.
///
/// Drivers differ in how (or whether) they expose foreign keys, so the links
/// are written out by hand.
pub const RELATIONSHIP_NOTES: &str = "TABLE RELATIONSHIPS:

accounts ← policies (account_id)
agents ← policies (agent_id)
accounts ← quoted_policies (account_id)
agents ← quoted_policies (agent_id)
quoted_policies ← issued_policies (quote_id)
policies ← issued_policies (policy_id)
accounts ← issued_policies (account_id)
policies ← claims (policy_id)
accounts ← claims (account_id)
claims ← ongoing_claims (claim_id)
accounts ← ongoing_claims (account_id)
";

pub struct SchemaDescriber {
    executor: QueryExecutor,
}

impl SchemaDescriber {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// Structured schema: every table with its row count and columns.
    ///
    /// Issues one row-count query and one column query per table. Any
    /// failure fails the whole call.
    pub async fn introspect(&self) -> InsightResult<SchemaDescriptor> {
        let backend = self.executor.backend();
        let names = backend.list_tables().await?;
        debug!(tables = names.len(), "Introspecting schema");

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let row_count = backend.row_count(&name).await?;
            let columns = backend.describe_columns(&name).await?;
            debug!(table = %name, row_count, columns = columns.len(), "Described table");
            tables.push(TableDescriptor {
                name,
                row_count,
                columns,
            });
        }
        Ok(SchemaDescriptor { tables })
    }

    /// The schema as prompt text.
    pub async fn describe_schema(&self) -> InsightResult<String> {
        Ok(self.introspect().await?.render())
    }

    pub fn relationship_notes(&self) -> &'static str {
        RELATIONSHIP_NOTES
    }

    /// Schema text followed by the relationship notes.
    pub async fn full_schema_prompt(&self) -> InsightResult<String> {
        let schema = self.describe_schema().await?;
        Ok(format!("{schema}\n{}", self.relationship_notes()))
    }

    /// Row counts for every table.
    pub async fn database_stats(&self) -> InsightResult<Vec<TableStats>> {
        let backend = self.executor.backend();
        let mut stats = Vec::new();
        for name in backend.list_tables().await? {
            let row_count = backend.row_count(&name).await?;
            stats.push(TableStats { name, row_count });
        }
        Ok(stats)
    }

    /// First `limit` rows of a table.
    pub async fn sample_rows(&self, table: &str, limit: u32) -> InsightResult<ResultSet> {
        if table.trim().is_empty() {
            return Err(InsightError::invalid_input("Table name must not be empty"));
        }
        if limit == 0 {
            return Err(InsightError::invalid_input("Sample limit must be at least 1"));
        }
        let backend = self.executor.backend();
        let sql = format!(
            "SELECT * FROM {} LIMIT {limit}",
            backend.quote_identifier(table)
        );
        self.executor.run(&sql).await
    }
}
