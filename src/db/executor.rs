//! Query execution engine.
//!
//! `QueryExecutor` is the single entry point for running SQL against the
//! configured store. Statements are sent verbatim; whatever the store accepts
//! is executed and whatever it rejects comes back as a database error.

use crate::config::BackendKind;
use crate::db::Backend;
use crate::error::InsightResult;
use crate::models::ResultSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Query executor over a shared backend.
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn Backend>,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Execute a statement and return its rows and column names.
    ///
    /// A statement that matches nothing yields an empty row list, not an error.
    pub async fn run(&self, sql: &str) -> InsightResult<ResultSet> {
        let start = Instant::now();
        debug!(sql = %sql, backend = %self.backend.kind(), "Executing query");

        match self.backend.execute(sql).await {
            Ok(result) => {
                debug!(
                    rows = result.row_count(),
                    columns = result.columns.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Query completed"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Query failed"
                );
                Err(e)
            }
        }
    }
}
