//! Integration tests for verbatim query execution against SQLite.

mod common;

use common::{empty_db, seeded_db};
use insightiq::db::{Backend, QueryExecutor, SqliteBackend};
use insightiq::error::InsightError;
use insightiq::models::value_as_f64;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_no_match_returns_columns_without_rows() {
    let db = seeded_db().await;
    let result = db
        .executor()
        .run("SELECT * FROM claims WHERE 1=0")
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(
        result.columns,
        vec![
            "claim_id",
            "policy_id",
            "account_id",
            "claim_number",
            "claim_date",
            "claim_amount",
            "approved_amount",
            "claim_type",
            "status"
        ]
    );
}

#[tokio::test]
async fn test_count_returns_single_cell() {
    let db = seeded_db().await;
    let result = db
        .executor()
        .run("SELECT COUNT(*) AS total_accounts FROM accounts")
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["total_accounts"]);
    assert_eq!(result.rows, vec![vec![json!(4)]]);
}

#[tokio::test]
async fn test_values_keep_storage_types() {
    let db = seeded_db().await;
    let result = db
        .executor()
        .run("SELECT policy_number, premium_amount, coverage_amount FROM policies WHERE policy_id = 1")
        .await
        .unwrap();

    assert_eq!(result.value(0, "policy_number"), Some(&json!("POL-0001")));
    assert_eq!(result.value(0, "premium_amount"), Some(&json!(1000.5)));
    assert_eq!(result.value(0, "coverage_amount"), Some(&json!(500000)));
}

#[tokio::test]
async fn test_null_and_aggregates() {
    let db = seeded_db().await;
    let result = db
        .executor()
        .run("SELECT approved_amount, (SELECT SUM(claim_amount) FROM claims) AS total FROM claims WHERE claim_id = 3")
        .await
        .unwrap();

    assert_eq!(result.value(0, "approved_amount"), Some(&json!(null)));
    assert_eq!(
        result.value(0, "total").and_then(value_as_f64),
        Some(5900.0)
    );
}

#[tokio::test]
async fn test_malformed_sql_is_database_error() {
    let db = seeded_db().await;
    let err = db.executor().run("SELEC * FROM claims").await.unwrap_err();

    assert!(matches!(err, InsightError::Database { .. }));
    assert!(err.to_string().starts_with("Database error:"));
}

#[tokio::test]
async fn test_missing_table_is_database_error() {
    let db = seeded_db().await;
    let err = db.executor().run("SELECT * FROM payments").await.unwrap_err();

    assert!(err.to_string().contains("no such table"));
    assert!(err.suggestion().is_some());
}

#[tokio::test]
async fn test_ddl_has_no_columns() {
    let db = seeded_db().await;
    let executor = db.executor();
    let result = executor
        .run("CREATE TABLE notes (note_id INTEGER PRIMARY KEY, body TEXT)")
        .await
        .unwrap();

    assert!(result.columns.is_empty());
    assert!(result.is_empty());

    // Each call opens its own connection, so the change is visible afterwards
    let tables = executor.backend().list_tables().await.unwrap();
    assert!(tables.contains(&"notes".to_string()));
}

#[tokio::test]
async fn test_missing_file_is_connection_error() {
    let db = empty_db();
    let path = format!("{}-missing", db.path);
    let executor = QueryExecutor::new(Arc::new(SqliteBackend::new(path).unwrap()));

    let err = executor.run("SELECT 1").await.unwrap_err();
    assert!(matches!(err, InsightError::Connection { .. }));
}

#[tokio::test]
async fn test_introspection() {
    let db = seeded_db().await;
    let executor = db.executor();
    let backend = executor.backend();

    let tables = backend.list_tables().await.unwrap();
    assert_eq!(
        tables,
        vec![
            "accounts",
            "agents",
            "claims",
            "issued_policies",
            "ongoing_claims",
            "policies",
            "quoted_policies"
        ]
    );

    let columns = backend.describe_columns("claims").await.unwrap();
    assert_eq!(columns.len(), 9);
    assert_eq!(columns[0].name, "claim_id");
    assert_eq!(columns[0].data_type, "INTEGER");
    assert!(columns[0].primary_key);
    assert!(columns[1..].iter().all(|c| !c.primary_key));
    assert_eq!(columns[5].data_type, "DECIMAL(12,2)");

    assert_eq!(backend.row_count("claims").await.unwrap(), 4);
}
