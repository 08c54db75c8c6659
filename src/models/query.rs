//! Query-related data models.
//!
//! This module defines the result set returned by every executed statement.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Rows and column names produced by a single statement execution.
///
/// An empty `rows` vector is a valid outcome ("no matching data"), distinct
/// from an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Empty when the statement has no result descriptor (e.g. DDL)
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl ResultSet {
    /// Create a result set from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<JsonValue>>) -> Self {
        Self { columns, rows }
    }

    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First value of the first row, if any.
    pub fn scalar(&self) -> Option<&JsonValue> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Value at (row, column name).
    pub fn value(&self, row: usize, column: &str) -> Option<&JsonValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Split into (rows, column names).
    pub fn into_parts(self) -> (Vec<Vec<JsonValue>>, Vec<String>) {
        (self.rows, self.columns)
    }
}

/// Interpret a result value as a float.
///
/// Exact decimals arrive as strings from PostgreSQL and MySQL, so numeric
/// strings are parsed as well.
pub fn value_as_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Interpret a result value as an integer.
pub fn value_as_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_and_value_lookup() {
        let rs = ResultSet::new(
            vec!["status".to_string(), "count".to_string()],
            vec![vec![json!("Approved"), json!(8)]],
        );
        assert_eq!(rs.scalar(), Some(&json!("Approved")));
        assert_eq!(rs.value(0, "count"), Some(&json!(8)));
        assert_eq!(rs.value(1, "count"), None);
        assert_eq!(rs.value(0, "missing"), None);
    }

    #[test]
    fn test_empty_result_keeps_columns() {
        let rs = ResultSet::new(vec!["claim_id".to_string()], Vec::new());
        assert!(rs.is_empty());
        assert_eq!(rs.scalar(), None);
        let (rows, columns) = rs.into_parts();
        assert!(rows.is_empty());
        assert_eq!(columns, vec!["claim_id"]);
    }

    #[test]
    fn test_value_as_numbers() {
        assert_eq!(value_as_f64(&json!(12.5)), Some(12.5));
        assert_eq!(value_as_f64(&json!("1200.00")), Some(1200.0));
        assert_eq!(value_as_f64(&JsonValue::Null), None);
        assert_eq!(value_as_i64(&json!(7)), Some(7));
        assert_eq!(value_as_i64(&json!("42")), Some(42));
        assert_eq!(value_as_i64(&json!(3.0)), Some(3));
    }
}
