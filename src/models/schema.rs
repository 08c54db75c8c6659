//! Schema-related data models.
//!
//! This module defines the structured schema descriptor produced by store
//! introspection and its text rendering used to ground translation prompts.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Header emitted before the per-table blocks.
pub const SCHEMA_HEADER: &str = "DATABASE SCHEMA INFORMATION:";

/// A column as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type as reported by the store (e.g. "VARCHAR(100)", "int8")
    pub data_type: String,
    pub primary_key: bool,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary_key: false,
        }
    }

    /// Set whether this column is part of the primary key.
    pub fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }
}

/// A table with its row count and ordered columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub row_count: u64,
    pub columns: Vec<ColumnDescriptor>,
}

/// Row count of a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub name: String,
    pub row_count: u64,
}

/// Ordered sequence of tables, in introspection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub tables: Vec<TableDescriptor>,
}

impl SchemaDescriptor {
    /// Look up a table by name (case-insensitive).
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Render the descriptor as the prompt text block.
    ///
    /// ```text
    /// DATABASE SCHEMA INFORMATION:
    ///
    /// Table: ACCOUNTS (15 rows)
    /// Columns:
    ///   - account_id: INTEGER (PRIMARY KEY)
    ///   - account_name: VARCHAR(100)
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(SCHEMA_HEADER);
        out.push_str("\n\n");

        for table in &self.tables {
            let _ = writeln!(
                out,
                "Table: {} ({} rows)",
                table.name.to_uppercase(),
                table.row_count
            );
            out.push_str("Columns:\n");
            for column in &table.columns {
                let data_type = if column.data_type.trim().is_empty() {
                    "unknown"
                } else {
                    column.data_type.as_str()
                };
                let pk = if column.primary_key {
                    " (PRIMARY KEY)"
                } else {
                    ""
                };
                let _ = writeln!(out, "  - {}: {}{}", column.name, data_type, pk);
            }
            out.push('\n');
        }

        out
    }
}
