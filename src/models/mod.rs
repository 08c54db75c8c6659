//! Data models for InsightIQ.
//!
//! This module re-exports all model types used throughout the application.

pub mod metrics;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use metrics::{ConversionMetrics, DashboardSnapshot, Metric, QuickStats, conversion_rate};
pub use query::{ResultSet, value_as_f64, value_as_i64};
pub use schema::{
    ColumnDescriptor, SCHEMA_HEADER, SchemaDescriptor, TableDescriptor, TableStats,
};
