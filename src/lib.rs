//! InsightIQ Library
//!
//! Natural-language questions over an insurance database: live schema
//! description, SQL generation with a completion model, verbatim query
//! execution and fixed dashboard metrics (SQLite, PostgreSQL, MySQL,
//! Databricks).

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod tools;

pub use config::Config;
pub use error::{InsightError, InsightResult};
pub use tools::{MetricsAggregator, PromptTranslator, SchemaDescriber};
