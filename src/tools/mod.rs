//! Pipeline components.
//!
//! - `schema`: live schema description for prompt grounding
//! - `translate`: question to SQL via the completion model
//! - `metrics`: fixed dashboard aggregates
//! - `format`: result set rendering

pub mod format;
pub mod metrics;
pub mod schema;
pub mod translate;

pub use format::{OutputFormat, format_result_set};
pub use metrics::MetricsAggregator;
pub use schema::{RELATIONSHIP_NOTES, SchemaDescriber};
pub use translate::{PromptTranslator, clean_sql_response};
