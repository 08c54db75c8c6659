//! Error types for InsightIQ.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Store and translation failures are reported generically with the underlying
//! message; each variant can carry a suggestion for the end user.

use thiserror::Error;

/// Shown for every store or translation failure at the command line.
pub const REPHRASE_HINT: &str =
    "Try rephrasing your question or check the example questions (insightiq examples)";

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    /// Generic store error: malformed SQL, constraint violation, missing table.
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Translation error: {message}")]
    Translation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl InsightError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a store error wrapping the driver message.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a translation error.
    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { .. } | Self::Translation { .. } => Some(REPHRASE_HINT),
            Self::Config { .. } => Some("Check the command line flags and environment variables"),
            Self::InvalidInput { .. } => None,
        }
    }

    /// Every hint to print under the error message, most specific first.
    pub fn hints(&self) -> Vec<&str> {
        let mut hints: Vec<&str> = self.suggestion().into_iter().collect();
        if matches!(self, Self::Connection { .. }) {
            hints.push(REPHRASE_HINT);
        }
        hints
    }

    /// True for failures originating in the store (connection or SQL execution).
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Database { .. })
    }
}

/// Convert sqlx errors to InsightError.
impl From<sqlx::Error> for InsightError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => InsightError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Io(io_err) => InsightError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => InsightError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Database(db_err) => InsightError::database(db_err.message()),
            other => InsightError::database(other.to_string()),
        }
    }
}

/// Result type alias for InsightIQ operations.
pub type InsightResult<T> = Result<T, InsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_display_wraps_driver_message() {
        let err = InsightError::database("no such table: quotes");
        assert_eq!(err.to_string(), "Database error: no such table: quotes");
    }

    #[test]
    fn test_translation_error_display() {
        let err = InsightError::translation("API returned 503");
        assert!(err.to_string().starts_with("Translation error"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = InsightError::connection("refused", "Check the host");
        assert_eq!(err.suggestion(), Some("Check the host"));
        assert!(
            InsightError::database("boom")
                .suggestion()
                .is_some_and(|s| s.contains("rephrasing"))
        );
        assert_eq!(InsightError::invalid_input("x").suggestion(), None);
    }

    #[test]
    fn test_hints() {
        let err = InsightError::connection("refused", "Check the host");
        assert_eq!(err.hints(), vec!["Check the host", REPHRASE_HINT]);
        assert_eq!(InsightError::database("x").hints(), vec![REPHRASE_HINT]);
        assert_eq!(InsightError::translation("x").hints(), vec![REPHRASE_HINT]);
        assert!(InsightError::invalid_input("x").hints().is_empty());
        assert!(REPHRASE_HINT.contains("insightiq examples"));
    }

    #[test]
    fn test_store_error_classification() {
        assert!(InsightError::database("x").is_store_error());
        assert!(InsightError::connection("x", "y").is_store_error());
        assert!(!InsightError::translation("x").is_store_error());
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let err: InsightError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, InsightError::Database { .. }));
    }
}
