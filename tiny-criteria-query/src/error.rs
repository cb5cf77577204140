//! Error types for criteria rendering and execution.
//!
//! The facade itself never creates errors: it forwards whatever the
//! execution layer reports. The taxonomy below is what the execution layer
//! (the SQL renderer and the engines) uses.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: P{category}{number}
//! - 1xxx: Query errors (invalid path, invalid filter)
//! - 3xxx: Connection errors
//! - 5xxx: Execution errors (timeout, database)
//! - 6xxx: Data errors (serialization)
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use tiny_criteria_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::invalid_path("User", "adress.city");
//! assert_eq!(err.code, ErrorCode::InvalidPath);
//! assert!(err.to_string().starts_with("[P1003]"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Query errors (1xxx)
    /// A dotted path does not resolve to a relation or column (P1003).
    InvalidPath = 1003,
    /// A predicate cannot be rendered (P1004).
    InvalidFilter = 1004,

    // Connection errors (3xxx)
    /// Database connection failed (P3001).
    ConnectionFailed = 3001,

    // Query execution errors (5xxx)
    /// Query timeout (P5001).
    QueryTimeout = 5001,
    /// General database error (P5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Serialization error (P6002).
    SerializationError = 6002,
    /// Deserialization error (P6003).
    DeserializationError = 6003,

    // Configuration errors (7xxx)
    /// Invalid configuration (P7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (P9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "P1003").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidPath => "Invalid attribute path",
            Self::InvalidFilter => "Invalid filter condition",
            Self::ConnectionFailed => "Database connection failed",
            Self::QueryTimeout => "Query timeout",
            Self::DatabaseError => "Database error",
            Self::SerializationError => "Serialization error",
            Self::DeserializationError => "Deserialization error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The entity involved.
    pub model: Option<String>,
    /// The attribute or path involved.
    pub field: Option<String>,
    /// The SQL statement (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

/// Errors raised by the execution layer.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Set the entity.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the attribute or path.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the SQL statement.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A path segment names neither a relation nor a column of `model`.
    pub fn invalid_path(model: impl Into<String>, attribute: impl Into<String>) -> Self {
        let model = model.into();
        let attribute = attribute.into();
        Self::new(
            ErrorCode::InvalidPath,
            format!("Unable to resolve attribute '{}' on {}", attribute, model),
        )
        .with_model(&model)
        .with_field(&attribute)
        .with_suggestion(format!("Check the columns and relations declared for {}", model))
    }

    /// Create an invalid filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFilter, format!("Invalid filter: {}", message.into()))
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConnectionFailed,
            format!("Connection error: {}", message.into()),
        )
        .with_suggestion("Verify the database path or URL is correct")
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::QueryTimeout,
            format!("Query timed out after {}ms", duration_ms),
        )
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
            .with_suggestion("Check the database logs for more details")
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message.into())
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DeserializationError,
            format!("Failed to deserialize result: {}", message.into()),
        )
        .with_suggestion("Check that the entity type matches the table schema")
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message.into()),
        )
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    // ============== Error Checks ==============

    /// Check if this is an unresolved path.
    pub fn is_invalid_path(&self) -> bool {
        self.code == ErrorCode::InvalidPath
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::QueryTimeout
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        self.code == ErrorCode::ConnectionFailed
    }

    /// Display the error with its context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);

        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Entity: {}\n", model));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Attribute: {}\n", field));
        }
        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.chars().count() > 200 {
                format!("{}...", sql.chars().take(200).collect::<String>())
            } else {
                sql.clone()
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::deserialization(err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::InvalidPath.code(), "P1003");
        assert_eq!(ErrorCode::ConnectionFailed.code(), "P3001");
        assert_eq!(ErrorCode::DeserializationError.code(), "P6003");
    }

    #[test]
    fn test_invalid_path_error() {
        let err = QueryError::invalid_path("User", "nickname");
        assert!(err.is_invalid_path());
        assert_eq!(err.context.model.as_deref(), Some("User"));
        assert_eq!(err.context.field.as_deref(), Some("nickname"));
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn test_connection_and_timeout() {
        assert!(QueryError::connection("refused").is_connection_error());
        assert!(QueryError::timeout(250).is_timeout());
        assert!(!QueryError::database("boom").is_timeout());
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::invalid_path("Order", "totl").with_sql("SELECT t0.* FROM orders t0");

        let output = err.display_full();
        assert!(output.contains("P1003"));
        assert!(output.contains("Order"));
        assert!(output.contains("SELECT t0.*"));
        assert!(output.contains("Suggestions"));
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let err: QueryError = json_err.into();
        assert_eq!(err.code, ErrorCode::DeserializationError);
        assert!(std::error::Error::source(&err).is_some());
    }
}
