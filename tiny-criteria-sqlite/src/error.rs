//! Error types for SQLite operations.

use thiserror::Error;

use tiny_criteria_query::QueryError;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Driver error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The database could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),
    /// A value could not be bound or read.
    #[error("Type conversion error: {0}")]
    TypeConversion(String),
    /// A statement exceeded the configured query timeout.
    #[error("Query timed out after {0}ms")]
    Timeout(u64),
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }
}

impl From<rusqlite::Error> for SqliteError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(tokio_rusqlite::Error::Rusqlite(err))
    }
}

impl From<SqliteError> for QueryError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Sqlite(e) => QueryError::database(e.to_string()),
            SqliteError::Config(msg) => QueryError::configuration(msg),
            SqliteError::Connection(msg) => QueryError::connection(msg),
            SqliteError::TypeConversion(msg) => QueryError::serialization(msg),
            SqliteError::Timeout(ms) => QueryError::timeout(ms),
        }
    }
}
