use thiserror::Error;

/// Error type for rowbind operations
#[derive(Debug, Error)]
pub enum RowBindError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column index {index} is out of range for {field_count} column(s)")]
    IndexOutOfRange { index: usize, field_count: usize },

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("Cursor is not positioned on a row")]
    NoCurrentRow,

    #[error("Mapping failed: {0}")]
    Mapping(String),

    #[error("Cannot convert column {column} to {target}")]
    Conversion { column: String, target: &'static str },

    #[error("There is no method {0}")]
    UnboundMethod(String),

    #[error("No connection string named {0}")]
    MissingConnection(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type alias for rowbind operations
pub type Result<T> = std::result::Result<T, RowBindError>;
