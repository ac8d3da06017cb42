//! Storage error types

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Invalid stored timestamp for {name}: {value}")]
    InvalidTimestamp { name: String, value: String },

    #[cfg(feature = "sqlite")]
    #[error("SQLite error")]
    Sqlite(#[from] ::rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error")]
    Postgres(#[from] ::sqlx::Error),
}
