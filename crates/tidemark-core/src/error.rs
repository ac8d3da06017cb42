//! Error types for Tidemark Core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using Tidemark's core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Tidemark core error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed migration file name: {0}")]
    MalformedName(String),

    #[error("Malformed migration file names: {}", .0.join(", "))]
    MalformedMigrations(Vec<String>),

    #[error("Cannot read migration directory {}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Latest recorded migration has no numeric prefix: {0}")]
    UnparsableWatermark(String),
}
