//! Run error types

use std::path::PathBuf;

use thiserror::Error;
use tidemark_storage::StorageError;

/// Result type alias for run operations
pub type RunResult<T> = std::result::Result<T, RunError>;

/// Errors that end a run
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Core(#[from] tidemark_core::Error),

    #[error("Storage error")]
    Storage(#[from] StorageError),

    #[error("Cannot read migration {name} at {}: {error}", .path.display())]
    ReadMigration {
        name: String,
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Migration {name} failed: {error}")]
    Execution { name: String, error: StorageError },

    #[error("Run halted after applying {} migration(s): {cause}", .applied.len())]
    Halted {
        applied: Vec<String>,
        cause: Box<RunError>,
    },
}
