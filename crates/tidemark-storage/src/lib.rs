//! Tidemark Storage - Migration record stores and database backends
//!
//! A backend is both the store of applied-migration records and the
//! connection migration scripts are executed on.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub mod memory;

pub use error::{StorageError, StorageResult};
pub use traits::{Database, MigrationStore, ScriptRunner, MIGRATIONS_TABLE};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresStorage, PostgresSettings};

pub use memory::MemoryStorage;
