//! Storage backend trait definitions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tidemark_core::MigrationRecord;

use crate::error::StorageResult;

/// Name of the table holding applied-migration records
pub const MIGRATIONS_TABLE: &str = "migrations";

/// Durable record of applied migrations
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// Create the record table if it does not exist yet
    async fn ensure_schema(&self) -> StorageResult<()>;

    /// Most recently applied record, or `None` when nothing was applied
    async fn latest(&self) -> StorageResult<Option<MigrationRecord>>;

    /// Insert a record with an explicit application time
    async fn record_at(&self, name: &str, applied_at: DateTime<Utc>) -> StorageResult<()>;

    /// Insert a record stamped with the current time
    async fn record(&self, name: &str) -> StorageResult<()> {
        self.record_at(name, Utc::now()).await
    }

    /// Every record, newest first
    async fn all(&self) -> StorageResult<Vec<MigrationRecord>>;
}

/// Executes raw SQL scripts on the migration connection
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run a multi-statement script as one batch
    ///
    /// On failure, any transaction the script left open is rolled back
    /// before the error is returned.
    async fn execute_script(&self, sql: &str) -> StorageResult<()>;
}

/// A backend usable for a full migration run
pub trait Database: MigrationStore + ScriptRunner {}

impl<T: MigrationStore + ScriptRunner + ?Sized> Database for T {}
