//! In-memory storage backend for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::RwLock;
use tidemark_core::MigrationRecord;

use crate::error::{StorageError, StorageResult};
use crate::traits::{MigrationStore, ScriptRunner};

/// In-memory storage backend
///
/// Keeps records and executed scripts in memory. Failures can be injected
/// to exercise the runner's error paths.
pub struct MemoryStorage {
    records: RwLock<Vec<(u64, MigrationRecord)>>,
    scripts: RwLock<Vec<String>>,
    fail_marker: Option<String>,
    fail_records: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            scripts: RwLock::new(Vec::new()),
            fail_marker: None,
            fail_records: false,
        }
    }

    /// Fail every script whose text contains `marker`
    pub fn fail_scripts_containing(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Fail every `record` call
    pub fn fail_records(mut self) -> Self {
        self.fail_records = true;
        self
    }

    /// Scripts executed successfully so far, in order
    pub fn executed_scripts(&self) -> StorageResult<Vec<String>> {
        let scripts = self
            .scripts
            .read()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        Ok(scripts.clone())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MigrationStore for MemoryStorage {
    async fn ensure_schema(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn latest(&self) -> StorageResult<Option<MigrationRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        Ok(records
            .iter()
            .max_by_key(|(id, record)| (record.applied_at, *id))
            .map(|(_, record)| record.clone()))
    }

    async fn record_at(&self, name: &str, applied_at: DateTime<Utc>) -> StorageResult<()> {
        if self.fail_records {
            return Err(StorageError::Database(format!(
                "record rejected for {}",
                name
            )));
        }
        let mut records = self
            .records
            .write()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        let id = records.len() as u64 + 1;
        records.push((id, MigrationRecord::new(name, applied_at)));
        Ok(())
    }

    async fn all(&self) -> StorageResult<Vec<MigrationRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        let mut ordered: Vec<_> = records.iter().collect();
        ordered.sort_by(|(a_id, a), (b_id, b)| {
            b.applied_at.cmp(&a.applied_at).then(b_id.cmp(a_id))
        });
        Ok(ordered.into_iter().map(|(_, record)| record.clone()).collect())
    }
}

#[async_trait]
impl ScriptRunner for MemoryStorage {
    async fn execute_script(&self, sql: &str) -> StorageResult<()> {
        if let Some(marker) = &self.fail_marker {
            if sql.contains(marker.as_str()) {
                return Err(StorageError::Script(format!(
                    "script contains failing marker '{}'",
                    marker
                )));
            }
        }
        let mut scripts = self
            .scripts
            .write()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        scripts.push(sql.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_memory_store_empty() {
        let storage = MemoryStorage::new();
        storage.ensure_schema().await.unwrap();
        assert!(storage.latest().await.unwrap().is_none());
        assert!(storage.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_ordering() {
        let storage = MemoryStorage::new();
        let t0 = Utc::now();
        storage.record_at("1-a.sql", t0).await.unwrap();
        storage.record_at("2-b.sql", t0 + Duration::seconds(1)).await.unwrap();

        let latest = storage.latest().await.unwrap().unwrap();
        assert_eq!(latest.name, "2-b.sql");

        let names: Vec<_> = storage.all().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["2-b.sql", "1-a.sql"]);
    }

    #[tokio::test]
    async fn test_memory_store_equal_times_use_insert_order() {
        let storage = MemoryStorage::new();
        let t0 = Utc::now();
        storage.record_at("1-a.sql", t0).await.unwrap();
        storage.record_at("2-b.sql", t0).await.unwrap();

        assert_eq!(storage.latest().await.unwrap().unwrap().name, "2-b.sql");
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let storage = MemoryStorage::new()
            .fail_scripts_containing("BROKEN")
            .fail_records();

        assert!(storage.execute_script("SELECT 1;").await.is_ok());
        assert!(matches!(
            storage.execute_script("BROKEN;").await,
            Err(StorageError::Script(_))
        ));
        assert!(storage.record("1-a.sql").await.is_err());
        assert_eq!(storage.executed_scripts().unwrap(), vec!["SELECT 1;"]);
    }
}
