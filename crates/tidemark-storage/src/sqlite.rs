//! SQLite storage backend

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tidemark_core::MigrationRecord;

use crate::error::{StorageError, StorageResult};
use crate::traits::{MigrationStore, ScriptRunner, MIGRATIONS_TABLE};

/// SQLite storage backend
///
/// Application times are stored as RFC 3339 UTC text with nanoseconds,
/// which sorts chronologically as plain text.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create a SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path).map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Create an in-memory SQLite database (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))
    }
}

fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_record(name: String, time: String) -> StorageResult<MigrationRecord> {
    let applied_at = DateTime::parse_from_rfc3339(&time)
        .map_err(|_| StorageError::InvalidTimestamp {
            name: name.clone(),
            value: time.clone(),
        })?
        .with_timezone(&Utc);
    Ok(MigrationRecord::new(name, applied_at))
}

#[async_trait]
impl MigrationStore for SqliteStorage {
    async fn ensure_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                time TEXT
            );
            "#
        ))?;
        Ok(())
    }

    async fn latest(&self) -> StorageResult<Option<MigrationRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT name, time FROM {MIGRATIONS_TABLE} ORDER BY time DESC, id DESC LIMIT 1"
                ),
                [],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(name, time)| decode_record(name, time)).transpose()
    }

    async fn record_at(&self, name: &str, applied_at: DateTime<Utc>) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO {MIGRATIONS_TABLE} (name, time) VALUES (?1, ?2)"),
            params![name, encode_time(applied_at)],
        )?;
        Ok(())
    }

    async fn all(&self) -> StorageResult<Vec<MigrationRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT name, time FROM {MIGRATIONS_TABLE} ORDER BY time DESC, id DESC"
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (name, time) = row?;
            records.push(decode_record(name, time)?);
        }

        Ok(records)
    }
}

#[async_trait]
impl ScriptRunner for SqliteStorage {
    async fn execute_script(&self, sql: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        if let Err(e) = conn.execute_batch(sql) {
            if !conn.is_autocommit() {
                if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                    tracing::warn!("Rollback after failed script also failed: {}", rollback);
                }
            }
            return Err(StorageError::Script(e.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn storage() -> SqliteStorage {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.ensure_schema().await.unwrap();
        storage
    }

    fn table_exists(storage: &SqliteStorage, table: &str) -> bool {
        let conn = storage.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let storage = storage().await;
        storage.ensure_schema().await.unwrap();
        assert!(table_exists(&storage, MIGRATIONS_TABLE));
    }

    #[tokio::test]
    async fn test_latest_on_empty_store() {
        let storage = storage().await;
        assert!(storage.latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_and_history_order() {
        let storage = storage().await;
        let t0 = Utc::now();
        storage.record_at("1-a.sql", t0).await.unwrap();
        storage.record_at("2-b.sql", t0 + Duration::milliseconds(5)).await.unwrap();

        let latest = storage.latest().await.unwrap().unwrap();
        assert_eq!(latest.name, "2-b.sql");
        assert_eq!(latest.applied_at, t0 + Duration::milliseconds(5));

        let names: Vec<_> = storage.all().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["2-b.sql", "1-a.sql"]);
    }

    #[tokio::test]
    async fn test_latest_follows_time_not_name() {
        let storage = storage().await;
        let t0 = Utc::now();
        storage.record_at("9-late.sql", t0).await.unwrap();
        storage.record_at("10-later.sql", t0 + Duration::seconds(1)).await.unwrap();

        assert_eq!(storage.latest().await.unwrap().unwrap().name, "10-later.sql");
    }

    #[tokio::test]
    async fn test_script_commits() {
        let storage = storage().await;
        storage
            .execute_script("BEGIN;\nCREATE TABLE users (id INTEGER);\nINSERT INTO users VALUES (1);\nCOMMIT;\n")
            .await
            .unwrap();
        assert!(table_exists(&storage, "users"));
    }

    #[tokio::test]
    async fn test_failed_script_rolls_back() {
        let storage = storage().await;
        let result = storage
            .execute_script("BEGIN;\nCREATE TABLE users (id INTEGER);\nNOT VALID SQL;\nCOMMIT;\n")
            .await;

        assert!(matches!(result, Err(StorageError::Script(_))));
        assert!(!table_exists(&storage, "users"));

        // The connection is usable again afterwards
        storage.record("1-a.sql").await.unwrap();
        assert_eq!(storage.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_stored_time() {
        let storage = storage().await;
        {
            let conn = storage.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO migrations (name, time) VALUES ('1-a.sql', 'yesterday')",
                [],
            )
            .unwrap();
        }
        assert!(matches!(
            storage.latest().await,
            Err(StorageError::InvalidTimestamp { .. })
        ));
    }
}
