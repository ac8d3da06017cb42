//! PostgreSQL storage backend

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::Row;
use tidemark_core::MigrationRecord;

use crate::error::{StorageError, StorageResult};
use crate::traits::{MigrationStore, ScriptRunner, MIGRATIONS_TABLE};

/// Connection parameters for a PostgreSQL server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// One of `disable`, `allow`, `prefer`, `require`, `verify-ca`, `verify-full`
    pub ssl_mode: String,
}

impl PostgresSettings {
    fn connect_options(&self) -> StorageResult<PgConnectOptions> {
        let ssl_mode: PgSslMode = self.ssl_mode.parse().map_err(|_| {
            StorageError::Connection(format!("unknown sslmode '{}'", self.ssl_mode))
        })?;

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .ssl_mode(ssl_mode);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        Ok(options)
    }
}

/// Wall-clock value stored in the `TIMESTAMP` column
///
/// Rows are kept in the host's local time so that tables written by earlier
/// deployments, which stored local time, keep sorting chronologically.
fn encode_time(applied_at: DateTime<Utc>) -> NaiveDateTime {
    applied_at.with_timezone(&Local).naive_local()
}

/// Inverse of [`encode_time`]; an ambiguous local time resolves to the earlier instant
fn decode_time(name: &str, time: NaiveDateTime) -> StorageResult<DateTime<Utc>> {
    Local
        .from_local_datetime(&time)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| StorageError::InvalidTimestamp {
            name: name.to_string(),
            value: time.to_string(),
        })
}

/// PostgreSQL storage backend
///
/// Uses a pool capped at one connection so every script and record runs on
/// the same session. The record table matches `id SERIAL, name TEXT,
/// time TIMESTAMP`, with times in the host's local wall-clock time.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connect using explicit settings
    pub async fn connect(settings: &PostgresSettings) -> StorageResult<Self> {
        let options = settings.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                StorageError::Connection(format!(
                    "{}@{}:{}/{}: {}",
                    settings.user, settings.host, settings.port, settings.database, e
                ))
            })?;

        tracing::debug!(
            "Connected to postgres at {}:{}/{}",
            settings.host,
            settings.port,
            settings.database
        );
        Ok(Self { pool })
    }

    fn decode_row(row: &sqlx::postgres::PgRow) -> StorageResult<MigrationRecord> {
        let name: String = row.try_get("name")?;
        let time: NaiveDateTime = row.try_get("time")?;
        let applied_at = decode_time(&name, time)?;
        Ok(MigrationRecord::new(name, applied_at))
    }
}

#[async_trait]
impl MigrationStore for PostgresStorage {
    async fn ensure_schema(&self) -> StorageResult<()> {
        sqlx::raw_sql(&format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                id SERIAL PRIMARY KEY,
                name TEXT,
                time TIMESTAMP
            )"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest(&self) -> StorageResult<Option<MigrationRecord>> {
        let row = sqlx::query(&format!(
            "SELECT name, time FROM {MIGRATIONS_TABLE} ORDER BY time DESC, id DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn record_at(&self, name: &str, applied_at: DateTime<Utc>) -> StorageResult<()> {
        sqlx::query(&format!(
            "INSERT INTO {MIGRATIONS_TABLE} (name, time) VALUES ($1, $2)"
        ))
        .bind(name)
        .bind(encode_time(applied_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn all(&self) -> StorageResult<Vec<MigrationRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT name, time FROM {MIGRATIONS_TABLE} ORDER BY time DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode_row).collect()
    }
}

#[async_trait]
impl ScriptRunner for PostgresStorage {
    async fn execute_script(&self, sql: &str) -> StorageResult<()> {
        // Simple-query protocol: the whole batch is sent as one message
        if let Err(e) = sqlx::raw_sql(sql).execute(&self.pool).await {
            if let Err(rollback) = sqlx::raw_sql("ROLLBACK").execute(&self.pool).await {
                tracing::warn!("Rollback after failed script also failed: {}", rollback);
            }
            return Err(StorageError::Script(e.to_string()));
        }
        Ok(())
    }
}
