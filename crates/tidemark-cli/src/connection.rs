//! Connection provisioning

use std::sync::Arc;

use anyhow::Context;
use tidemark_storage::{Database, PostgresStorage, SqliteStorage};

use crate::config::Settings;

/// Open the database named by `settings`
///
/// `sqlite` selects a SQLite file; otherwise the PostgreSQL parameters are used.
pub async fn connect(settings: &Settings) -> anyhow::Result<Arc<dyn Database>> {
    if let Some(path) = &settings.sqlite {
        tracing::debug!("Using SQLite database at {}", path.display());
        let storage = SqliteStorage::open(path)
            .with_context(|| format!("Cannot open SQLite database {}", path.display()))?;
        return Ok(Arc::new(storage));
    }

    tracing::debug!(
        "Connecting to postgres {}@{}:{}/{} (sslmode={})",
        settings.user,
        settings.host,
        settings.port,
        settings.database,
        settings.sslmode
    );
    let storage = PostgresStorage::connect(&settings.postgres()).await?;
    Ok(Arc::new(storage))
}
