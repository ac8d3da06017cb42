//! Migration executor and run loop

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tidemark_core::{plan, scan, MigrationFile, MigrationRecord, Passthrough, SqlFormatter, Watermark};
use tidemark_storage::Database;

use crate::error::{RunError, RunResult};
use crate::report::RunReport;

/// Wrap a migration's SQL in an explicit transaction
pub fn wrap_in_transaction(sql: &str) -> String {
    format!("BEGIN;\n{}\nCOMMIT;\n", sql)
}

/// Render an error with its source chain on one line
fn describe(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

/// Options for a migration run
#[derive(Debug, Clone)]
pub struct MigratorOptions {
    /// Directory holding the migration files
    pub dir: PathBuf,

    /// Print each wrapped script before executing it
    pub echo_sql: bool,
}

impl MigratorOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            echo_sql: false,
        }
    }

    pub fn with_echo(mut self, echo_sql: bool) -> Self {
        self.echo_sql = echo_sql;
        self
    }
}

/// Result of applying one migration whose SQL committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Recorded,
    /// The SQL committed but writing the record failed
    Unrecorded { error: String },
}

/// Applies pending migrations from a directory to one database
pub struct Migrator {
    db: Arc<dyn Database>,
    formatter: Arc<dyn SqlFormatter>,
    options: MigratorOptions,
}

impl Migrator {
    pub fn new(db: Arc<dyn Database>, options: MigratorOptions) -> Self {
        Self {
            db,
            formatter: Arc::new(Passthrough),
            options,
        }
    }

    /// Use `formatter` when echoing SQL
    pub fn with_formatter(mut self, formatter: Arc<dyn SqlFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Discover, plan and apply every pending migration
    ///
    /// Stops at the first migration that cannot be read or executed. Earlier
    /// migrations of the run stay committed and recorded.
    pub async fn run(&self) -> RunResult<RunReport> {
        let start_time = Instant::now();

        self.db.ensure_schema().await?;

        let latest = self.db.latest().await?;
        let watermark = Watermark::from_latest(latest.as_ref())?;
        match &latest {
            Some(record) => tracing::info!(
                "Latest migration: {} (migrated {})",
                record.name,
                record.applied_at
            ),
            None => tracing::info!("No migrations applied yet"),
        }

        let files = scan(&self.options.dir)?.into_files()?;
        let pending = plan(watermark, &files);

        let mut report = RunReport {
            latest,
            watermark,
            planned: pending.iter().map(|f| f.name.clone()).collect(),
            ..RunReport::default()
        };

        if pending.is_empty() {
            tracing::info!("No pending migrations above watermark {}", watermark);
            report.execution_time_ms = start_time.elapsed().as_millis();
            return Ok(report);
        }

        for file in &pending {
            println!("Applying migration: {}", file.name);

            match self.apply(file).await {
                Ok(ApplyOutcome::Recorded) => report.applied.push(file.name.clone()),
                Ok(ApplyOutcome::Unrecorded { .. }) => {
                    report.applied.push(file.name.clone());
                    report.unrecorded.push(file.name.clone());
                }
                Err(error) => {
                    return Err(RunError::Halted {
                        applied: report.applied,
                        cause: Box::new(error),
                    });
                }
            }
        }

        report.execution_time_ms = start_time.elapsed().as_millis();
        Ok(report)
    }

    /// Apply a single migration and record it
    pub async fn apply(&self, file: &MigrationFile) -> RunResult<ApplyOutcome> {
        let path = self.options.dir.join(&file.name);
        let sql = tokio::fs::read_to_string(&path)
            .await
            .map_err(|error| RunError::ReadMigration {
                name: file.name.clone(),
                path: path.clone(),
                error,
            })?;

        let script = wrap_in_transaction(&sql);
        if self.options.echo_sql {
            println!("{}", self.formatter.format(&script));
        }

        self.db
            .execute_script(&script)
            .await
            .map_err(|error| RunError::Execution {
                name: file.name.clone(),
                error,
            })?;

        // The SQL is committed at this point; a missing record is reported, not fatal
        if let Err(e) = self.db.record(&file.name).await {
            let error = describe(&e);
            tracing::warn!(
                "Migration {} applied but could not be recorded: {}",
                file.name,
                error
            );
            return Ok(ApplyOutcome::Unrecorded { error });
        }

        tracing::info!("Migration {} successfully applied", file.name);
        Ok(ApplyOutcome::Recorded)
    }

    /// Every applied migration, newest first
    pub async fn history(&self) -> RunResult<Vec<MigrationRecord>> {
        Ok(self.db.all().await?)
    }
}
