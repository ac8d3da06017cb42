//! Default command: apply pending migrations

use tidemark_runner::{Migrator, MigratorOptions};

use crate::highlight::formatter_for;
use crate::{AppContext, Cli};

pub async fn run(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::debug!("Running migrate command");

    let options = MigratorOptions::new(&ctx.settings.dir).with_echo(cli.verbose > 0);
    let migrator = Migrator::new(ctx.database.clone(), options)
        .with_formatter(formatter_for(ctx.settings.highlight.as_deref()));

    let report = migrator.run().await?;

    if report.is_noop() {
        println!("No pending migrations (watermark: {})", report.watermark);
        return Ok(());
    }

    println!(
        "Applied {} migration(s) in {} ms",
        report.applied.len(),
        report.execution_time_ms
    );

    if !report.unrecorded.is_empty() {
        eprintln!(
            "warning: applied but not recorded, add these to the migrations table by hand: {}",
            report.unrecorded.join(", ")
        );
    }

    Ok(())
}
