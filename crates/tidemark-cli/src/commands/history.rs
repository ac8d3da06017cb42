//! History command


use crate::output::{render_history, OutputFormat};
use crate::{AppContext, Cli};

pub async fn run(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::debug!("Running history command");

    ctx.database.ensure_schema().await?;
    let records = ctx.database.all().await?;
    tracing::info!("Found {} applied migrations", records.len());

    println!("{}", render_history(&records, OutputFormat::from(cli.format.as_str()))?);
    Ok(())
}
