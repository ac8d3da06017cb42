//! Output formatting utilities

use chrono::{DateTime, Utc};
use tidemark_core::MigrationRecord;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Table,
        }
    }
}

const NAME_HEADER: &str = "Migration name";

/// RFC 822 style, always in UTC
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%d %b %y %H:%M UTC").to_string()
}

/// Render migration history, newest first as given
pub fn render_history(records: &[MigrationRecord], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Table => Ok(history_table(records)),
    }
}

fn history_table(records: &[MigrationRecord]) -> String {
    if records.is_empty() {
        return "No migrations applied yet".to_string();
    }

    let rows: Vec<(&str, String)> = records
        .iter()
        .map(|r| (r.name.as_str(), format_time(&r.applied_at)))
        .collect();

    let name_width = rows
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0)
        .max(NAME_HEADER.len());
    let time_width = rows
        .iter()
        .map(|(_, time)| time.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!(
        "o{}-{}o",
        titled(NAME_HEADER, name_width + 4),
        titled("Time", time_width + 4)
    ));
    for (name, time) in &rows {
        lines.push(format!(
            "|  {:<name_width$}  |  {:<time_width$}  |",
            name, time
        ));
    }
    lines.push(format!("o{}o", "-".repeat(name_width + time_width + 9)));

    lines.join("\n")
}

fn titled(title: &str, width: usize) -> String {
    let mut segment = format!("- {} ", title);
    let fill = width.saturating_sub(segment.chars().count());
    segment.push_str(&"-".repeat(fill));
    segment
}
