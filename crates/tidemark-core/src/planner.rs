//! Migration planner
//!
//! Decides which scanned files a run applies, and in which order. Files are
//! kept when their sequence number lies above the watermark and are ordered
//! by their full file name as plain strings, not by sequence number: `10-b.sql`
//! sorts before `9-a.sql`. Zero-pad prefixes to keep both orders in step.

use std::collections::{BTreeMap, HashMap};

use crate::migration::{MigrationFile, SequenceNumber};
use crate::record::Watermark;

/// Compute the ordered list of pending migrations
///
/// Inputs are not modified; the same watermark and files always produce the
/// same plan. Duplicate names collapse into one entry.
pub fn plan(watermark: Watermark, files: &[MigrationFile]) -> Vec<MigrationFile> {
    let pending: BTreeMap<&str, &MigrationFile> = files
        .iter()
        .filter(|file| watermark.is_pending(file))
        .map(|file| (file.name.as_str(), file))
        .collect();

    warn_shared_sequences(pending.values().copied());

    tracing::debug!(
        "Planned {} of {} migrations above watermark {}",
        pending.len(),
        files.len(),
        watermark
    );

    pending.into_values().cloned().collect()
}

fn warn_shared_sequences<'a>(files: impl Iterator<Item = &'a MigrationFile>) {
    let mut by_sequence: HashMap<SequenceNumber, Vec<&str>> = HashMap::new();
    for file in files {
        by_sequence.entry(file.sequence).or_default().push(&file.name);
    }
    for (sequence, names) in by_sequence {
        if names.len() > 1 {
            tracing::warn!(
                "Migrations share sequence number {}: {}",
                sequence,
                names.join(", ")
            );
        }
    }
}
