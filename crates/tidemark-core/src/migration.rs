//! Migration file naming contract
//!
//! A migration file is named `<digits>-<description>.sql`. The digits before
//! the first `-` are the sequence number; the full file name is the key used
//! for storage, display, and reading the file back from disk.

use serde::Serialize;

use crate::error::{Error, Result};

/// Suffix every migration file must carry (case-sensitive)
pub const MIGRATION_EXTENSION: &str = ".sql";

/// Separator between the sequence number and the description
pub const SEQUENCE_SEPARATOR: char = '-';

/// Sequence number parsed from a migration file name
pub type SequenceNumber = u64;

/// A well-formed migration file discovered in the migration directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MigrationFile {
    /// Number parsed from the prefix before the first `-`
    pub sequence: SequenceNumber,

    /// Complete file name, e.g. `0001-create-users.sql`
    pub name: String,
}

impl MigrationFile {
    /// Parse a file name into a migration descriptor
    pub fn parse(name: &str) -> Result<Self> {
        if !is_migration_name(name) {
            return Err(Error::MalformedName(name.to_string()));
        }
        let sequence = parse_sequence(name).ok_or_else(|| Error::MalformedName(name.to_string()))?;
        Ok(Self {
            sequence,
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for MigrationFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Whether a directory entry name is a migration candidate at all
pub fn is_migration_name(name: &str) -> bool {
    name.ends_with(MIGRATION_EXTENSION)
}

/// Portion of a name before the first separator (the whole name if there is none)
pub fn sequence_prefix(name: &str) -> &str {
    name.split_once(SEQUENCE_SEPARATOR)
        .map(|(prefix, _)| prefix)
        .unwrap_or(name)
}

/// Parse the unsigned base-10 sequence number of a migration name
///
/// Only plain ASCII digits are accepted: no sign, no whitespace, and the
/// value must fit in a `u64`.
pub fn parse_sequence(name: &str) -> Option<SequenceNumber> {
    let prefix = sequence_prefix(name);
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}
