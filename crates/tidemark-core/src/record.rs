//! Persisted migration records and the watermark derived from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::migration::{parse_sequence, MigrationFile, SequenceNumber};

/// One successful application of a migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Full file name of the applied migration
    pub name: String,

    /// Wall-clock time the migration was applied
    pub applied_at: DateTime<Utc>,
}

impl MigrationRecord {
    pub fn new(name: impl Into<String>, applied_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            applied_at,
        }
    }

    /// Sequence number encoded in the recorded name, if any
    pub fn sequence(&self) -> Option<SequenceNumber> {
        parse_sequence(&self.name)
    }
}

/// Highest applied sequence number
///
/// A single scalar: a file is pending purely because its sequence number is
/// above the watermark, whether or not that exact name was ever recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Watermark {
    /// Nothing recorded yet; below every sequence number, including 0
    ///
    /// Not the same as watermark 0: databases migrated by the earlier Go
    /// runner read an empty table as 0 and never applied `0-*.sql` files,
    /// while here such a file is pending.
    #[default]
    NoneApplied,
    Applied(SequenceNumber),
}

impl Watermark {
    /// Derive the watermark from the most recently applied record
    pub fn from_latest(latest: Option<&MigrationRecord>) -> Result<Self> {
        match latest {
            None => Ok(Self::NoneApplied),
            Some(record) => record
                .sequence()
                .map(Self::Applied)
                .ok_or_else(|| Error::UnparsableWatermark(record.name.clone())),
        }
    }

    /// Sequence number used for comparison (0 when nothing is applied)
    pub fn sequence(&self) -> SequenceNumber {
        match self {
            Self::NoneApplied => 0,
            Self::Applied(seq) => *seq,
        }
    }

    /// Whether a file lies strictly above the watermark
    pub fn is_pending(&self, file: &MigrationFile) -> bool {
        match self {
            Self::NoneApplied => true,
            Self::Applied(seq) => file.sequence > *seq,
        }
    }
}

impl std::fmt::Display for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoneApplied => write!(f, "none"),
            Self::Applied(seq) => write!(f, "{}", seq),
        }
    }
}
