//! Migration directory scanner

use std::path::Path;

use crate::error::{Error, Result};
use crate::migration::{is_migration_name, MigrationFile};

/// Outcome of scanning a migration directory
///
/// Malformed `.sql` names are collected rather than failing the scan, so the
/// caller sees every offending file at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Well-formed migration files, in no particular order
    pub files: Vec<MigrationFile>,

    /// `.sql` file names that are not valid UTF-8 or whose prefix is not a
    /// sequence number (sorted)
    pub malformed: Vec<String>,
}

impl ScanResult {
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }

    /// Well-formed files, or an error listing every malformed name
    pub fn into_files(self) -> Result<Vec<MigrationFile>> {
        if self.malformed.is_empty() {
            Ok(self.files)
        } else {
            Err(Error::MalformedMigrations(self.malformed))
        }
    }
}

/// List the migration candidates in `dir`
///
/// Entries that are not regular files or do not end in `.sql` are skipped
/// silently. Failing to read the directory itself is an error.
pub fn scan(dir: impl AsRef<Path>) -> Result<ScanResult> {
    let dir = dir.as_ref();
    let read_err = |source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut result = ScanResult::default();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                // Cannot be opened again through a lossy name
                let lossy = raw.to_string_lossy().into_owned();
                if is_migration_name(&lossy) {
                    tracing::warn!("Migration file name is not valid UTF-8: {}", lossy);
                    result.malformed.push(lossy);
                }
                continue;
            }
        };

        if !is_migration_name(&name) {
            continue;
        }
        if !entry.path().is_file() {
            tracing::debug!("Skipping non-file entry {}", name);
            continue;
        }

        match MigrationFile::parse(&name) {
            Ok(file) => result.files.push(file),
            Err(_) => {
                tracing::warn!("Malformed migration file name: {}", name);
                result.malformed.push(name);
            }
        }
    }

    result.malformed.sort();
    tracing::debug!(
        "Scanned {}: {} migrations, {} malformed",
        dir.display(),
        result.files.len(),
        result.malformed.len()
    );

    Ok(result)
}
