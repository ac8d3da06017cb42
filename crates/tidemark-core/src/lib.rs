//! Tidemark Core - Migration model and planning
//!
//! This crate provides the data types shared by every Tidemark crate:
//! migration files discovered on disk, persisted migration records, the
//! watermark derived from them, and the scanner and planner that decide
//! which files a run applies.

pub mod error;
pub mod format;
pub mod migration;
pub mod planner;
pub mod record;
pub mod scanner;

pub use error::{Error, Result};
pub use format::{Passthrough, SqlFormatter};
pub use migration::{parse_sequence, MigrationFile, SequenceNumber, MIGRATION_EXTENSION};
pub use planner::plan;
pub use record::{MigrationRecord, Watermark};
pub use scanner::{scan, ScanResult};
