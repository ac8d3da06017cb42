//! Tidemark Runner - Applies pending migrations
//!
//! Ties the store, scanner, planner and executor together into a run:
//! read the watermark, scan the directory, plan, then apply each pending
//! migration in order until the list is exhausted or one fails.

pub mod error;
pub mod migrator;
pub mod report;

pub use error::{RunError, RunResult};
pub use migrator::{wrap_in_transaction, ApplyOutcome, Migrator, MigratorOptions};
pub use report::RunReport;
