//! Run summary

use serde::Serialize;
use tidemark_core::{MigrationRecord, Watermark};

/// What a run found and did
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Latest record read before planning
    pub latest: Option<MigrationRecord>,
    pub watermark: Watermark,
    /// Names selected by the planner, in application order
    pub planned: Vec<String>,
    /// Names whose SQL committed
    pub applied: Vec<String>,
    /// Applied names whose record could not be written
    pub unrecorded: Vec<String>,
    pub execution_time_ms: u128,
}

impl RunReport {
    /// Nothing was pending
    pub fn is_noop(&self) -> bool {
        self.planned.is_empty()
    }
}
