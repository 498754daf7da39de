//! Run history stores.
//!
//! A store appends whole runs and never rewrites earlier ones. The SQL store
//! lives with the database loader in [`crate::loaders`].

use crate::error::PersistenceError;
use crate::recorder::{RunId, RunRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use self::csv_store::CsvStore;
pub use self::memory::MemoryStore;

mod csv_store;
mod memory;

/// What one run decided for one student.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub batch_id: String,
    pub executed_at: DateTime<Utc>,
    pub version: Option<String>,
    pub assigned_lab_id: Option<String>,
    pub satisfaction: u8,
    pub summary: String,
}

#[allow(async_fn_in_trait)]
pub trait RunStore {
    /// Append every entry of `record` or none of them.
    async fn append(&mut self, record: &RunRecord) -> Result<RunId, PersistenceError>;

    /// Recorded outcomes for `student_id`, newest run first.
    async fn history(&mut self, student_id: &str) -> Result<Vec<HistoryEntry>, PersistenceError>;
}

/// Sort history newest first. Entries with equal timestamps keep the most
/// recently appended first, so callers pass them in append order.
fn newest_first(mut entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    entries.reverse();
    entries.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
    entries
}
