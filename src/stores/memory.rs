use super::{HistoryEntry, RunStore, newest_first};
use crate::error::PersistenceError;
use crate::recorder::{RunId, RunRecord};

/// In-process history, for hosts that persist runs themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    runs: Vec<RunRecord>,
}

impl MemoryStore {
    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }
}

impl RunStore for MemoryStore {
    async fn append(&mut self, record: &RunRecord) -> Result<RunId, PersistenceError> {
        if self.runs.iter().any(|r| r.batch_id == record.batch_id) {
            return Err(PersistenceError::Other(format!(
                "batch {} has already been recorded",
                record.batch_id
            )));
        }
        self.runs.push(record.clone());
        Ok(RunId(record.batch_id.clone()))
    }

    async fn history(&mut self, student_id: &str) -> Result<Vec<HistoryEntry>, PersistenceError> {
        let entries = self
            .runs
            .iter()
            .flat_map(|run| {
                run.entries
                    .iter()
                    .filter(|e| e.student_id == student_id)
                    .map(|e| HistoryEntry {
                        batch_id: run.batch_id.clone(),
                        executed_at: run.executed_at,
                        version: run.version.clone(),
                        assigned_lab_id: e.assigned_lab_id.clone(),
                        satisfaction: e.satisfaction,
                        summary: e.summary.clone(),
                    })
            })
            .collect();
        Ok(newest_first(entries))
    }
}
