use super::{HistoryEntry, RunStore, newest_first};
use crate::error::PersistenceError;
use crate::recorder::{RunId, RunRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// One CSV line: a run entry flattened with its batch.
#[derive(Debug, Serialize, Deserialize)]
struct Row {
    batch_id: String,
    executed_at: DateTime<Utc>,
    version: Option<String>,
    student_id: String,
    assigned_lab: Option<String>,
    satisfaction: u8,
    summary: String,
}

/// Append-only CSV history file.
#[derive(Debug)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn existing(&self) -> Result<Vec<u8>, PersistenceError> {
        match fs::read(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn rows(content: &[u8]) -> Result<Vec<Row>, PersistenceError> {
        Ok(csv::Reader::from_reader(content)
            .deserialize()
            .collect::<Result<Vec<Row>, _>>()?)
    }

    /// Write the old content followed by `fresh` to a temporary sibling,
    /// then persist it over the history so readers see all of the run or none.
    fn replace(&self, existing: &[u8], fresh: &[u8]) -> Result<(), PersistenceError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(existing)?;
        file.write_all(fresh)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl RunStore for CsvStore {
    async fn append(&mut self, record: &RunRecord) -> Result<RunId, PersistenceError> {
        let existing = self.existing()?;
        if Self::rows(&existing)?
            .iter()
            .any(|r| r.batch_id == record.batch_id)
        {
            return Err(PersistenceError::Other(format!(
                "batch {} has already been recorded",
                record.batch_id
            )));
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(existing.is_empty())
            .from_writer(Vec::new());
        for entry in &record.entries {
            writer.serialize(Row {
                batch_id: record.batch_id.clone(),
                executed_at: record.executed_at,
                version: record.version.clone(),
                student_id: entry.student_id.clone(),
                assigned_lab: entry.assigned_lab_id.clone(),
                satisfaction: entry.satisfaction,
                summary: entry.summary.clone(),
            })?;
        }
        let fresh = writer
            .into_inner()
            .map_err(|e| PersistenceError::Other(e.to_string()))?;
        self.replace(&existing, &fresh)?;
        debug!(path = %self.path.display(), rows = record.entries.len(), "history appended");
        Ok(RunId(record.batch_id.clone()))
    }

    async fn history(&mut self, student_id: &str) -> Result<Vec<HistoryEntry>, PersistenceError> {
        let entries = Self::rows(&self.existing()?)?
            .into_iter()
            .filter(|r| r.student_id == student_id)
            .map(|r| HistoryEntry {
                batch_id: r.batch_id,
                executed_at: r.executed_at,
                version: r.version,
                assigned_lab_id: r.assigned_lab,
                satisfaction: r.satisfaction,
                summary: r.summary,
            })
            .collect();
        Ok(newest_first(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RunEntry;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn record(batch_id: &str, hour: u32) -> RunRecord {
        RunRecord {
            batch_id: batch_id.into(),
            executed_at: Utc.with_ymd_and_hms(2025, 12, 11, hour, 30, 0).unwrap(),
            version: Some("1.0.0".into()),
            entries: vec![
                RunEntry {
                    student_id: "S1".into(),
                    assigned_lab_id: Some("L2".into()),
                    satisfaction: 50,
                    summary: "assigned to L2 (rank 2 of 2)".into(),
                },
                RunEntry {
                    student_id: "S2".into(),
                    assigned_lab_id: None,
                    satisfaction: 0,
                    summary: "unassigned; student S2 could not be placed, anywhere".into(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_append_keeps_earlier_runs() {
        let dir = tempdir().unwrap();
        let mut store = CsvStore::new(dir.path().join("history.csv"));
        assert!(store.history("S1").await.unwrap().is_empty());
        store.append(&record("b1", 9)).await.unwrap();
        store.append(&record("b2", 11)).await.unwrap();
        let history = store.history("S2").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].batch_id, "b2");
        assert_eq!(history[0].assigned_lab_id, None);
        assert_eq!(
            history[0].summary,
            "unassigned; student S2 could not be placed, anywhere"
        );
        let history = store.history("S1").await.unwrap();
        assert_eq!(history[1].assigned_lab_id.as_deref(), Some("L2"));
        assert_eq!(history[1].version.as_deref(), Some("1.0.0"));
        assert_eq!(
            history[1].executed_at,
            Utc.with_ymd_and_hms(2025, 12, 11, 9, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_duplicate_batch_rejected_whole() {
        let dir = tempdir().unwrap();
        let mut store = CsvStore::new(dir.path().join("history.csv"));
        store.append(&record("b1", 9)).await.unwrap();
        let before = fs::read(store.path()).unwrap();
        assert!(store.append(&record("b1", 10)).await.is_err());
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_no_temporary_file_left() {
        let dir = tempdir().unwrap();
        let mut store = CsvStore::new(dir.path().join("history.csv"));
        store.append(&record("b1", 9)).await.unwrap();
        store.append(&record("b2", 10)).await.unwrap();
        let files = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1);
    }
}
