use crate::engine::Outcome;
use crate::error::Error;
use crate::stores::RunStore;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument};

/// Identifier returned once a run has been recorded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub student_id: String,
    pub assigned_lab_id: Option<String>,
    pub satisfaction: u8,
    pub summary: String,
}

/// One complete run, immutable once recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub batch_id: String,
    pub executed_at: DateTime<Utc>,
    pub version: Option<String>,
    pub entries: Vec<RunEntry>,
}

/// Packages run outcomes into records and hands them to a store.
#[derive(Clone, Debug)]
pub struct Recorder {
    version: Option<String>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            version: Some(env!("CARGO_PKG_VERSION").to_owned()),
        }
    }

    pub fn with_version(version: Option<String>) -> Self {
        Self { version }
    }

    /// Build the record for `outcome`, stamped with the current time and a
    /// fresh batch identifier.
    pub fn package(&self, outcome: &Outcome) -> RunRecord {
        let executed_at = Utc::now();
        let batch_id = format!(
            "{}-{:04x}",
            executed_at.format("%Y%m%d-%H%M%S"),
            rand::rng().random::<u16>()
        );
        RunRecord {
            batch_id,
            executed_at,
            version: self.version.clone(),
            entries: outcome
                .entries
                .iter()
                .map(|e| RunEntry {
                    student_id: e.student_id.clone(),
                    assigned_lab_id: e.assigned_lab_id.clone(),
                    satisfaction: e.satisfaction,
                    summary: e.summary.clone(),
                })
                .collect(),
        }
    }

    /// Append `record` to `store` as a single unit.
    #[instrument(skip_all, fields(batch = %record.batch_id))]
    pub async fn record<S: RunStore>(&self, store: &mut S, record: &RunRecord) -> Result<RunId, Error> {
        let id = store.append(record).await?;
        info!(entries = record.entries.len(), "run recorded");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::model::{Dataset, LaboratoryRecord, Snapshot, StudentRecord};
    use crate::stores::MemoryStore;

    fn outcome() -> Outcome {
        let snapshot = Snapshot::new(Dataset {
            students: vec![
                StudentRecord::new("S1", Some(3.1), &["L1", "L2"]),
                StudentRecord::new("S2", Some(2.4), &["L1"]),
            ],
            laboratories: vec![
                LaboratoryRecord::new("L1", 1, &[]),
                LaboratoryRecord::new("L2", 1, &[]),
            ],
        })
        .unwrap();
        Engine::default().run(&snapshot)
    }

    #[test]
    fn test_package() {
        let record = Recorder::with_version(Some("test".into())).package(&outcome());
        assert_eq!(record.version.as_deref(), Some("test"));
        assert_eq!(record.entries.len(), 2);
        assert_eq!(record.entries[0].assigned_lab_id.as_deref(), Some("L1"));
        assert_eq!(record.entries[0].satisfaction, 100);
        assert_eq!(record.entries[1].assigned_lab_id, None);
        assert_eq!(record.entries[1].satisfaction, 0);
        let prefix = record.executed_at.format("%Y%m%d-%H%M%S").to_string();
        assert!(record.batch_id.starts_with(&prefix));
        assert_eq!(record.batch_id.len(), prefix.len() + 5);
    }

    #[tokio::test]
    async fn test_record_appends() {
        let recorder = Recorder::new();
        let mut store = MemoryStore::default();
        let outcome = outcome();
        let first = recorder.package(&outcome);
        let mut second = recorder.package(&outcome);
        second.batch_id.push_str("-b");
        assert_eq!(
            recorder.record(&mut store, &first).await.unwrap(),
            RunId(first.batch_id.clone())
        );
        recorder.record(&mut store, &second).await.unwrap();
        assert_eq!(store.runs().len(), 2);
        assert_eq!(store.runs()[0], first);
    }
}
