use crate::algos::{self, PoolOrder};
use crate::error::{Error, PersistenceError};
use crate::model::{Anomaly, Assignments, Dataset, Placement, Snapshot, Student};
use crate::recorder::{Recorder, RunId, RunRecord};
use crate::satisfaction::satisfaction;
use crate::stores::RunStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Knobs of the assignment engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Seat reserved students before preference matching.
    pub special_admission: bool,
    pub pool_order: PoolOrder,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            special_admission: true,
            pool_order: PoolOrder::Gpa,
        }
    }
}

/// Final decision for one student.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub student_id: String,
    pub assigned_lab_id: Option<String>,
    /// 1-based rank of the assigned laboratory in the student's preferences.
    pub rank: Option<usize>,
    pub special_admission: bool,
    pub satisfaction: u8,
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabOutcome {
    pub lab_id: String,
    pub name: String,
    pub field_tag: Option<String>,
    pub capacity: usize,
    pub assigned: Vec<String>,
}

/// Result of one run: one entry per student in registration order, one per
/// laboratory in identifier order, and every anomaly met on the way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub entries: Vec<Assignment>,
    pub laboratories: Vec<LabOutcome>,
    pub anomalies: Vec<Anomaly>,
}

impl Outcome {
    pub fn unassigned(&self) -> impl Iterator<Item = &Assignment> {
        self.entries.iter().filter(|e| e.assigned_lab_id.is_none())
    }
}

#[derive(Debug)]
pub enum Persisted {
    Recorded(RunId),
    Unpersisted(PersistenceError),
}

/// Everything [`Engine::execute`] produced, persisted or not.
#[derive(Debug)]
pub struct RunReport {
    pub snapshot: Snapshot,
    pub outcome: Outcome,
    pub record: RunRecord,
    pub persisted: Persisted,
}

#[derive(Clone, Debug, Default)]
pub struct Engine {
    config: MatchingConfig,
}

impl Engine {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Assign the students of `snapshot`. The snapshot itself is left
    /// untouched; all mutations happen on a private working copy.
    #[instrument(skip_all)]
    pub fn run(&self, snapshot: &Snapshot) -> Outcome {
        let mut anomalies = snapshot.anomalies.clone();
        let mut a = Assignments::new(snapshot);
        if self.config.special_admission {
            let seated = algos::allocate_special_admissions(&mut a, &mut anomalies);
            info!(seated, "special admissions allocated");
        }
        for student in algos::match_preferences(&mut a, self.config.pool_order) {
            anomalies.push(Anomaly::Unplaced {
                student: a.student(student).key.clone(),
            });
        }
        let evicted = algos::resolve_over_capacity(&mut a, &mut anomalies);
        if !evicted.is_empty() {
            warn!(evicted = evicted.len(), "students evicted from over-capacity laboratories");
        }
        let outcome = Self::outcome(&a, anomalies);
        info!(
            students = outcome.entries.len(),
            unassigned = outcome.unassigned().count(),
            "run complete"
        );
        outcome
    }

    /// Take a snapshot of `dataset`, run it and record the result in `store`.
    ///
    /// Only an empty dataset makes this fail. A store failure is reported in
    /// [`RunReport::persisted`] alongside the complete outcome.
    pub async fn execute<S: RunStore>(
        &self,
        dataset: Dataset,
        recorder: &Recorder,
        store: &mut S,
    ) -> Result<RunReport, Error> {
        let snapshot = Snapshot::new(dataset)?;
        let outcome = self.run(&snapshot);
        let record = recorder.package(&outcome);
        let persisted = match recorder.record(store, &record).await {
            Ok(id) => Persisted::Recorded(id),
            Err(Error::Persistence(e)) => {
                warn!(error = %e, batch = %record.batch_id, "run could not be recorded");
                Persisted::Unpersisted(e)
            }
            Err(e) => return Err(e),
        };
        Ok(RunReport {
            snapshot,
            outcome,
            record,
            persisted,
        })
    }

    fn outcome(a: &Assignments, anomalies: Vec<Anomaly>) -> Outcome {
        let mut notes: HashMap<&str, Vec<String>> = HashMap::new();
        for anomaly in &anomalies {
            if let Some(student) = anomaly.student() {
                notes.entry(student).or_default().push(anomaly.to_string());
            }
        }
        let entries = a
            .all_students()
            .into_iter()
            .map(|s| {
                let student = a.student(s);
                let placement = a.placement_of(s);
                let lab = a.lab_for(s);
                let mut summary = vec![Self::describe(a, student, placement)];
                summary.extend(notes.remove(student.key.as_str()).unwrap_or_default());
                Assignment {
                    student_id: student.key.clone(),
                    assigned_lab_id: lab.map(|l| a.laboratory(l).key.clone()),
                    rank: lab.and_then(|l| student.rank_of(l)).map(|r| r + 1),
                    special_admission: a.is_special_admission(s),
                    satisfaction: satisfaction(student, lab),
                    summary: summary.join("; "),
                }
            })
            .collect();
        let laboratories = a
            .all_laboratories()
            .into_iter()
            .map(|l| {
                let lab = a.laboratory(l);
                LabOutcome {
                    lab_id: lab.key.clone(),
                    name: lab.name.clone(),
                    field_tag: lab.field_tag.clone(),
                    capacity: lab.capacity,
                    assigned: a
                        .students_for(l)
                        .iter()
                        .map(|&s| a.student(s).key.clone())
                        .collect(),
                }
            })
            .collect();
        Outcome {
            entries,
            laboratories,
            anomalies,
        }
    }

    fn describe(a: &Assignments, student: &Student, placement: Option<Placement>) -> String {
        match placement {
            Some(Placement::SpecialAdmission(lab)) => {
                format!("special admission to {}", a.laboratory(lab).key)
            }
            Some(Placement::Preference(lab, rank)) => format!(
                "assigned to {} (rank {} of {})",
                a.laboratory(lab).key,
                rank + 1,
                student.submitted()
            ),
            None => "unassigned".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LaboratoryRecord, StudentRecord};
    use crate::stores::{HistoryEntry, MemoryStore};

    fn snapshot(students: Vec<StudentRecord>, laboratories: Vec<LaboratoryRecord>) -> Snapshot {
        Snapshot::new(Dataset {
            students,
            laboratories,
        })
        .unwrap()
    }

    #[test]
    fn test_summaries() {
        let snapshot = snapshot(
            vec![
                StudentRecord::new("S1", Some(3.0), &["L9", "L1"]),
                StudentRecord::new("S2", Some(2.0), &["L1"]),
                StudentRecord::new("S3", None, &[]),
            ],
            vec![LaboratoryRecord::new("L1", 2, &["S3"])],
        );
        let outcome = Engine::default().run(&snapshot);
        assert_eq!(
            outcome.entries[0].summary,
            "assigned to L1 (rank 2 of 2); student S1 ranks unknown laboratory L9"
        );
        assert_eq!(outcome.entries[0].satisfaction, 50);
        assert_eq!(outcome.entries[0].rank, Some(2));
        assert_eq!(
            outcome.entries[1].summary,
            "unassigned; student S2 could not be placed in any preferred laboratory"
        );
        assert_eq!(outcome.entries[2].summary, "special admission to L1");
        assert!(outcome.entries[2].special_admission);
        assert_eq!(outcome.entries[2].rank, None);
        assert_eq!(outcome.laboratories[0].assigned, vec!["S3", "S1"]);
    }

    #[test]
    fn test_superseded_reservation_in_summary() {
        let snapshot = snapshot(
            vec![StudentRecord::new("S1", Some(3.0), &["L2"])],
            vec![
                LaboratoryRecord::new("L1", 1, &["S1"]),
                LaboratoryRecord::new("L2", 1, &["S1"]),
            ],
        );
        let outcome = Engine::default().run(&snapshot);
        assert_eq!(
            outcome.entries[0].summary,
            "special admission to L1; reservation for S1 in laboratory L2 superseded by L1"
        );
        assert_eq!(outcome.entries[0].satisfaction, 0);
        assert!(outcome.laboratories[1].assigned.is_empty());
    }

    #[test]
    fn test_special_admission_disabled() {
        let snapshot = snapshot(
            vec![
                StudentRecord::new("S1", Some(3.9), &["L1"]),
                StudentRecord::new("S2", Some(2.0), &["L2", "L1"]),
            ],
            vec![
                LaboratoryRecord::new("L1", 1, &["S2"]),
                LaboratoryRecord::new("L2", 1, &[]),
            ],
        );
        let with = Engine::default().run(&snapshot);
        assert_eq!(with.entries[1].assigned_lab_id.as_deref(), Some("L1"));
        assert_eq!(with.entries[0].assigned_lab_id, None);
        let without = Engine::new(MatchingConfig {
            special_admission: false,
            ..MatchingConfig::default()
        })
        .run(&snapshot);
        assert_eq!(without.entries[0].assigned_lab_id.as_deref(), Some("L1"));
        assert_eq!(without.entries[1].assigned_lab_id.as_deref(), Some("L2"));
        assert_eq!(without.entries[1].satisfaction, 100);
    }

    #[test]
    fn test_run_is_repeatable() {
        let snapshot = snapshot(
            vec![
                StudentRecord::new("S1", Some(3.0), &["L1", "L2"]),
                StudentRecord::new("S2", Some(3.0), &["L1", "L2"]),
            ],
            vec![
                LaboratoryRecord::new("L1", 1, &[]),
                LaboratoryRecord::new("L2", 1, &[]),
            ],
        );
        let engine = Engine::default();
        assert_eq!(engine.config(), &MatchingConfig::default());
        assert_eq!(engine.run(&snapshot), engine.run(&snapshot));
    }

    struct FailingStore;

    impl RunStore for FailingStore {
        async fn append(&mut self, _: &RunRecord) -> Result<RunId, PersistenceError> {
            Err(PersistenceError::Other("disk full".into()))
        }

        async fn history(&mut self, _: &str) -> Result<Vec<HistoryEntry>, PersistenceError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_unpersisted_run_still_reported() {
        let dataset = Dataset {
            students: vec![StudentRecord::new("S1", Some(3.0), &["L1"])],
            laboratories: vec![LaboratoryRecord::new("L1", 1, &[])],
        };
        let report = Engine::default()
            .execute(dataset, &Recorder::new(), &mut FailingStore)
            .await
            .unwrap();
        assert!(matches!(report.persisted, Persisted::Unpersisted(_)));
        assert_eq!(report.outcome.entries[0].satisfaction, 100);
        assert_eq!(report.record.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_dataset_records_nothing() {
        let mut store = MemoryStore::default();
        let dataset = Dataset {
            students: vec![],
            laboratories: vec![LaboratoryRecord::new("L1", 1, &[])],
        };
        let err = Engine::default()
            .execute(dataset, &Recorder::new(), &mut store)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::EmptyDataset(crate::error::EmptyDataset::NoStudents)
        ));
        assert!(store.runs().is_empty());
    }
}
