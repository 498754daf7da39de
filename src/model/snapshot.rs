use super::{
    Anomaly, Dataset, LabId, Laboratory, LaboratoryRecord, Student, StudentId, StudentRecord,
};
use crate::error::EmptyDataset;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Immutable view of the dataset for one run, with identifiers remapped to
/// dense indices (students in registration order, laboratories by ascending
/// identifier).
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub laboratories: Vec<Laboratory>,
    pub anomalies: Vec<Anomaly>,
    student_index: HashMap<String, StudentId>,
    lab_index: HashMap<String, LabId>,
}

impl Snapshot {
    pub fn new(dataset: Dataset) -> Result<Snapshot, EmptyDataset> {
        if dataset.students.is_empty() {
            return Err(EmptyDataset::NoStudents);
        }
        if dataset.laboratories.is_empty() {
            return Err(EmptyDataset::NoLaboratories);
        }
        let mut anomalies = Vec::new();
        let lab_records = remap_laboratories(dataset.laboratories, &mut anomalies);
        let student_records = remap_students(dataset.students, &mut anomalies);
        let lab_index: HashMap<String, LabId> = lab_records
            .iter()
            .enumerate()
            .map(|(n, l)| (l.id.clone(), LabId(n)))
            .collect();
        let student_index: HashMap<String, StudentId> = student_records
            .iter()
            .enumerate()
            .map(|(n, s)| (s.id.clone(), StudentId(n)))
            .collect();
        let students = student_records
            .into_iter()
            .enumerate()
            .map(|(n, record)| build_student(StudentId(n), record, &lab_index, &mut anomalies))
            .collect::<Vec<_>>();
        let laboratories = lab_records
            .into_iter()
            .enumerate()
            .map(|(n, record)| build_laboratory(LabId(n), record, &student_index, &mut anomalies))
            .collect::<Vec<_>>();
        debug!(
            students = students.len(),
            laboratories = laboratories.len(),
            anomalies = anomalies.len(),
            "snapshot taken"
        );
        Ok(Snapshot {
            students,
            laboratories,
            anomalies,
            student_index,
            lab_index,
        })
    }

    pub fn student(&self, StudentId(student): StudentId) -> &Student {
        &self.students[student]
    }

    pub fn laboratory(&self, LabId(lab): LabId) -> &Laboratory {
        &self.laboratories[lab]
    }

    pub fn student_by_key(&self, key: &str) -> Option<StudentId> {
        self.student_index.get(key).copied()
    }

    pub fn lab_by_key(&self, key: &str) -> Option<LabId> {
        self.lab_index.get(key).copied()
    }

    pub fn all_students(&self) -> Vec<StudentId> {
        (0..self.students.len()).map(StudentId).collect()
    }

    pub fn all_laboratories(&self) -> Vec<LabId> {
        (0..self.laboratories.len()).map(LabId).collect()
    }
}

/// Drop duplicate identifiers (first record wins) and sort by identifier to
/// get a stable laboratory iteration order.
fn remap_laboratories(
    records: Vec<LaboratoryRecord>,
    anomalies: &mut Vec<Anomaly>,
) -> Vec<LaboratoryRecord> {
    let mut seen = HashSet::new();
    let mut labs = records
        .into_iter()
        .filter(|l| {
            if seen.insert(l.id.clone()) {
                true
            } else {
                warn!(lab = %l.id, "duplicate laboratory ignored");
                anomalies.push(Anomaly::DuplicateLaboratory { lab: l.id.clone() });
                false
            }
        })
        .collect::<Vec<_>>();
    labs.sort_by(|a, b| a.id.cmp(&b.id));
    labs
}

fn remap_students(records: Vec<StudentRecord>, anomalies: &mut Vec<Anomaly>) -> Vec<StudentRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|s| {
            if seen.insert(s.id.clone()) {
                true
            } else {
                warn!(student = %s.id, "duplicate student ignored");
                anomalies.push(Anomaly::DuplicateStudent {
                    student: s.id.clone(),
                });
                false
            }
        })
        .collect()
}

fn build_student(
    id: StudentId,
    mut record: StudentRecord,
    lab_index: &HashMap<String, LabId>,
    anomalies: &mut Vec<Anomaly>,
) -> Student {
    record.preferences.sort_by_key(|p| p.rank);
    let mut seen = HashSet::new();
    let mut rankings = Vec::with_capacity(record.preferences.len());
    for preference in record.preferences {
        if !seen.insert(preference.lab_id.clone()) {
            anomalies.push(Anomaly::DuplicatePreference {
                student: record.id.clone(),
                lab: preference.lab_id,
            });
            continue;
        }
        let lab = lab_index.get(&preference.lab_id).copied();
        if lab.is_none() {
            warn!(student = %record.id, lab = %preference.lab_id, "preference for unknown laboratory");
            anomalies.push(Anomaly::InvalidPreference {
                student: record.id.clone(),
                lab: preference.lab_id,
            });
        }
        rankings.push(lab);
    }
    Student {
        id,
        key: record.id,
        name: record.name,
        gpa: record.gpa,
        rankings,
    }
}

fn build_laboratory(
    id: LabId,
    record: LaboratoryRecord,
    student_index: &HashMap<String, StudentId>,
    anomalies: &mut Vec<Anomaly>,
) -> Laboratory {
    let mut special_admission = Vec::with_capacity(record.special_admission.len());
    for key in record.special_admission {
        match student_index.get(&key) {
            Some(&student) if !special_admission.contains(&student) => {
                special_admission.push(student);
            }
            Some(_) => (),
            None => {
                warn!(lab = %record.id, student = %key, "reservation for unknown student");
                anomalies.push(Anomaly::UnknownReservation {
                    lab: record.id.clone(),
                    student: key,
                });
            }
        }
    }
    Laboratory {
        id,
        key: record.id,
        name: record.name,
        capacity: record.capacity as usize,
        field_tag: record.field_tag,
        special_admission,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PreferenceRecord;

    #[test]
    fn test_empty_dataset() {
        let labs = vec![LaboratoryRecord::new("L1", 1, &[])];
        let students = vec![StudentRecord::new("S1", None, &["L1"])];
        assert_eq!(
            Snapshot::new(Dataset {
                students: vec![],
                laboratories: labs,
            })
            .unwrap_err(),
            EmptyDataset::NoStudents
        );
        assert_eq!(
            Snapshot::new(Dataset {
                students,
                laboratories: vec![],
            })
            .unwrap_err(),
            EmptyDataset::NoLaboratories
        );
    }

    #[test]
    fn test_laboratories_sorted_by_identifier() {
        let snapshot = Snapshot::new(Dataset {
            students: vec![StudentRecord::new("S1", None, &["L2", "L1"])],
            laboratories: vec![
                LaboratoryRecord::new("L2", 1, &[]),
                LaboratoryRecord::new("L1", 1, &[]),
            ],
        })
        .unwrap();
        assert_eq!(snapshot.laboratory(LabId(0)).key, "L1");
        assert_eq!(snapshot.lab_by_key("L2"), Some(LabId(1)));
        assert_eq!(
            snapshot.student(StudentId(0)).rankings,
            vec![Some(LabId(1)), Some(LabId(0))]
        );
    }

    #[test]
    fn test_preferences_sorted_by_rank() {
        let mut student = StudentRecord::new("S1", Some(3.0), &[]);
        student.preferences = vec![
            PreferenceRecord {
                lab_id: "L2".into(),
                rank: 2,
            },
            PreferenceRecord {
                lab_id: "L1".into(),
                rank: 1,
            },
        ];
        let snapshot = Snapshot::new(Dataset {
            students: vec![student],
            laboratories: vec![
                LaboratoryRecord::new("L1", 1, &[]),
                LaboratoryRecord::new("L2", 1, &[]),
            ],
        })
        .unwrap();
        assert_eq!(
            snapshot.student(StudentId(0)).rankings,
            vec![Some(LabId(0)), Some(LabId(1))]
        );
    }

    #[test]
    fn test_anomalies() {
        let snapshot = Snapshot::new(Dataset {
            students: vec![
                StudentRecord::new("S1", None, &["L9", "L1", "L1"]),
                StudentRecord::new("S1", None, &[]),
            ],
            laboratories: vec![
                LaboratoryRecord::new("L1", 1, &["S7", "S1", "S1"]),
                LaboratoryRecord::new("L1", 3, &[]),
            ],
        })
        .unwrap();
        assert_eq!(snapshot.students.len(), 1);
        assert_eq!(snapshot.laboratories.len(), 1);
        assert_eq!(snapshot.laboratory(LabId(0)).capacity, 1);
        assert_eq!(
            snapshot.laboratory(LabId(0)).special_admission,
            vec![StudentId(0)]
        );
        // The unknown laboratory keeps its slot, the duplicate does not.
        assert_eq!(snapshot.student(StudentId(0)).rankings, vec![None, Some(LabId(0))]);
        assert_eq!(
            snapshot.anomalies,
            vec![
                Anomaly::DuplicateLaboratory { lab: "L1".into() },
                Anomaly::DuplicateStudent {
                    student: "S1".into()
                },
                Anomaly::InvalidPreference {
                    student: "S1".into(),
                    lab: "L9".into()
                },
                Anomaly::DuplicatePreference {
                    student: "S1".into(),
                    lab: "L1".into()
                },
                Anomaly::UnknownReservation {
                    lab: "L1".into(),
                    student: "S7".into()
                },
            ]
        );
    }
}
