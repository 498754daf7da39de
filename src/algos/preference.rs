use crate::model::{Assignments, LabId, Placement, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument, trace};

/// Order in which the pool of unassigned students is scanned. Since capacity
/// is checked at every placement, earlier students win contested seats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolOrder {
    /// Highest GPA first, students without GPA last, then registration order.
    #[default]
    Gpa,
    /// Input order. The first registered student takes a contested seat
    /// whatever their GPA, so a lower GPA can win over a higher one.
    Registration,
}

fn first_choice_with_room(a: &Assignments, student: StudentId) -> Option<(LabId, usize)> {
    a.student(student)
        .rankings
        .iter()
        .enumerate()
        .find_map(|(rank, &lab)| lab.filter(|&lab| a.has_room(lab)).map(|lab| (lab, rank)))
}

/// Place every unassigned student in their best-ranked laboratory with a free
/// seat, pass after pass, until the pool is empty or a full pass places
/// nobody. Returns the students left unplaced.
#[instrument(skip_all)]
pub fn match_preferences(a: &mut Assignments, order: PoolOrder) -> Vec<StudentId> {
    let mut pool = a.unassigned_students();
    if order == PoolOrder::Gpa {
        pool.sort_by(|&x, &y| a.student(x).cmp_gpa(a.student(y)));
    }
    let mut rounds = 0;
    while !pool.is_empty() {
        rounds += 1;
        // Compute the placements of the whole pass, then shrink the pool.
        let mut placed = HashSet::new();
        for &student in &pool {
            if let Some((lab, rank)) = first_choice_with_room(a, student) {
                a.assign(student, Placement::Preference(lab, rank));
                placed.insert(student);
                trace!(
                    student = %a.student(student).key,
                    lab = %a.laboratory(lab).key,
                    rank = rank + 1,
                    "placed",
                );
            }
        }
        debug!(round = rounds, placed = placed.len(), "preference pass");
        if placed.is_empty() {
            break;
        }
        pool.retain(|s| !placed.contains(s));
    }
    info!(
        rounds,
        unplaced = pool.len(),
        "preference matching reached a fixed point"
    );
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dataset, LaboratoryRecord, Snapshot, StudentRecord};

    fn snapshot(students: Vec<StudentRecord>, laboratories: Vec<LaboratoryRecord>) -> Snapshot {
        Snapshot::new(Dataset {
            students,
            laboratories,
        })
        .unwrap()
    }

    #[test]
    fn test_falls_back_to_next_preference() {
        let snapshot = snapshot(
            vec![
                StudentRecord::new("S1", Some(3.9), &["L1"]),
                StudentRecord::new("S2", Some(3.0), &["L1", "L2"]),
            ],
            vec![
                LaboratoryRecord::new("L1", 1, &[]),
                LaboratoryRecord::new("L2", 1, &[]),
            ],
        );
        let mut a = Assignments::new(&snapshot);
        assert!(match_preferences(&mut a, PoolOrder::Gpa).is_empty());
        assert_eq!(a.placement_of(StudentId(0)), Some(Placement::Preference(LabId(0), 0)));
        assert_eq!(a.placement_of(StudentId(1)), Some(Placement::Preference(LabId(1), 1)));
    }

    #[test]
    fn test_gpa_order_wins_contested_seat() {
        let students = vec![
            StudentRecord::new("S1", Some(3.5), &["L1"]),
            StudentRecord::new("S2", None, &["L1"]),
            StudentRecord::new("S3", Some(3.8), &["L1"]),
        ];
        let snapshot = snapshot(students, vec![LaboratoryRecord::new("L1", 1, &[])]);
        let mut a = Assignments::new(&snapshot);
        let unplaced = match_preferences(&mut a, PoolOrder::Gpa);
        assert_eq!(a.students_for(LabId(0)), &vec![StudentId(2)]);
        assert_eq!(unplaced, vec![StudentId(0), StudentId(1)]);

        let mut a = Assignments::new(&snapshot);
        let unplaced = match_preferences(&mut a, PoolOrder::Registration);
        assert_eq!(a.students_for(LabId(0)), &vec![StudentId(0)]);
        assert_eq!(unplaced, vec![StudentId(1), StudentId(2)]);
    }

    #[test]
    fn test_terminates_when_nobody_can_be_placed() {
        let snapshot = snapshot(
            vec![
                StudentRecord::new("S1", None, &[]),
                StudentRecord::new("S2", None, &["L9"]),
                StudentRecord::new("S3", None, &["L1"]),
            ],
            vec![LaboratoryRecord::new("L1", 0, &[])],
        );
        let mut a = Assignments::new(&snapshot);
        let unplaced = match_preferences(&mut a, PoolOrder::Registration);
        assert_eq!(unplaced.len(), 3);
        assert_eq!(a.size(LabId(0)), 0);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let students = (0..10)
            .map(|n| StudentRecord::new(&format!("S{n:02}"), Some(n as f64 / 3.0), &["L1", "L2"]))
            .collect();
        let snapshot = snapshot(
            students,
            vec![
                LaboratoryRecord::new("L1", 3, &[]),
                LaboratoryRecord::new("L2", 4, &[]),
            ],
        );
        let mut a = Assignments::new(&snapshot);
        let unplaced = match_preferences(&mut a, PoolOrder::Gpa);
        assert_eq!(a.size(LabId(0)), 3);
        assert_eq!(a.size(LabId(1)), 4);
        assert_eq!(unplaced.len(), 3);
        // The three lowest GPAs are left out.
        assert_eq!(unplaced, vec![StudentId(2), StudentId(1), StudentId(0)]);
    }
}
