use super::*;

/// Why a student holds (or lost) a seat, kept per student for the run summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    SpecialAdmission(LabId),
    /// Placed through the preference list at 0-based `rank`.
    Preference(LabId, usize),
}

impl Placement {
    pub fn lab(self) -> LabId {
        match self {
            Placement::SpecialAdmission(lab) | Placement::Preference(lab, _) => lab,
        }
    }
}

/// Private working copy of the assignment state for one run.
#[derive(Debug)]
pub struct Assignments<'a> {
    pub snapshot: &'a Snapshot,
    assigned_to: Vec<Option<Placement>>,
    assigned: Vec<Vec<StudentId>>,
}

impl<'a> Assignments<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Assignments<'a> {
        Assignments {
            snapshot,
            assigned_to: vec![None; snapshot.students.len()],
            assigned: vec![Vec::new(); snapshot.laboratories.len()],
        }
    }

    pub fn student(&self, student: StudentId) -> &'a Student {
        self.snapshot.student(student)
    }

    pub fn laboratory(&self, lab: LabId) -> &'a Laboratory {
        self.snapshot.laboratory(lab)
    }

    pub fn all_students(&self) -> Vec<StudentId> {
        self.snapshot.all_students()
    }

    pub fn all_laboratories(&self) -> Vec<LabId> {
        self.snapshot.all_laboratories()
    }

    pub fn filter_laboratories<F>(&self, condition: F) -> Vec<LabId>
    where
        F: Fn(LabId) -> bool,
    {
        self.all_laboratories()
            .into_iter()
            .filter(|&lab| condition(lab))
            .collect()
    }

    pub fn rank_of(&self, student: StudentId, lab: LabId) -> Option<usize> {
        self.student(student).rank_of(lab)
    }

    pub fn lab_for(&self, StudentId(student): StudentId) -> Option<LabId> {
        self.assigned_to[student].map(Placement::lab)
    }

    pub fn placement_of(&self, StudentId(student): StudentId) -> Option<Placement> {
        self.assigned_to[student]
    }

    pub fn students_for(&self, LabId(lab): LabId) -> &Vec<StudentId> {
        &self.assigned[lab]
    }

    pub fn size(&self, lab: LabId) -> usize {
        self.students_for(lab).len()
    }

    pub fn capacity(&self, lab: LabId) -> usize {
        self.laboratory(lab).capacity
    }

    pub fn remaining(&self, lab: LabId) -> usize {
        self.capacity(lab).saturating_sub(self.size(lab))
    }

    pub fn has_room(&self, lab: LabId) -> bool {
        self.remaining(lab) > 0
    }

    pub fn is_over_capacity(&self, lab: LabId) -> bool {
        self.size(lab) > self.capacity(lab)
    }

    pub fn is_special_admission(&self, student: StudentId) -> bool {
        matches!(self.placement_of(student), Some(Placement::SpecialAdmission(_)))
    }

    /// Record a placement. Capacity is checked by the callers so that the
    /// resolver can be exercised on over-filled laboratories.
    pub fn assign(&mut self, student: StudentId, placement: Placement) {
        assert!(
            self.lab_for(student).is_none(),
            "a laboratory is already assigned to this student"
        );
        self.assigned_to[student.0] = Some(placement);
        self.assigned[placement.lab().0].push(student);
    }

    pub fn unassign(&mut self, student: StudentId) {
        let lab = self
            .lab_for(student)
            .expect("student is not assigned to any laboratory");
        self.assigned_to[student.0] = None;
        let pos = self.assigned[lab.0]
            .iter()
            .position(|&s| s == student)
            .expect("student not found in laboratory");
        self.assigned[lab.0].remove(pos);
    }

    pub fn unassigned_students(&self) -> Vec<StudentId> {
        self.assigned_to
            .iter()
            .enumerate()
            .filter_map(|(id, assignment)| {
                if assignment.is_none() {
                    Some(StudentId(id))
                } else {
                    None
                }
            })
            .collect()
    }
}
