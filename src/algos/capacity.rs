use crate::model::{Anomaly, Assignments, LabId, StudentId};
use std::cmp::Ordering;
use tracing::{info, instrument, warn};

/// Priority of `x` over `y` inside laboratory `lab`: higher GPA first, then
/// the better rank each student gave to this laboratory (unranked last).
fn priority(a: &Assignments, lab: LabId, x: StudentId, y: StudentId) -> Ordering {
    let rank = |s| a.rank_of(s, lab).unwrap_or(usize::MAX);
    a.student(x)
        .cmp_gpa(a.student(y))
        .then_with(|| rank(x).cmp(&rank(y)))
        .then(x.cmp(&y))
}

/// Trim every over-capacity laboratory down to its capacity. Evicted
/// students become unassigned and are not offered another laboratory.
/// Returns the evicted students.
#[instrument(skip_all)]
pub fn resolve_over_capacity(a: &mut Assignments, anomalies: &mut Vec<Anomaly>) -> Vec<StudentId> {
    let mut evicted = Vec::new();
    for lab in a.filter_laboratories(|lab| a.is_over_capacity(lab)) {
        let laboratory = a.laboratory(lab);
        warn!(
            lab = %laboratory.key,
            assigned = a.size(lab),
            capacity = laboratory.capacity,
            "laboratory over capacity, selecting by GPA",
        );
        let mut students = a.students_for(lab).clone();
        students.sort_by(|&x, &y| priority(a, lab, x, y));
        for student in students.split_off(laboratory.capacity) {
            info!(
                lab = %laboratory.key,
                student = %a.student(student).key,
                "evicted",
            );
            a.unassign(student);
            anomalies.push(Anomaly::Evicted {
                lab: laboratory.key.clone(),
                student: a.student(student).key.clone(),
            });
            evicted.push(student);
        }
    }
    evicted
}
