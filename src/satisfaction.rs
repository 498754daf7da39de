use crate::model::{LabId, Student};

/// Score in 0..=100 of how close `assigned` is to the student's first choice.
///
/// With the assigned laboratory at 1-based position `r` among the `n`
/// preferences the student submitted, the score is `100 × (1 − (r−1)/n)`
/// rounded half away from zero. Unassigned students, laboratories absent
/// from the list (such as a special admission) and empty lists all score 0.
pub fn satisfaction(student: &Student, assigned: Option<LabId>) -> u8 {
    let n = student.submitted();
    match assigned.and_then(|lab| student.rank_of(lab)) {
        Some(rank) if n > 0 => (100.0 * (1.0 - rank as f64 / n as f64)).round() as u8,
        _ => 0,
    }
}
