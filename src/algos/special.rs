use crate::model::{Anomaly, Assignments, Placement};
use tracing::{debug, instrument, trace};

/// Seat reserved students before any preference is looked at.
///
/// Laboratories are visited in snapshot order and each reservation list in
/// stored order. The first laboratory to reach a student binds them; later
/// reservations for that student are noted as superseded. Reservations
/// beyond capacity are dropped without being re-queued. Returns the number
/// of students seated.
#[instrument(skip_all)]
pub fn allocate_special_admissions(a: &mut Assignments, anomalies: &mut Vec<Anomaly>) -> usize {
    let mut seated = 0;
    for lab in a.all_laboratories() {
        let laboratory = a.laboratory(lab);
        for &student in &laboratory.special_admission {
            if let Some(other) = a.lab_for(student) {
                trace!(
                    lab = %laboratory.key,
                    student = %a.student(student).key,
                    seated_in = %a.laboratory(other).key,
                    "reservation superseded by an earlier laboratory",
                );
                anomalies.push(Anomaly::ReservationSuperseded {
                    lab: laboratory.key.clone(),
                    student: a.student(student).key.clone(),
                    seated_in: a.laboratory(other).key.clone(),
                });
            } else if a.has_room(lab) {
                a.assign(student, Placement::SpecialAdmission(lab));
                seated += 1;
                debug!(
                    lab = %laboratory.key,
                    student = %a.student(student).key,
                    "special admission",
                );
            } else {
                debug!(
                    lab = %laboratory.key,
                    student = %a.student(student).key,
                    "laboratory full, reservation dropped",
                );
                anomalies.push(Anomaly::ReservationDropped {
                    lab: laboratory.key.clone(),
                    student: a.student(student).key.clone(),
                });
            }
        }
    }
    seated
}
