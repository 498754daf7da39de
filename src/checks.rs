use crate::engine::Outcome;
use crate::model::Snapshot;
use eyre::{Result, ensure};
use tracing::warn;

/// Warn about reserved students who did not end up in any laboratory that
/// reserved them. Returns how many were found.
pub fn check_reservation_consistency(snapshot: &Snapshot, outcome: &Outcome) -> usize {
    let mut missed = 0;
    for student in &snapshot.students {
        let reserved_by = snapshot
            .laboratories
            .iter()
            .filter(|l| l.is_reserved_for(student.id))
            .map(|l| l.key.as_str())
            .collect::<Vec<_>>();
        if reserved_by.is_empty() {
            continue;
        }
        let assigned = outcome.entries[student.id.0].assigned_lab_id.as_deref();
        if !assigned.is_some_and(|lab| reserved_by.contains(&lab)) {
            warn!(
                student = %student,
                reserved_by = ?reserved_by,
                assigned = ?assigned,
                "student did not get a reserved laboratory",
            );
            missed += 1;
        }
    }
    missed
}

pub fn ensure_capacity(outcome: &Outcome) -> Result<()> {
    for lab in &outcome.laboratories {
        ensure!(
            lab.assigned.len() <= lab.capacity,
            "laboratory {} holds {} students for {} seats",
            lab.lab_id,
            lab.assigned.len(),
            lab.capacity
        );
    }
    Ok(())
}
