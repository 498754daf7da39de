use serde::{Deserialize, Serialize};
use std::fmt;

/// A per-record problem noticed during a run. Anomalies never abort the run;
/// they are listed in the outcome and in the summaries of affected students.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// A preference names a laboratory that does not exist.
    InvalidPreference { student: String, lab: String },
    DuplicatePreference { student: String, lab: String },
    /// A special-admission list names a student that does not exist.
    UnknownReservation { lab: String, student: String },
    DuplicateStudent { student: String },
    DuplicateLaboratory { lab: String },
    /// A reserved student could not be seated because the lab was full.
    ReservationDropped { lab: String, student: String },
    /// A reserved student was already seated by an earlier laboratory.
    ReservationSuperseded {
        lab: String,
        student: String,
        seated_in: String,
    },
    /// Removed from an over-capacity laboratory by the GPA tie-break.
    Evicted { lab: String, student: String },
    /// No seat was available in any of the student's preferences.
    Unplaced { student: String },
}

impl Anomaly {
    /// The student this anomaly concerns, if any.
    pub fn student(&self) -> Option<&str> {
        match self {
            Anomaly::InvalidPreference { student, .. }
            | Anomaly::DuplicatePreference { student, .. }
            | Anomaly::ReservationDropped { student, .. }
            | Anomaly::ReservationSuperseded { student, .. }
            | Anomaly::Evicted { student, .. }
            | Anomaly::Unplaced { student }
            | Anomaly::DuplicateStudent { student } => Some(student),
            Anomaly::UnknownReservation { .. } | Anomaly::DuplicateLaboratory { .. } => None,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Anomaly::InvalidPreference { student, lab } => {
                write!(f, "student {student} ranks unknown laboratory {lab}")
            }
            Anomaly::DuplicatePreference { student, lab } => {
                write!(f, "student {student} ranks laboratory {lab} more than once")
            }
            Anomaly::UnknownReservation { lab, student } => {
                write!(f, "laboratory {lab} reserves unknown student {student}")
            }
            Anomaly::DuplicateStudent { student } => {
                write!(f, "student {student} is registered more than once")
            }
            Anomaly::DuplicateLaboratory { lab } => {
                write!(f, "laboratory {lab} is registered more than once")
            }
            Anomaly::ReservationDropped { lab, student } => {
                write!(f, "laboratory {lab} is full, reservation for {student} dropped")
            }
            Anomaly::ReservationSuperseded {
                lab,
                student,
                seated_in,
            } => write!(
                f,
                "reservation for {student} in laboratory {lab} superseded by {seated_in}"
            ),
            Anomaly::Evicted { lab, student } => {
                write!(f, "student {student} evicted from over-capacity laboratory {lab}")
            }
            Anomaly::Unplaced { student } => {
                write!(f, "student {student} could not be placed in any preferred laboratory")
            }
        }
    }
}
