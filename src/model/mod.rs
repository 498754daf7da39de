pub use self::anomaly::Anomaly;
pub use self::assignments::{Assignments, Placement};
pub use self::dataset::{Dataset, LaboratoryRecord, PreferenceRecord, StudentRecord};
pub use self::laboratory::{LabId, Laboratory};
pub use self::snapshot::Snapshot;
pub use self::student::{Student, StudentId};

mod anomaly;
mod assignments;
mod dataset;
mod laboratory;
mod snapshot;
mod student;
