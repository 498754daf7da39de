use super::StudentId;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LabId(pub usize);

#[derive(Clone, Debug)]
pub struct Laboratory {
    pub id: LabId,
    pub key: String,
    pub name: String,
    pub capacity: usize,
    pub field_tag: Option<String>,
    /// Reserved students in the order the laboratory stored them. May be
    /// longer than `capacity`.
    pub special_admission: Vec<StudentId>,
}

impl Laboratory {
    pub fn is_reserved_for(&self, student: StudentId) -> bool {
        self.special_admission.contains(&student)
    }
}

impl fmt::Display for Laboratory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.name.is_empty() || self.name == self.key {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{} ({})", self.name, self.key)
        }
    }
}
