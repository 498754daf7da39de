use super::LabId;
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StudentId(pub usize);

#[derive(Clone, Debug)]
pub struct Student {
    pub id: StudentId,
    pub key: String,
    pub name: String,
    pub gpa: Option<f64>,
    /// Submitted preferences in ascending rank order. `None` marks an entry
    /// naming a laboratory that does not exist: it can never be matched but
    /// still counts toward the satisfaction denominator.
    pub rankings: Vec<Option<LabId>>,
}

impl Student {
    /// 0-based position of `lab` in the submitted list.
    pub fn rank_of(&self, lab: LabId) -> Option<usize> {
        self.rankings.iter().position(|&l| l == Some(lab))
    }

    /// Laboratories that can actually be matched, best first.
    pub fn valid_rankings(&self) -> impl Iterator<Item = LabId> + '_ {
        self.rankings.iter().flatten().copied()
    }

    pub fn submitted(&self) -> usize {
        self.rankings.len()
    }

    pub fn is_lazy(&self) -> bool {
        self.rankings.is_empty()
    }

    /// Order by GPA, best first, with students without GPA last.
    pub fn cmp_gpa(&self, other: &Student) -> Ordering {
        match (self.gpa, other.gpa) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.name.is_empty() || self.name == self.key {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{} ({})", self.name, self.key)
        }
    }
}
