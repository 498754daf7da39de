use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A student as supplied by the hosting service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub preferences: Vec<PreferenceRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub lab_id: String,
    pub rank: u32,
}

/// A laboratory as supplied by the hosting service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaboratoryRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub field_tag: Option<String>,
    #[serde(default)]
    pub special_admission: Vec<String>,
}

/// Everything a run needs, taken at a single point in time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub students: Vec<StudentRecord>,
    #[serde(default)]
    pub laboratories: Vec<LaboratoryRecord>,
}

impl StudentRecord {
    pub fn new(id: &str, gpa: Option<f64>, preferences: &[&str]) -> Self {
        Self {
            id: id.to_owned(),
            name: id.to_owned(),
            gpa,
            preferences: preferences
                .iter()
                .zip(1..)
                .map(|(lab, rank)| PreferenceRecord {
                    lab_id: (*lab).to_owned(),
                    rank,
                })
                .collect(),
        }
    }
}

impl LaboratoryRecord {
    pub fn new(id: &str, capacity: u32, special_admission: &[&str]) -> Self {
        Self {
            id: id.to_owned(),
            name: id.to_owned(),
            capacity,
            field_tag: None,
            special_admission: special_admission.iter().map(|&s| s.to_owned()).collect(),
        }
    }
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read dataset file {}", path.display()))?;
        toml::from_str(&content)
            .wrap_err_with(|| format!("cannot parse dataset file {}", path.display()))
    }
}

#[test]
fn test_parse_dataset() {
    let dataset: Dataset = toml::from_str(
        r#"
        [[students]]
        id = "S01"
        name = "Tanaka"
        gpa = 3.6
        preferences = [{ lab_id = "L1", rank = 1 }, { lab_id = "L2", rank = 2 }]

        [[students]]
        id = "S02"

        [[laboratories]]
        id = "L1"
        name = "Information Engineering"
        capacity = 5
        field_tag = "AI"
        special_admission = ["S02"]
        "#,
    )
    .unwrap();
    assert_eq!(dataset.students.len(), 2);
    assert_eq!(dataset.students[0].preferences[1].lab_id, "L2");
    assert_eq!(dataset.students[1].gpa, None);
    assert!(dataset.students[1].preferences.is_empty());
    assert_eq!(dataset.laboratories[0].special_admission, vec!["S02"]);
    assert_eq!(dataset.laboratories[0].field_tag.as_deref(), Some("AI"));
}
