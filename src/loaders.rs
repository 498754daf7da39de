#![allow(clippy::cast_sign_loss)]

use crate::error::PersistenceError;
use crate::model::{Dataset, LaboratoryRecord, PreferenceRecord, StudentRecord};
use crate::recorder::{RunId, RunRecord};
use crate::stores::{HistoryEntry, RunStore};
use chrono::NaiveDateTime;
use eyre::{Result, WrapErr};
use sqlx::any::{AnyConnectOptions, AnyRow};
use sqlx::{AnyConnection, Connection, Row};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, trace};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Database access for the `students`, `laboratories`, `preferences`,
/// `lab_special_students` and `matching_results` tables.
pub struct Loader {
    conn: AnyConnection,
}

impl Loader {
    pub async fn new(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let options = AnyConnectOptions::from_str(url).wrap_err("invalid database url")?;
        Ok(Self {
            conn: AnyConnection::connect_with(&options)
                .await
                .wrap_err("cannot connect to database")?,
        })
    }

    pub async fn load(&mut self) -> Result<Dataset> {
        let mut laboratories = self
            .load_laboratories()
            .await
            .wrap_err("cannot load laboratories")?;
        let mut students = self.load_students().await.wrap_err("cannot load students")?;
        let preferences = self
            .load_preferences()
            .await
            .wrap_err("cannot load preferences")?;
        let reservations = self
            .load_special_admissions()
            .await
            .wrap_err("cannot load special admissions")?;
        let mut preferences_for: HashMap<String, Vec<PreferenceRecord>> = HashMap::new();
        for (student, lab_id, rank) in preferences {
            preferences_for
                .entry(student)
                .or_default()
                .push(PreferenceRecord { lab_id, rank });
        }
        for student in &mut students {
            student.preferences = preferences_for.remove(&student.id).unwrap_or_default();
        }
        for lab in &mut laboratories {
            lab.special_admission = reservations
                .iter()
                .filter_map(|(l, s)| if *l == lab.id { Some(s.clone()) } else { None })
                .collect();
            if !lab.special_admission.is_empty() {
                trace!(
                    lab = %lab.id,
                    reserved = ?lab.special_admission,
                    "laboratory has special admissions",
                );
            }
        }
        debug!(
            students = students.len(),
            laboratories = laboratories.len(),
            "dataset loaded"
        );
        Ok(Dataset {
            students,
            laboratories,
        })
    }

    async fn load_laboratories(&mut self) -> Result<Vec<LaboratoryRecord>, sqlx::Error> {
        sqlx::query("SELECT lab_id, lab_name, capacity, field_tag FROM laboratories")
            .try_map(|row: AnyRow| {
                Ok(LaboratoryRecord {
                    id: row.try_get("lab_id")?,
                    name: row.try_get("lab_name")?,
                    capacity: row.try_get::<i32, _>("capacity")?.max(0) as u32,
                    field_tag: row.try_get("field_tag")?,
                    special_admission: Vec::new(),
                })
            })
            .fetch_all(&mut self.conn)
            .await
    }

    async fn load_students(&mut self) -> Result<Vec<StudentRecord>, sqlx::Error> {
        sqlx::query("SELECT student_id, name, gpa FROM students")
            .try_map(|row: AnyRow| {
                Ok(StudentRecord {
                    id: row.try_get("student_id")?,
                    name: row.try_get("name")?,
                    gpa: row.try_get("gpa")?,
                    preferences: Vec::new(),
                })
            })
            .fetch_all(&mut self.conn)
            .await
    }

    async fn load_preferences(&mut self) -> Result<Vec<(String, String, u32)>, sqlx::Error> {
        sqlx::query("SELECT p.student_id, p.lab_id, p.rank FROM preferences p")
            .try_map(|row: AnyRow| {
                Ok((
                    row.try_get("student_id")?,
                    row.try_get("lab_id")?,
                    row.try_get::<i32, _>("rank")?.max(0) as u32,
                ))
            })
            .fetch_all(&mut self.conn)
            .await
    }

    async fn load_special_admissions(&mut self) -> Result<Vec<(String, String)>, sqlx::Error> {
        sqlx::query("SELECT lab_id, student_id FROM lab_special_students ORDER BY id")
            .try_map(|row: AnyRow| Ok((row.try_get("lab_id")?, row.try_get("student_id")?)))
            .fetch_all(&mut self.conn)
            .await
    }
}

impl RunStore for Loader {
    /// Insert the history rows and update the students' current assignment
    /// in a single transaction.
    async fn append(&mut self, record: &RunRecord) -> Result<RunId, PersistenceError> {
        let executed_at = record.executed_at.format(TIMESTAMP_FORMAT).to_string();
        let mut trans = self.conn.begin().await?;
        for entry in &record.entries {
            sqlx::query(
                "INSERT INTO matching_results \
                 (batch_id, executed_at, version, student_id, assigned_lab, satisfaction, summary) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.batch_id)
            .bind(&executed_at)
            .bind(record.version.clone())
            .bind(&entry.student_id)
            .bind(entry.assigned_lab_id.clone())
            .bind(i32::from(entry.satisfaction))
            .bind(&entry.summary)
            .execute(&mut *trans)
            .await?;
            sqlx::query("UPDATE students SET assigned_lab = ?, satisfaction = ? WHERE student_id = ?")
                .bind(entry.assigned_lab_id.clone())
                .bind(i32::from(entry.satisfaction))
                .bind(&entry.student_id)
                .execute(&mut *trans)
                .await?;
        }
        trans.commit().await?;
        Ok(RunId(record.batch_id.clone()))
    }

    async fn history(&mut self, student_id: &str) -> Result<Vec<HistoryEntry>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT batch_id, CAST(executed_at AS CHAR) AS executed_at, version, assigned_lab, \
             satisfaction, summary FROM matching_results WHERE student_id = ? \
             ORDER BY executed_at DESC, id DESC",
        )
        .bind(student_id)
        .fetch_all(&mut self.conn)
        .await?;
        rows.iter()
            .map(|row| {
                let executed_at: String = row.try_get("executed_at")?;
                let executed_at = NaiveDateTime::parse_from_str(&executed_at, TIMESTAMP_FORMAT)
                    .map_err(|e| {
                        PersistenceError::Other(format!("invalid timestamp {executed_at}: {e}"))
                    })?
                    .and_utc();
                Ok(HistoryEntry {
                    batch_id: row.try_get("batch_id")?,
                    executed_at,
                    version: row.try_get("version")?,
                    assigned_lab_id: row.try_get("assigned_lab")?,
                    satisfaction: row
                        .try_get::<Option<i32>, _>("satisfaction")?
                        .unwrap_or(0)
                        .clamp(0, 100) as u8,
                    summary: row.try_get::<Option<String>, _>("summary")?.unwrap_or_default(),
                })
            })
            .collect()
    }
}
