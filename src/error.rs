//! Error types for the assignment engine.
//!
//! Only dataset-level problems stop a run. Per-record problems are reported as
//! [`Anomaly`](crate::model::Anomaly) values in the run outcome instead.

use thiserror::Error;

/// Top-level error type returned by the engine and the run recorder.
#[derive(Debug, Error)]
pub enum Error {
    /// The dataset cannot be matched at all; nothing has been mutated.
    #[error("empty dataset: {0}")]
    EmptyDataset(#[from] EmptyDataset),

    /// The run result could not be durably recorded.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Structural input problems detected while taking the snapshot.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EmptyDataset {
    #[error("no students to assign")]
    NoStudents,

    #[error("no laboratories to assign students to")]
    NoLaboratories,
}

/// A history store could not record or read runs.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}
