//! Assignment of students to laboratories.
//!
//! A run takes a [`Snapshot`] of students, laboratories, ranked preferences
//! and special-admission reservations, then:
//!
//! 1. seats reserved students ([`algos::allocate_special_admissions`]),
//! 2. places everyone else in their best-ranked laboratory with room
//!    ([`algos::match_preferences`]),
//! 3. trims any over-capacity laboratory by GPA ([`algos::resolve_over_capacity`]),
//! 4. scores each student with [`satisfaction()`],
//!
//! and the [`Recorder`] appends the result to a [`RunStore`] as one batch.

pub mod algos;
pub mod checks;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod loaders;
pub mod model;
pub mod recorder;
pub mod satisfaction;
pub mod stats;
pub mod stores;

pub use crate::engine::{Engine, MatchingConfig, Outcome, Persisted, RunReport};
pub use crate::error::{EmptyDataset, Error, PersistenceError};
pub use crate::model::{Dataset, Snapshot};
pub use crate::recorder::{Recorder, RunId, RunRecord};
pub use crate::satisfaction::satisfaction;
pub use crate::stores::RunStore;
