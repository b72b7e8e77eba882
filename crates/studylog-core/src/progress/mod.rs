//! Progress domain module.
//!
//! # Module Structure
//!
//! - `model`: Study records, assignment aggregates and study blocks
//! - `repository`: `ProgressStore` trait for persistence

mod model;
mod repository;

pub use model::{
    AssignmentProgress, BlockStatus, CommitOutcome, ProgressSnapshot, ProgressStatus, Provenance,
    StudyBlock, StudySessionRecord, apply_record,
};
pub use repository::ProgressStore;
