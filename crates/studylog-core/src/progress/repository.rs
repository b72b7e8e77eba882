//! Progress store trait.
//!
//! Defines the interface for persisting study records and the aggregates
//! derived from them.

use async_trait::async_trait;

use super::model::{AssignmentProgress, CommitOutcome, StudyBlock, StudySessionRecord};
use crate::error::Result;

/// An abstract store for study records, assignment progress and study blocks.
///
/// # Implementation Notes
///
/// `commit_record` and `count_block_minutes` are read-modify-write cycles
/// and must each be atomic, also against other processes sharing the same
/// data (file lock, transaction). [`apply_record`](super::apply_record)
/// holds the aggregate rules so every store folds records the same way.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Appends a record and updates its (user, assignment) aggregate in one
    /// atomic step. Records are never updated or removed.
    ///
    /// `seed` starts the aggregate when the pair has none yet. Committing an
    /// id that is already stored changes nothing and reports
    /// `appended == false`, so a failed commit can be retried with the same
    /// record.
    async fn commit_record(
        &self,
        record: &StudySessionRecord,
        seed: Option<AssignmentProgress>,
    ) -> Result<CommitOutcome>;

    /// Sums the minutes of every record for the (user, assignment) pair.
    async fn total_minutes(&self, user_id: &str, assignment_id: &str) -> Result<u64>;

    /// Lists a user's records, oldest first.
    async fn list_records(&self, user_id: &str) -> Result<Vec<StudySessionRecord>>;

    /// Finds the aggregate for a (user, assignment) pair.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(AssignmentProgress))`: Aggregate found
    /// - `Ok(None)`: The pair has never been recorded or seeded
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_progress(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Option<AssignmentProgress>>;

    /// Inserts or replaces the aggregate for its (user, assignment) pair.
    async fn save_progress(&self, progress: &AssignmentProgress) -> Result<()>;

    /// Lists every aggregate of a user.
    async fn list_progress(&self, user_id: &str) -> Result<Vec<AssignmentProgress>>;

    /// Finds a study block by id.
    async fn find_block(&self, block_id: &str) -> Result<Option<StudyBlock>>;

    /// Inserts or replaces a study block.
    async fn save_block(&self, block: &StudyBlock) -> Result<()>;

    /// Adds a record's minutes to a study block, at most once per record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StudyBlock))`: The block after the update
    /// - `Ok(None)`: No block with that id
    /// - `Err(_)`: Error occurred during the update
    async fn count_block_minutes(
        &self,
        block_id: &str,
        record_id: &str,
        minutes: u32,
    ) -> Result<Option<StudyBlock>>;
}
