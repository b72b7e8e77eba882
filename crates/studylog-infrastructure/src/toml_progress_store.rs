//! TOML-based ProgressStore implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use studylog_core::Result;
use studylog_core::progress::{
    AssignmentProgress, CommitOutcome, ProgressStore, StudyBlock, StudySessionRecord, apply_record,
};

use crate::paths::{StorageLayout, require_user_id};
use crate::storage::AtomicTomlFile;

/// Per-user progress document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProgressDocument {
    #[serde(default)]
    records: Vec<StudySessionRecord>,
    #[serde(default)]
    assignments: Vec<AssignmentProgress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StudyBlocksDocument {
    #[serde(default)]
    blocks: Vec<StudyBlock>,
}

/// A progress store keeping one TOML document per user.
///
/// ```text
/// data_dir/
/// ├── progress/
/// │   ├── alice.toml       # [[records]] + [[assignments]]
/// │   └── bob.toml
/// └── study_blocks.toml    # [[blocks]]
/// ```
///
/// A commit appends the record and rewrites the aggregate inside one locked
/// update of the user's document, so commits from two processes never read
/// the same stale aggregate.
#[derive(Debug, Clone)]
pub struct TomlProgressStore {
    layout: StorageLayout,
}

impl TomlProgressStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: StorageLayout::new(data_dir),
        }
    }

    fn progress_file(&self, user_id: &str) -> Result<AtomicTomlFile<ProgressDocument>> {
        require_user_id(user_id)?;
        Ok(AtomicTomlFile::new(self.layout.progress_file(user_id)))
    }

    fn blocks_file(&self) -> AtomicTomlFile<StudyBlocksDocument> {
        AtomicTomlFile::new(self.layout.study_blocks_file())
    }

    fn load_document(&self, user_id: &str) -> Result<ProgressDocument> {
        Ok(self.progress_file(user_id)?.load_or_default()?)
    }
}

#[async_trait]
impl ProgressStore for TomlProgressStore {
    async fn commit_record(
        &self,
        record: &StudySessionRecord,
        seed: Option<AssignmentProgress>,
    ) -> Result<CommitOutcome> {
        let file = self.progress_file(&record.user_id)?;
        let record = record.clone();

        let outcome = file.update(ProgressDocument::default(), |doc| {
            apply_record(&mut doc.records, &mut doc.assignments, &record, seed)
        })?;

        if outcome.appended {
            tracing::debug!(record_id = %record.id, "Appended study record");
        } else {
            tracing::debug!(record_id = %record.id, "Study record already stored");
        }
        Ok(outcome)
    }

    async fn total_minutes(&self, user_id: &str, assignment_id: &str) -> Result<u64> {
        let doc = self.load_document(user_id)?;
        Ok(doc
            .records
            .iter()
            .filter(|r| r.assignment_id.as_deref() == Some(assignment_id))
            .map(|r| u64::from(r.minutes))
            .sum())
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<StudySessionRecord>> {
        let mut records = self.load_document(user_id)?.records;
        records.sort_by_key(|r| r.recorded_at);
        Ok(records)
    }

    async fn find_progress(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Option<AssignmentProgress>> {
        let doc = self.load_document(user_id)?;
        Ok(doc
            .assignments
            .into_iter()
            .find(|p| p.assignment_id == assignment_id))
    }

    async fn save_progress(&self, progress: &AssignmentProgress) -> Result<()> {
        let file = self.progress_file(&progress.user_id)?;
        let progress = progress.clone();

        file.update(ProgressDocument::default(), move |doc| {
            match doc
                .assignments
                .iter_mut()
                .find(|p| p.assignment_id == progress.assignment_id)
            {
                Some(existing) => *existing = progress,
                None => doc.assignments.push(progress),
            }
        })?;
        Ok(())
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<AssignmentProgress>> {
        Ok(self.load_document(user_id)?.assignments)
    }

    async fn find_block(&self, block_id: &str) -> Result<Option<StudyBlock>> {
        let doc = self.blocks_file().load_or_default()?;
        Ok(doc.blocks.into_iter().find(|b| b.id == block_id))
    }

    async fn save_block(&self, block: &StudyBlock) -> Result<()> {
        let block = block.clone();
        self.blocks_file()
            .update(StudyBlocksDocument::default(), move |doc| {
                match doc.blocks.iter_mut().find(|b| b.id == block.id) {
                    Some(existing) => *existing = block,
                    None => doc.blocks.push(block),
                }
            })?;
        Ok(())
    }

    async fn count_block_minutes(
        &self,
        block_id: &str,
        record_id: &str,
        minutes: u32,
    ) -> Result<Option<StudyBlock>> {
        let block = self
            .blocks_file()
            .update(StudyBlocksDocument::default(), |doc| {
                doc.blocks.iter_mut().find(|b| b.id == block_id).map(|block| {
                    block.count_record(record_id, minutes);
                    block.clone()
                })
            })?;
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use studylog_core::progress::{BlockStatus, ProgressStatus, Provenance};
    use tempfile::TempDir;

    fn record(id: &str, user: &str, assignment: Option<&str>, minutes: u32) -> StudySessionRecord {
        StudySessionRecord {
            id: id.to_string(),
            user_id: user.to_string(),
            assignment_id: assignment.map(str::to_string),
            course_id: None,
            recorded_at: Utc::now(),
            minutes,
            focus: Some(4),
            quality: None,
            notes: String::new(),
            study_block_id: None,
            provenance: Provenance::Interactive,
        }
    }

    #[tokio::test]
    async fn test_total_minutes_per_pair() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProgressStore::new(temp_dir.path());

        for r in [
            record("r1", "u1", Some("a1"), 30),
            record("r2", "u1", Some("a1"), 45),
            record("r3", "u1", Some("a2"), 60),
            record("r4", "u2", Some("a1"), 90),
            record("r5", "u1", None, 15),
        ] {
            store.commit_record(&r, None).await.unwrap();
        }

        assert_eq!(store.total_minutes("u1", "a1").await.unwrap(), 75);
        assert_eq!(store.total_minutes("u1", "a2").await.unwrap(), 60);
        assert_eq!(store.total_minutes("u2", "a1").await.unwrap(), 90);
        assert_eq!(store.total_minutes("u3", "a1").await.unwrap(), 0);
        assert_eq!(store.list_records("u1").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_commit_same_id_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProgressStore::new(temp_dir.path());
        let seed = AssignmentProgress::new("u1", "a1").with_estimate(2.0);

        let first = record("r1", "u1", Some("a1"), 30);
        let outcome = store.commit_record(&first, Some(seed.clone())).await.unwrap();
        assert!(outcome.appended);
        assert_eq!(outcome.progress.unwrap().hours_remaining, Some(1.5));

        let again = store.commit_record(&first, Some(seed)).await.unwrap();
        assert!(!again.appended);
        assert_eq!(again.progress.unwrap().hours_remaining, Some(1.5));

        assert_eq!(store.list_records("u1").await.unwrap().len(), 1);
        assert_eq!(store.total_minutes("u1", "a1").await.unwrap(), 30);
        let stored = store.find_progress("u1", "a1").await.unwrap().unwrap();
        assert_eq!(stored.hours_done, 0.5);
        assert_eq!(stored.hours_remaining, Some(1.5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_commits_through_separate_handles_lose_nothing() {
        let temp_dir = TempDir::new().unwrap();
        TomlProgressStore::new(temp_dir.path())
            .save_progress(&AssignmentProgress::new("u1", "a1").with_estimate(10.0))
            .await
            .unwrap();

        // Each task opens its own store, like separate CLI processes would.
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let dir = temp_dir.path().to_path_buf();
                tokio::spawn(async move {
                    let store = TomlProgressStore::new(dir);
                    store
                        .commit_record(&record(&format!("r{i}"), "u1", Some("a1"), 30), None)
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let store = TomlProgressStore::new(temp_dir.path());
        let progress = store.find_progress("u1", "a1").await.unwrap().unwrap();
        assert_eq!(store.list_records("u1").await.unwrap().len(), 8);
        assert_eq!(progress.hours_done, 4.0);
        assert_eq!(progress.hours_remaining, Some(6.0));
    }

    #[tokio::test]
    async fn test_records_listed_oldest_first() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProgressStore::new(temp_dir.path());

        let mut late = record("late", "u1", Some("a1"), 10);
        late.recorded_at = Utc::now();
        let mut early = record("early", "u1", Some("a1"), 10);
        early.recorded_at = late.recorded_at - Duration::hours(2);

        store.commit_record(&late, None).await.unwrap();
        store.commit_record(&early, None).await.unwrap();

        let ids: Vec<String> = store
            .list_records("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_save_progress_upserts() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProgressStore::new(temp_dir.path());

        assert!(store.find_progress("u1", "a1").await.unwrap().is_none());

        let mut progress = AssignmentProgress::new("u1", "a1").with_estimate(4.0);
        store.save_progress(&progress).await.unwrap();

        progress.hours_done = 1.5;
        progress.hours_remaining = Some(2.5);
        progress.status = ProgressStatus::InProgress;
        progress.last_worked_at = Some(Utc::now());
        store.save_progress(&progress).await.unwrap();

        let all = store.list_progress("u1").await.unwrap();
        assert_eq!(all.len(), 1);
        let found = store.find_progress("u1", "a1").await.unwrap().unwrap();
        assert_eq!(found.hours_done, 1.5);
        assert_eq!(found.hours_remaining, Some(2.5));
        assert_eq!(found.status, ProgressStatus::InProgress);
    }

    #[tokio::test]
    async fn test_blocks_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProgressStore::new(temp_dir.path());

        let mut block = StudyBlock::new("b1", "u1", Some("a1".to_string()), 60);
        store.save_block(&block).await.unwrap();
        block.add_minutes(30);
        store.save_block(&block).await.unwrap();

        let found = store.find_block("b1").await.unwrap().unwrap();
        assert_eq!(found.actual_minutes, 30);
        assert_eq!(found.status, BlockStatus::Partial);
        assert!(store.find_block("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_block_minutes_counted_once_per_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProgressStore::new(temp_dir.path());
        store
            .save_block(&StudyBlock::new("b1", "u1", None, 60))
            .await
            .unwrap();

        store.count_block_minutes("b1", "r1", 45).await.unwrap();
        let block = store.count_block_minutes("b1", "r1", 45).await.unwrap().unwrap();
        assert_eq!(block.actual_minutes, 45);
        assert_eq!(block.status, BlockStatus::Partial);

        let block = store.count_block_minutes("b1", "r2", 15).await.unwrap().unwrap();
        assert_eq!(block.status, BlockStatus::Completed);
        assert!(store.count_block_minutes("nope", "r3", 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_user_id_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProgressStore::new(temp_dir.path());

        let err = store
            .commit_record(&record("r1", "", Some("a1"), 30), None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }
}
