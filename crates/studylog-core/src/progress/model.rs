//! Progress domain models.
//!
//! `StudySessionRecord` is the append-only source of truth; `AssignmentProgress`
//! and `StudyBlock` counters are derived from it by the recorder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Where a study session record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Provenance {
    /// Logged through the conversation.
    Interactive,
    /// Logged against a scheduled study block.
    Scheduled,
    /// Imported from an external system.
    ExternalSync,
}

/// One logged stretch of study time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySessionRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_block_id: Option<String>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

/// Aggregate progress of one user on one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentProgress {
    pub user_id: String,
    pub assignment_id: String,
    pub hours_done: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_remaining: Option<f64>,
    #[serde(default)]
    pub status: ProgressStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_worked_at: Option<DateTime<Utc>>,
}

impl AssignmentProgress {
    /// A fresh aggregate for a pair that has never been worked on.
    pub fn new(user_id: impl Into<String>, assignment_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            assignment_id: assignment_id.into(),
            hours_done: 0.0,
            hours_remaining: None,
            status: ProgressStatus::NotStarted,
            last_worked_at: None,
        }
    }

    pub fn with_estimate(mut self, hours_remaining: f64) -> Self {
        self.hours_remaining = Some(hours_remaining.max(0.0));
        self
    }

    /// Folds a newly stored record into the aggregate.
    ///
    /// `total_minutes` is the sum over every stored record of the pair,
    /// this one included. The remaining estimate only ever shrinks and
    /// bottoms out at zero; reaching it does not mark the assignment done.
    pub fn absorb(&mut self, record: &StudySessionRecord, total_minutes: u64) {
        let session_hours = f64::from(record.minutes) / 60.0;
        self.hours_done = total_minutes as f64 / 60.0;
        self.hours_remaining = self
            .hours_remaining
            .map(|remaining| (remaining - session_hours).max(0.0));
        if self.status == ProgressStatus::NotStarted {
            self.status = ProgressStatus::InProgress;
        }
        self.last_worked_at = Some(record.recorded_at);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            assignment_id: self.assignment_id.clone(),
            hours_done: self.hours_done,
            hours_remaining: self.hours_remaining,
            status: self.status,
        }
    }
}

/// Result of storing one record together with its aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    /// `false` when a record with the same id was already stored; nothing
    /// was changed in that case.
    pub appended: bool,
    /// The pair's aggregate after the commit; `None` for course-only records.
    pub progress: Option<AssignmentProgress>,
}

/// Appends `record` to a user's ledger and folds it into its aggregate.
///
/// Stores call this inside their own critical section so the append, the
/// total and the aggregate update happen as one step. `seed` starts the
/// aggregate when the pair has none yet.
pub fn apply_record(
    records: &mut Vec<StudySessionRecord>,
    aggregates: &mut Vec<AssignmentProgress>,
    record: &StudySessionRecord,
    seed: Option<AssignmentProgress>,
) -> CommitOutcome {
    let find = |aggregates: &[AssignmentProgress], assignment_id: &str| {
        aggregates
            .iter()
            .position(|p| p.user_id == record.user_id && p.assignment_id == assignment_id)
    };

    if records.iter().any(|r| r.id == record.id) {
        let progress = record
            .assignment_id
            .as_deref()
            .and_then(|id| find(aggregates.as_slice(), id))
            .map(|i| aggregates[i].clone());
        return CommitOutcome {
            appended: false,
            progress,
        };
    }

    records.push(record.clone());
    let Some(assignment_id) = record.assignment_id.as_deref() else {
        return CommitOutcome {
            appended: true,
            progress: None,
        };
    };

    let total_minutes: u64 = records
        .iter()
        .filter(|r| r.user_id == record.user_id && r.assignment_id.as_deref() == Some(assignment_id))
        .map(|r| u64::from(r.minutes))
        .sum();

    let index = match find(aggregates.as_slice(), assignment_id) {
        Some(i) => i,
        None => {
            let fresh = seed
                .filter(|s| s.user_id == record.user_id && s.assignment_id == assignment_id)
                .unwrap_or_else(|| AssignmentProgress::new(&record.user_id, assignment_id));
            aggregates.push(fresh);
            aggregates.len() - 1
        }
    };
    aggregates[index].absorb(record, total_minutes);

    CommitOutcome {
        appended: true,
        progress: Some(aggregates[index].clone()),
    }
}

/// What the recorder reports back after a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub assignment_id: String,
    pub hours_done: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_remaining: Option<f64>,
    pub status: ProgressStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BlockStatus {
    #[default]
    Scheduled,
    Partial,
    Completed,
}

/// A study block planned by the external scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyBlock {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,
    pub planned_minutes: u32,
    #[serde(default)]
    pub actual_minutes: u32,
    #[serde(default)]
    pub status: BlockStatus,
    /// Records whose minutes are already counted in `actual_minutes`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub counted_records: Vec<String>,
}

impl StudyBlock {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        assignment_id: Option<String>,
        planned_minutes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            assignment_id,
            planned_minutes,
            actual_minutes: 0,
            status: BlockStatus::Scheduled,
            counted_records: Vec::new(),
        }
    }

    /// Counts a record's minutes once. Returns `false` for a record that was
    /// already counted.
    pub fn count_record(&mut self, record_id: &str, minutes: u32) -> bool {
        if self.counted_records.iter().any(|id| id == record_id) {
            return false;
        }
        self.counted_records.push(record_id.to_string());
        self.add_minutes(minutes);
        true
    }

    /// Adds worked minutes and moves the block to partial or completed.
    pub fn add_minutes(&mut self, minutes: u32) {
        self.actual_minutes = self.actual_minutes.saturating_add(minutes);
        self.status = if self.actual_minutes >= self.planned_minutes {
            BlockStatus::Completed
        } else {
            BlockStatus::Partial
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_status_transitions() {
        let mut block = StudyBlock::new("b1", "u1", None, 60);
        assert_eq!(block.status, BlockStatus::Scheduled);

        block.add_minutes(25);
        assert_eq!(block.status, BlockStatus::Partial);
        assert_eq!(block.actual_minutes, 25);

        block.add_minutes(35);
        assert_eq!(block.status, BlockStatus::Completed);
    }

    #[test]
    fn test_block_counts_each_record_once() {
        let mut block = StudyBlock::new("b1", "u1", None, 60);
        assert!(block.count_record("r1", 40));
        assert!(!block.count_record("r1", 40));
        assert_eq!(block.actual_minutes, 40);
        assert_eq!(block.status, BlockStatus::Partial);
    }

    fn record(id: &str, assignment: Option<&str>, minutes: u32) -> StudySessionRecord {
        StudySessionRecord {
            id: id.to_string(),
            user_id: "u1".to_string(),
            assignment_id: assignment.map(str::to_string),
            course_id: None,
            recorded_at: Utc::now(),
            minutes,
            focus: None,
            quality: None,
            notes: String::new(),
            study_block_id: None,
            provenance: Provenance::Interactive,
        }
    }

    #[test]
    fn test_apply_record_seeds_and_subtracts() {
        let mut records = Vec::new();
        let mut aggregates = Vec::new();
        let seed = AssignmentProgress::new("u1", "a1").with_estimate(4.0);

        let first = apply_record(&mut records, &mut aggregates, &record("r1", Some("a1"), 60), Some(seed));
        assert!(first.appended);
        let progress = first.progress.unwrap();
        assert_eq!(progress.hours_done, 1.0);
        assert_eq!(progress.hours_remaining, Some(3.0));
        assert_eq!(progress.status, ProgressStatus::InProgress);

        let second = apply_record(&mut records, &mut aggregates, &record("r2", Some("a1"), 30), None);
        let progress = second.progress.unwrap();
        assert_eq!(progress.hours_done, 1.5);
        assert_eq!(progress.hours_remaining, Some(2.5));
        assert_eq!(aggregates.len(), 1);
    }

    #[test]
    fn test_apply_record_same_id_changes_nothing() {
        let mut records = Vec::new();
        let mut aggregates = vec![AssignmentProgress::new("u1", "a1").with_estimate(4.0)];
        let r1 = record("r1", Some("a1"), 60);

        apply_record(&mut records, &mut aggregates, &r1, None);
        let again = apply_record(&mut records, &mut aggregates, &r1, None);

        assert!(!again.appended);
        assert_eq!(records.len(), 1);
        assert_eq!(again.progress.unwrap().hours_remaining, Some(3.0));
        assert_eq!(aggregates[0].hours_done, 1.0);
    }

    #[test]
    fn test_apply_course_only_record_has_no_aggregate() {
        let mut records = Vec::new();
        let mut aggregates = Vec::new();

        let outcome = apply_record(&mut records, &mut aggregates, &record("r1", None, 45), None);
        assert!(outcome.appended);
        assert!(outcome.progress.is_none());
        assert!(aggregates.is_empty());
    }

    #[test]
    fn test_estimate_is_never_negative() {
        let progress = AssignmentProgress::new("u1", "a1").with_estimate(-2.0);
        assert_eq!(progress.hours_remaining, Some(0.0));
    }

    #[test]
    fn test_provenance_names() {
        assert_eq!(Provenance::ExternalSync.to_string(), "external_sync");
        assert_eq!(
            serde_json::to_string(&Provenance::Interactive).unwrap(),
            "\"interactive\""
        );
    }
}
