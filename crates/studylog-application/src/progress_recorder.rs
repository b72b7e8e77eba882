//! Progress recording.
//!
//! `ProgressRecorder` is the only writer of `AssignmentProgress` and study
//! block counters. Every commit stores one immutable record together with
//! its aggregate in a single store call, then counts the minutes on the
//! study block. Both steps are keyed by the record id, so retrying a commit
//! that failed at any point applies each step exactly once.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studylog_core::assignment::AssignmentCatalog;
use studylog_core::progress::{
    AssignmentProgress, ProgressSnapshot, ProgressStore, Provenance, StudySessionRecord,
};
use studylog_core::session::{KnownFacts, RATING_RANGE};
use studylog_core::{Result, StudyLogError};
use uuid::Uuid;

use crate::keyed_lock::KeyedLock;

/// Everything needed to record one study session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRequest {
    /// Reuse an id to make a retried commit idempotent; `None` generates one.
    pub record_id: Option<String>,
    pub user_id: String,
    pub assignment_id: Option<String>,
    pub course_id: Option<String>,
    pub minutes: u32,
    pub focus: Option<u8>,
    pub quality: Option<u8>,
    pub notes: String,
    pub study_block_id: Option<String>,
    pub provenance: Provenance,
}

impl RecordRequest {
    pub fn new(user_id: impl Into<String>, minutes: u32, provenance: Provenance) -> Self {
        Self {
            record_id: None,
            user_id: user_id.into(),
            assignment_id: None,
            course_id: None,
            minutes,
            focus: None,
            quality: None,
            notes: String::new(),
            study_block_id: None,
            provenance,
        }
    }

    pub fn with_assignment(mut self, assignment_id: impl Into<String>) -> Self {
        self.assignment_id = Some(assignment_id.into());
        self
    }

    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    pub fn with_ratings(mut self, focus: Option<u8>, quality: Option<u8>) -> Self {
        self.focus = focus;
        self.quality = quality;
        self
    }

    pub fn with_study_block(mut self, block_id: impl Into<String>) -> Self {
        self.study_block_id = Some(block_id.into());
        self
    }

    /// Builds a request from the facts of a conversation. A block check-in
    /// is tagged as scheduled, anything else as interactive.
    pub fn from_facts(record_id: impl Into<String>, user_id: impl Into<String>, facts: &KnownFacts) -> Self {
        Self {
            record_id: Some(record_id.into()),
            user_id: user_id.into(),
            assignment_id: facts.assignment_id.clone(),
            course_id: facts.course_id.clone(),
            minutes: facts.minutes.unwrap_or_default(),
            focus: facts.focus,
            quality: facts.quality,
            notes: facts.notes.clone(),
            study_block_id: facts.study_block_id.clone(),
            provenance: if facts.study_block_id.is_some() {
                Provenance::Scheduled
            } else {
                Provenance::Interactive
            },
        }
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub record: StudySessionRecord,
    /// Updated aggregate; `None` when the record only names a course.
    pub snapshot: Option<ProgressSnapshot>,
}

pub struct ProgressRecorder {
    store: Arc<dyn ProgressStore>,
    catalog: Option<Arc<dyn AssignmentCatalog>>,
    locks: KeyedLock,
}

impl ProgressRecorder {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self {
            store,
            catalog: None,
            locks: KeyedLock::new(),
        }
    }

    /// Seeds new aggregates with the catalog's `estimated_hours`.
    pub fn with_catalog(mut self, catalog: Arc<dyn AssignmentCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        &self.store
    }

    /// Appends a study record and updates the derived aggregates.
    ///
    /// # Errors
    ///
    /// - `StudyLogError::InvalidInput` when `minutes` is zero or neither an
    ///   assignment nor a course is given
    /// - Any store error; retrying with the same `record_id` completes the
    ///   commit without counting the session twice
    pub async fn record(&self, request: RecordRequest) -> Result<RecordOutcome> {
        if request.minutes == 0 {
            return Err(StudyLogError::invalid_input("minutes must be positive"));
        }
        if request.assignment_id.is_none() && request.course_id.is_none() {
            return Err(StudyLogError::invalid_input(
                "a study session needs an assignment or a course",
            ));
        }

        let target = request
            .assignment_id
            .as_deref()
            .map(|id| format!("assignment:{id}"))
            .or_else(|| request.course_id.as_deref().map(|id| format!("course:{id}")))
            .unwrap_or_default();
        // Keeps the seed lookup and the commit of one pair in order within
        // this process; the store makes the commit itself atomic.
        let _pair_guard = self
            .locks
            .lock(&format!("{}/{}", request.user_id, target))
            .await;

        let record = StudySessionRecord {
            id: request
                .record_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: request.user_id.clone(),
            assignment_id: request.assignment_id.clone(),
            course_id: request.course_id.clone(),
            recorded_at: Utc::now(),
            minutes: request.minutes,
            focus: valid_rating("focus", request.focus),
            quality: valid_rating("quality", request.quality),
            notes: request.notes.trim().to_string(),
            study_block_id: request.study_block_id.clone(),
            provenance: request.provenance,
        };

        let seed = match &record.assignment_id {
            Some(assignment_id) => self.seed_for(&record.user_id, assignment_id).await?,
            None => None,
        };
        let committed = self.store.commit_record(&record, seed).await?;
        if !committed.appended {
            tracing::info!(record_id = %record.id, "Study record already stored; aggregate left as is");
        }

        if let Some(block_id) = &record.study_block_id {
            self.update_block(block_id, &record).await?;
        }

        tracing::info!(
            record_id = %record.id,
            user_id = %record.user_id,
            assignment_id = ?record.assignment_id,
            minutes = record.minutes,
            provenance = %record.provenance,
            "Recorded study session"
        );

        let snapshot = committed.progress.as_ref().map(AssignmentProgress::snapshot);
        Ok(RecordOutcome { record, snapshot })
    }

    /// A starting aggregate for a pair the store has not seen yet.
    async fn seed_for(&self, user_id: &str, assignment_id: &str) -> Result<Option<AssignmentProgress>> {
        if self.store.find_progress(user_id, assignment_id).await?.is_some() {
            return Ok(None);
        }
        Ok(Some(self.new_progress(user_id, assignment_id).await))
    }

    async fn new_progress(&self, user_id: &str, assignment_id: &str) -> AssignmentProgress {
        let progress = AssignmentProgress::new(user_id, assignment_id);
        let Some(catalog) = &self.catalog else {
            return progress;
        };

        match catalog.open_assignments(user_id).await {
            Ok(open) => match open
                .iter()
                .find(|a| a.id == assignment_id)
                .and_then(|a| a.estimated_hours)
            {
                Some(hours) => progress.with_estimate(hours),
                None => progress,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Could not read assignment estimate");
                progress
            }
        }
    }

    async fn update_block(&self, block_id: &str, record: &StudySessionRecord) -> Result<()> {
        match self
            .store
            .count_block_minutes(block_id, &record.id, record.minutes)
            .await?
        {
            Some(block) => {
                tracing::debug!(block_id = %block_id, status = %block.status, "Updated study block");
            }
            None => tracing::warn!(block_id = %block_id, "Study block not found; record kept"),
        }
        Ok(())
    }
}

fn valid_rating(field: &str, rating: Option<u8>) -> Option<u8> {
    match rating {
        Some(r) if RATING_RANGE.contains(&r) => Some(r),
        Some(r) => {
            tracing::warn!(field, rating = r, "Dropping out-of-range rating");
            None
        }
        None => None,
    }
}
