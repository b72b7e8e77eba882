//! In-memory collaborators shared by the unit tests of this crate.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use studylog_core::assignment::{AssignmentCatalog, OpenAssignment};
use studylog_core::inference::{ExtractionRequest, InferenceService, MatchRequest};
use studylog_core::progress::{
    AssignmentProgress, CommitOutcome, ProgressStore, StudyBlock, StudySessionRecord, apply_record,
};
use studylog_core::{Result, StudyLogError};

/// Inference backend replaying canned responses in order.
///
/// An exhausted queue answers with an error, like an unreachable backend.
#[derive(Default)]
pub struct ScriptedInference {
    extractions: Mutex<VecDeque<Result<String>>>,
    matches: Mutex<VecDeque<Result<String>>>,
    pub extraction_calls: AtomicUsize,
    pub match_calls: AtomicUsize,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extraction(self, raw: &str) -> Self {
        self.extractions.lock().unwrap().push_back(Ok(raw.to_string()));
        self
    }

    pub fn extraction_error(self) -> Self {
        self.extractions
            .lock()
            .unwrap()
            .push_back(Err(StudyLogError::inference("timed out", true)));
        self
    }

    pub fn matching(self, raw: &str) -> Self {
        self.matches.lock().unwrap().push_back(Ok(raw.to_string()));
        self
    }

    pub fn extraction_calls(&self) -> usize {
        self.extraction_calls.load(Ordering::SeqCst)
    }

    pub fn match_calls(&self) -> usize {
        self.match_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceService for ScriptedInference {
    async fn extract_fields(&self, _request: &ExtractionRequest) -> Result<String> {
        self.extraction_calls.fetch_add(1, Ordering::SeqCst);
        self.extractions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StudyLogError::inference("no scripted extraction", false)))
    }

    async fn match_assignments(&self, _request: &MatchRequest) -> Result<String> {
        self.match_calls.fetch_add(1, Ordering::SeqCst);
        self.matches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StudyLogError::inference("no scripted matches", false)))
    }
}

/// Progress store kept in memory. Commits fail while `fail_appends` is set;
/// block updates fail while `block_failures` is above zero.
#[derive(Default)]
pub struct MemoryProgressStore {
    pub records: Mutex<Vec<StudySessionRecord>>,
    pub progress: Mutex<Vec<AssignmentProgress>>,
    pub blocks: Mutex<Vec<StudyBlock>>,
    pub fail_appends: AtomicBool,
    pub block_failures: AtomicUsize,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_appends.store(true, Ordering::SeqCst);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }

    /// Makes the next `count` block updates fail.
    pub fn fail_block_updates(&self, count: usize) {
        self.block_failures.store(count, Ordering::SeqCst);
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn commit_record(
        &self,
        record: &StudySessionRecord,
        seed: Option<AssignmentProgress>,
    ) -> Result<CommitOutcome> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StudyLogError::io("disk full"));
        }
        let mut records = self.records.lock().unwrap();
        let mut progress = self.progress.lock().unwrap();
        Ok(apply_record(&mut records, &mut progress, record, seed))
    }

    async fn total_minutes(&self, user_id: &str, assignment_id: &str) -> Result<u64> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && r.assignment_id.as_deref() == Some(assignment_id))
            .map(|r| u64::from(r.minutes))
            .sum())
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<StudySessionRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_progress(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Option<AssignmentProgress>> {
        Ok(self
            .progress
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id && p.assignment_id == assignment_id)
            .cloned())
    }

    async fn save_progress(&self, progress: &AssignmentProgress) -> Result<()> {
        let mut all = self.progress.lock().unwrap();
        all.retain(|p| !(p.user_id == progress.user_id && p.assignment_id == progress.assignment_id));
        all.push(progress.clone());
        Ok(())
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<AssignmentProgress>> {
        Ok(self
            .progress
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_block(&self, block_id: &str) -> Result<Option<StudyBlock>> {
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == block_id)
            .cloned())
    }

    async fn save_block(&self, block: &StudyBlock) -> Result<()> {
        let mut blocks = self.blocks.lock().unwrap();
        blocks.retain(|b| b.id != block.id);
        blocks.push(block.clone());
        Ok(())
    }

    async fn count_block_minutes(
        &self,
        block_id: &str,
        record_id: &str,
        minutes: u32,
    ) -> Result<Option<StudyBlock>> {
        let failing = self
            .block_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StudyLogError::io("study blocks file is locked"));
        }
        let mut blocks = self.blocks.lock().unwrap();
        Ok(blocks.iter_mut().find(|b| b.id == block_id).map(|block| {
            block.count_record(record_id, minutes);
            block.clone()
        }))
    }
}

/// Catalog returning a fixed list for every user.
pub struct StaticCatalog {
    assignments: Vec<OpenAssignment>,
}

impl StaticCatalog {
    pub fn new(assignments: Vec<OpenAssignment>) -> Self {
        Self { assignments }
    }
}

#[async_trait]
impl AssignmentCatalog for StaticCatalog {
    async fn open_assignments(&self, _user_id: &str) -> Result<Vec<OpenAssignment>> {
        Ok(self.assignments.clone())
    }
}

/// Catalog that is always unavailable.
pub struct BrokenCatalog;

#[async_trait]
impl AssignmentCatalog for BrokenCatalog {
    async fn open_assignments(&self, _user_id: &str) -> Result<Vec<OpenAssignment>> {
        Err(StudyLogError::io("catalog unavailable"))
    }
}

pub fn rl_project() -> OpenAssignment {
    let mut assignment = OpenAssignment::new("a-rl", "RL Project").with_course("cs285");
    assignment.estimated_hours = Some(4.0);
    assignment
}

pub fn homework_pair() -> Vec<OpenAssignment> {
    vec![
        OpenAssignment::new("a-hw2p", "Assignment 2: Probability").with_course("stat110"),
        OpenAssignment::new("a-hw2s", "Assignment 2: Statistics").with_course("stat111"),
    ]
}
