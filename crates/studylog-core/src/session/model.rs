//! DialogueSession domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::facts::{FieldName, KnownFacts};
use crate::assignment::AssignmentCandidate;
use crate::progress::StudyBlock;

/// Where a conversation stands, derived from the session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionPhase {
    Gathering,
    AwaitingConfirmation,
    Committed,
    Cancelled,
}

/// State of one progress-logging conversation.
///
/// The session is a plain value: the caller keeps it between turns and hands
/// it back with the next utterance. Nothing else holds a reference to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueSession {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub known_facts: KnownFacts,
    /// Pending matches the user still has to choose from.
    #[serde(default)]
    pub assignment_candidates: Vec<AssignmentCandidate>,
    /// Last reference that matched nothing, kept for the re-prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmatched_reference: Option<String>,
    /// Recomputed from `known_facts` every turn.
    #[serde(default)]
    pub missing_fields: Vec<FieldName>,
    #[serde(default)]
    pub awaiting_confirmation: bool,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub terminal_success: bool,
    #[serde(default)]
    pub turn_count: u32,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DialogueSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            known_facts: KnownFacts::default(),
            assignment_candidates: Vec::new(),
            unmatched_reference: None,
            missing_fields: FieldName::REQUIRED.to_vec(),
            awaiting_confirmation: false,
            confirmed: false,
            cancelled: false,
            terminal_success: false,
            turn_count: 0,
            started_at: now,
            updated_at: now,
        }
    }

    /// Starts a session that checks in on a scheduled study block.
    ///
    /// The block's assignment, when it has one, counts as already resolved.
    pub fn for_study_block(
        user_id: impl Into<String>,
        block: &StudyBlock,
        assignment_title: Option<String>,
    ) -> Self {
        let mut session = Self::new(user_id);
        session.known_facts.study_block_id = Some(block.id.clone());
        if let Some(assignment_id) = &block.assignment_id {
            session.known_facts.assignment_id = Some(assignment_id.clone());
            session.known_facts.assignment_title = assignment_title;
            session.missing_fields = vec![FieldName::Duration];
        }
        session
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal_success || self.cancelled
    }

    pub fn phase(&self) -> SessionPhase {
        if self.terminal_success {
            SessionPhase::Committed
        } else if self.cancelled {
            SessionPhase::Cancelled
        } else if self.awaiting_confirmation {
            SessionPhase::AwaitingConfirmation
        } else {
            SessionPhase::Gathering
        }
    }

    /// Records an accepted assignment and clears any pending choice.
    pub fn accept_assignment(&mut self, candidate: &AssignmentCandidate) {
        let facts = &mut self.known_facts;
        facts.assignment_id = Some(candidate.assignment_id.clone());
        facts.assignment_title = Some(candidate.display_name.clone());
        facts.course_id = candidate.course_id.clone();
        self.assignment_candidates.clear();
        self.unmatched_reference = None;
    }

    /// Name to show for the assignment in messages.
    pub fn assignment_label(&self) -> Option<&str> {
        self.known_facts
            .assignment_title
            .as_deref()
            .or(self.known_facts.assignment_id.as_deref())
            .or(self.known_facts.assignment_ref.as_deref())
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
        self.awaiting_confirmation = false;
        self.touch();
    }

    pub fn mark_committed(&mut self) {
        self.terminal_success = true;
        self.confirmed = true;
        self.awaiting_confirmation = false;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_gathering() {
        let session = DialogueSession::new("u1");
        assert_eq!(session.phase(), SessionPhase::Gathering);
        assert_eq!(session.missing_fields, vec![FieldName::Assignment, FieldName::Duration]);
        assert!(!session.is_terminal());
    }

    #[test]
    fn test_block_session_prefills_assignment() {
        let block = StudyBlock::new("b1", "u1", Some("a1".to_string()), 60);
        let session = DialogueSession::for_study_block("u1", &block, Some("Essay".to_string()));
        assert_eq!(session.known_facts.assignment_id.as_deref(), Some("a1"));
        assert_eq!(session.known_facts.study_block_id.as_deref(), Some("b1"));
        assert_eq!(session.assignment_label(), Some("Essay"));
    }

    #[test]
    fn test_commit_consumes_confirmation_flag() {
        let mut session = DialogueSession::new("u1");
        session.awaiting_confirmation = true;
        session.mark_committed();
        assert!(session.confirmed);
        assert!(!session.awaiting_confirmation);
        assert_eq!(session.phase(), SessionPhase::Committed);
    }

    #[test]
    fn test_session_round_trips_through_toml() {
        let mut session = DialogueSession::new("u1");
        session.known_facts.minutes = Some(30);
        session.assignment_candidates.push(AssignmentCandidate {
            assignment_id: "a1".to_string(),
            display_name: "HW 1".to_string(),
            confidence: 0.6,
            course_id: None,
        });

        let text = toml::to_string_pretty(&session).unwrap();
        let restored: DialogueSession = toml::from_str(&text).unwrap();
        assert_eq!(restored, session);
    }
}
