//! Dialogue orchestrator.
//!
//! One call to [`DialogueOrchestrator::handle_turn`] takes the previous
//! session value and an utterance and returns the next session value plus
//! the assistant's reply. The orchestrator keeps no per-conversation state.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studylog_core::assignment::selection::{choose_candidate, is_positional_choice};
use studylog_core::assignment::{AssignmentCatalog, Resolution};
use studylog_core::config::DialogueConfig;
use studylog_core::dialogue::{
    CompletenessTracker, Decision, TurnIntent, apply_neutral_defaults, decide,
    detect_keyword_intent, messages,
};
use studylog_core::inference::InferenceService;
use studylog_core::progress::{ProgressSnapshot, ProgressStore};
use studylog_core::session::DialogueSession;
use studylog_core::{Result, StudyLogError};

use crate::assignment_resolver::AssignmentResolver;
use crate::field_extractor::FieldExtractor;
use crate::progress_recorder::{ProgressRecorder, RecordRequest};

/// What was persisted by a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedRecord {
    pub record_id: String,
    pub assignment_id: Option<String>,
    pub course_id: Option<String>,
    pub minutes: u32,
    pub focus: Option<u8>,
    pub quality: Option<u8>,
    pub snapshot: Option<ProgressSnapshot>,
}

/// Result of one conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub assistant_message: String,
    pub session: DialogueSession,
    /// The conversation has ended (committed or cancelled).
    pub done: bool,
    /// The conversation ended with a committed record.
    pub success: bool,
    pub committed: Option<CommittedRecord>,
}

impl TurnOutcome {
    fn reply(session: DialogueSession, assistant_message: String) -> Self {
        Self {
            done: session.is_terminal(),
            success: session.terminal_success,
            assistant_message,
            session,
            committed: None,
        }
    }
}

pub struct DialogueOrchestrator {
    extractor: FieldExtractor,
    resolver: AssignmentResolver,
    recorder: Arc<ProgressRecorder>,
    config: DialogueConfig,
}

impl DialogueOrchestrator {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        catalog: Arc<dyn AssignmentCatalog>,
        store: Arc<dyn ProgressStore>,
        config: DialogueConfig,
    ) -> Self {
        let recorder = ProgressRecorder::new(store).with_catalog(catalog.clone());
        Self::with_recorder(inference, catalog, Arc::new(recorder), config)
    }

    /// Builds an orchestrator sharing an existing recorder (and its locks).
    pub fn with_recorder(
        inference: Arc<dyn InferenceService>,
        catalog: Arc<dyn AssignmentCatalog>,
        recorder: Arc<ProgressRecorder>,
        config: DialogueConfig,
    ) -> Self {
        Self {
            extractor: FieldExtractor::new(inference.clone()),
            resolver: AssignmentResolver::new(inference, catalog, &config),
            recorder,
            config,
        }
    }

    pub fn recorder(&self) -> &Arc<ProgressRecorder> {
        &self.recorder
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    /// Processes one user utterance.
    ///
    /// A missing or terminal `prior` starts a fresh conversation.
    ///
    /// # Errors
    ///
    /// Returns `StudyLogError::SessionOwnerMismatch` when `prior` belongs to
    /// another user. Every other failure is answered conversationally.
    pub async fn handle_turn(
        &self,
        user_id: &str,
        utterance: &str,
        prior: Option<DialogueSession>,
    ) -> Result<TurnOutcome> {
        let mut session = match prior {
            Some(session) if session.user_id != user_id => {
                return Err(StudyLogError::SessionOwnerMismatch {
                    owner: session.user_id,
                    caller: user_id.to_string(),
                });
            }
            Some(session) if session.is_terminal() => {
                tracing::debug!(previous = %session.id, "Previous conversation ended; starting fresh");
                DialogueSession::new(user_id)
            }
            Some(session) => session,
            None => DialogueSession::new(user_id),
        };

        session.turn_count += 1;
        session.unmatched_reference = None;
        session.touch();

        let keyword = detect_keyword_intent(utterance);
        tracing::debug!(
            session_id = %session.id,
            turn = session.turn_count,
            keyword = ?keyword,
            phase = %session.phase(),
            "Handling turn"
        );

        if keyword == Some(TurnIntent::Cancel) {
            return Ok(self.cancel(session));
        }
        if session.awaiting_confirmation && keyword == Some(TurnIntent::Accept) {
            return Ok(self.commit(session, None).await);
        }
        if session.awaiting_confirmation && keyword == Some(TurnIntent::Reject) {
            return Ok(self.act(session, TurnIntent::Reject, None).await);
        }

        let picked = choose_candidate(&session.assignment_candidates, utterance).cloned();
        if let Some(candidate) = &picked {
            tracing::debug!(assignment_id = %candidate.assignment_id, "Candidate chosen explicitly");
            session.accept_assignment(candidate);
        }

        let intent = if picked.is_some() && is_positional_choice(utterance) {
            TurnIntent::Provide
        } else {
            let mut updates = self.extractor.extract(&session, utterance, keyword).await;
            if updates.intent == TurnIntent::Cancel {
                return Ok(self.cancel(session));
            }
            if let Some(candidate) = &picked {
                if updates
                    .assignment_ref
                    .as_deref()
                    .is_some_and(|r| names_title(r, &candidate.display_name))
                {
                    updates.assignment_ref = None;
                }
            }
            if session.awaiting_confirmation && updates.has_facts() {
                session.awaiting_confirmation = false;
            }

            let report = session.known_facts.merge(&updates);
            if report.reference_changed {
                session.assignment_candidates.clear();
            }
            if picked.is_some() && !report.reference_changed {
                TurnIntent::Provide
            } else {
                updates.intent
            }
        };

        let note = self.resolve_reference(&mut session).await;
        Ok(self.act(session, intent, note).await)
    }

    /// Resolves a pending assignment reference. Returns a note for the reply
    /// when the lookup itself failed.
    async fn resolve_reference(&self, session: &mut DialogueSession) -> Option<String> {
        if session.known_facts.assignment_id.is_some() || !session.assignment_candidates.is_empty() {
            return None;
        }
        let reference = session.known_facts.assignment_ref.clone()?;

        match self.resolver.resolve(&session.user_id, &reference).await {
            Ok(Resolution::Accepted(candidate)) => {
                session.accept_assignment(&candidate);
                None
            }
            Ok(Resolution::Ambiguous(candidates)) => {
                session.assignment_candidates = candidates;
                None
            }
            Ok(Resolution::NoMatch) => {
                session.unmatched_reference = Some(reference);
                session.known_facts.assignment_ref = None;
                None
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Assignment lookup failed");
                Some(messages::lookup_failed())
            }
        }
    }

    async fn act(
        &self,
        mut session: DialogueSession,
        intent: TurnIntent,
        note: Option<String>,
    ) -> TurnOutcome {
        self.refresh_missing(&mut session);
        let decision = decide(&session, intent, &self.config);
        tracing::debug!(session_id = %session.id, decision = ?decision, "Turn decision");

        let message = match decision {
            Decision::Cancel => return self.cancel(session),
            Decision::Commit => return self.commit(session, note).await,
            Decision::AskForCorrection => {
                session.awaiting_confirmation = false;
                messages::ask_for_correction()
            }
            Decision::AskFor(field) => {
                session.awaiting_confirmation = false;
                messages::question_for(field, &session)
            }
            Decision::ChooseAssignment => {
                session.awaiting_confirmation = false;
                messages::choose_assignment(&session.assignment_candidates)
            }
            Decision::ReportNoMatch => {
                session.awaiting_confirmation = false;
                let reference = session.unmatched_reference.clone().unwrap_or_default();
                messages::no_match(&reference)
            }
            Decision::ApplyDefaults { then_confirm } => {
                let defaulted =
                    apply_neutral_defaults(&mut session.known_facts, self.config.neutral_rating);
                self.refresh_missing(&mut session);
                let defaults_note = messages::defaults_note(&defaulted, self.config.neutral_rating);
                tracing::debug!(session_id = %session.id, defaulted = ?defaulted, "Applied neutral defaults");

                if !then_confirm {
                    return self.commit(session, join(note, Some(defaults_note))).await;
                }
                session.awaiting_confirmation = true;
                format!("{}\n{}", defaults_note, messages::summary(&session))
            }
            Decision::RequestConfirmation => {
                session.awaiting_confirmation = true;
                messages::summary(&session)
            }
        };

        TurnOutcome::reply(session, join(note, Some(message)).unwrap_or_default())
    }

    fn cancel(&self, mut session: DialogueSession) -> TurnOutcome {
        session.mark_cancelled();
        tracing::info!(session_id = %session.id, user_id = %session.user_id, "Progress log cancelled");
        TurnOutcome::reply(session, messages::cancelled())
    }

    async fn commit(&self, mut session: DialogueSession, note: Option<String>) -> TurnOutcome {
        let request = RecordRequest::from_facts(&session.id, &session.user_id, &session.known_facts);

        match self.recorder.record(request).await {
            Ok(outcome) => {
                session.mark_committed();
                self.refresh_missing(&mut session);

                let message = messages::committed(&session, outcome.snapshot.as_ref());
                let record = outcome.record;
                let committed = CommittedRecord {
                    record_id: record.id,
                    assignment_id: record.assignment_id,
                    course_id: record.course_id,
                    minutes: record.minutes,
                    focus: record.focus,
                    quality: record.quality,
                    snapshot: outcome.snapshot,
                };

                TurnOutcome {
                    committed: Some(committed),
                    ..TurnOutcome::reply(session, join(note, Some(message)).unwrap_or_default())
                }
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Commit failed; keeping session for retry");
                session.awaiting_confirmation = true;
                session.confirmed = false;
                TurnOutcome::reply(session, join(note, Some(messages::commit_failed())).unwrap_or_default())
            }
        }
    }

    fn refresh_missing(&self, session: &mut DialogueSession) {
        session.missing_fields = CompletenessTracker::new(&self.config)
            .track(&session.known_facts, session.turn_count)
            .missing;
    }
}

/// Whether a proposed reference just names `title` (either contains the other).
fn names_title(reference: &str, title: &str) -> bool {
    let reference = reference.trim().to_lowercase();
    let title = title.trim().to_lowercase();
    !reference.is_empty() && (reference.contains(&title) || title.contains(&reference))
}

fn join(first: Option<String>, second: Option<String>) -> Option<String> {
    match (first, second) {
        (Some(a), Some(b)) => Some(format!("{a} {b}")),
        (a, b) => a.or(b),
    }
}
