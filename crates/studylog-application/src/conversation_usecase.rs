//! Conversation use case.
//!
//! Wraps the stateless [`DialogueOrchestrator`] with session persistence so a
//! front end only passes a user id and an utterance. The open session is
//! loaded before the turn and written back (or removed once terminal) after.

use std::sync::Arc;
use studylog_core::assignment::AssignmentCatalog;
use studylog_core::dialogue::messages;
use studylog_core::progress::ProgressStore;
use studylog_core::session::{DialogueSession, DialogueSessionRepository, FieldName};
use studylog_core::{Result, StudyLogError};

use crate::dialogue_orchestrator::{DialogueOrchestrator, TurnOutcome};

pub struct ConversationUseCase {
    orchestrator: Arc<DialogueOrchestrator>,
    sessions: Arc<dyn DialogueSessionRepository>,
    catalog: Arc<dyn AssignmentCatalog>,
    store: Arc<dyn ProgressStore>,
}

impl ConversationUseCase {
    /// Creates a new `ConversationUseCase`.
    ///
    /// # Arguments
    ///
    /// * `orchestrator` - Handles the turns themselves
    /// * `sessions` - Keeps the open session between turns
    /// * `catalog` - Supplies assignment titles for block check-ins
    /// * `store` - Supplies the study blocks being checked in on
    pub fn new(
        orchestrator: Arc<DialogueOrchestrator>,
        sessions: Arc<dyn DialogueSessionRepository>,
        catalog: Arc<dyn AssignmentCatalog>,
        store: Arc<dyn ProgressStore>,
    ) -> Self {
        Self {
            orchestrator,
            sessions,
            catalog,
            store,
        }
    }

    /// Handles one utterance against the user's open session.
    pub async fn respond(&self, user_id: &str, utterance: &str) -> Result<TurnOutcome> {
        let prior = self.sessions.find_open(user_id).await?;
        let outcome = self.orchestrator.handle_turn(user_id, utterance, prior).await?;

        // The repository drops terminal sessions on save.
        self.sessions.save(&outcome.session).await?;
        Ok(outcome)
    }

    /// Opens a check-in for a scheduled study block, replacing any open session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the block does not exist or belongs to someone else.
    pub async fn start_block_check_in(&self, user_id: &str, block_id: &str) -> Result<TurnOutcome> {
        let block = self
            .store
            .find_block(block_id)
            .await?
            .filter(|block| block.user_id == user_id)
            .ok_or_else(|| StudyLogError::not_found("StudyBlock", block_id))?;

        let title = match &block.assignment_id {
            Some(assignment_id) => self.assignment_title(user_id, assignment_id).await,
            None => None,
        };

        let session = DialogueSession::for_study_block(user_id, &block, title);
        let field = session
            .missing_fields
            .first()
            .copied()
            .unwrap_or(FieldName::Duration);
        let assistant_message = messages::question_for(field, &session);

        self.sessions.save(&session).await?;
        tracing::info!(
            user_id = %user_id,
            block_id = %block_id,
            session_id = %session.id,
            "Started study block check-in"
        );

        Ok(TurnOutcome {
            assistant_message,
            session,
            done: false,
            success: false,
            committed: None,
        })
    }

    /// The user's open session, if any.
    pub async fn current(&self, user_id: &str) -> Result<Option<DialogueSession>> {
        self.sessions.find_open(user_id).await
    }

    /// Drops the user's open session without logging anything.
    pub async fn abandon(&self, user_id: &str) -> Result<()> {
        self.sessions.clear(user_id).await
    }

    async fn assignment_title(&self, user_id: &str, assignment_id: &str) -> Option<String> {
        match self.catalog.open_assignments(user_id).await {
            Ok(open) => open
                .into_iter()
                .find(|a| a.id == assignment_id)
                .map(|a| a.title),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load assignment title for check-in");
                None
            }
        }
    }
}
