//! Field extraction from free-form utterances.

use std::sync::Arc;
use studylog_core::dialogue::TurnIntent;
use studylog_core::inference::{ExtractionRequest, InferenceService, parse_extraction};
use studylog_core::session::{DialogueSession, ProposedUpdates};

/// Turns one utterance into validated field updates.
///
/// Makes exactly one inference call. Backend failures and unparseable output
/// degrade to an update that carries only the keyword intent, so a turn can
/// always be answered.
pub struct FieldExtractor {
    inference: Arc<dyn InferenceService>,
}

impl FieldExtractor {
    pub fn new(inference: Arc<dyn InferenceService>) -> Self {
        Self { inference }
    }

    /// Extracts proposed updates for `utterance`.
    ///
    /// # Arguments
    ///
    /// * `session` - Supplies the known-facts summary sent as context
    /// * `utterance` - The user's message
    /// * `keyword_intent` - Result of keyword detection; wins over the model
    pub async fn extract(
        &self,
        session: &DialogueSession,
        utterance: &str,
        keyword_intent: Option<TurnIntent>,
    ) -> ProposedUpdates {
        let fallback = ProposedUpdates::intent_only(keyword_intent.unwrap_or(TurnIntent::Provide));

        let request = ExtractionRequest {
            utterance: utterance.to_string(),
            known_facts: session.known_facts.context_summary(),
        };

        let raw = match self.inference.extract_fields(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    session_id = %session.id,
                    error = %e,
                    "Field extraction failed; continuing without new facts"
                );
                return fallback;
            }
        };

        match parse_extraction(&raw) {
            Some(fields) => {
                let updates = fields.into_updates(keyword_intent);
                tracing::debug!(
                    session_id = %session.id,
                    intent = ?updates.intent,
                    has_facts = updates.has_facts(),
                    "Extracted fields"
                );
                updates
            }
            None => {
                tracing::warn!(session_id = %session.id, "Extraction response had no usable JSON");
                fallback
            }
        }
    }
}
