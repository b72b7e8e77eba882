//! Assignment resolution.
//!
//! Maps what the user called an assignment onto the catalog. Semantic
//! ranking comes from the inference backend; when that fails or finds
//! nothing, a substring match scored at the fallback confidence takes over.

use std::sync::Arc;
use studylog_core::Result;
use studylog_core::assignment::selection::{apply_auto_accept, substring_matches};
use studylog_core::assignment::{AssignmentCandidate, AssignmentCatalog, OpenAssignment, Resolution};
use studylog_core::config::DialogueConfig;
use studylog_core::inference::{InferenceService, MatchRequest, parse_matches};

pub struct AssignmentResolver {
    inference: Arc<dyn InferenceService>,
    catalog: Arc<dyn AssignmentCatalog>,
    auto_accept_confidence: f64,
    fallback_confidence: f64,
}

impl AssignmentResolver {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        catalog: Arc<dyn AssignmentCatalog>,
        config: &DialogueConfig,
    ) -> Self {
        Self {
            inference,
            catalog,
            auto_accept_confidence: config.auto_accept_confidence,
            fallback_confidence: config.fallback_confidence,
        }
    }

    /// Resolves `reference` against the user's open assignments.
    ///
    /// # Errors
    ///
    /// Only a catalog failure is an error; an inference failure falls back to
    /// substring matching.
    pub async fn resolve(&self, user_id: &str, reference: &str) -> Result<Resolution> {
        let open = self.catalog.open_assignments(user_id).await?;
        if open.is_empty() {
            tracing::debug!(user_id = %user_id, "No open assignments to match against");
            return Ok(Resolution::NoMatch);
        }

        let matches = self.rank(reference, &open).await;
        let resolution = apply_auto_accept(matches, self.auto_accept_confidence);

        match &resolution {
            Resolution::Accepted(candidate) => tracing::debug!(
                reference = %reference,
                assignment_id = %candidate.assignment_id,
                confidence = candidate.confidence,
                "Assignment auto-accepted"
            ),
            Resolution::Ambiguous(candidates) => tracing::debug!(
                reference = %reference,
                candidates = candidates.len(),
                "Assignment reference is ambiguous"
            ),
            Resolution::NoMatch => {
                tracing::debug!(reference = %reference, "Assignment reference matched nothing")
            }
        }
        Ok(resolution)
    }

    /// Ranks open assignments for a reference, unfiltered by the threshold.
    pub async fn rank(
        &self,
        reference: &str,
        assignments: &[OpenAssignment],
    ) -> Vec<AssignmentCandidate> {
        let request = MatchRequest {
            reference: reference.to_string(),
            assignments: assignments.to_vec(),
        };

        let semantic = match self.inference.match_assignments(&request).await {
            Ok(raw) => parse_matches(&raw, assignments).unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Semantic matching failed");
                Vec::new()
            }
        };

        if !semantic.is_empty() {
            return semantic;
        }

        tracing::debug!(reference = %reference, "Falling back to substring matching");
        substring_matches(reference, assignments, self.fallback_confidence)
    }
}
