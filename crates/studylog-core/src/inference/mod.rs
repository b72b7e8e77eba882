//! Inference service boundary.
//!
//! The natural-language steps (field extraction, semantic assignment
//! matching) are delegated to an external service behind a text-in,
//! text-out trait. Turning that text into typed values happens here so that
//! a malformed response degrades to "nothing extracted" instead of an error.
//!
//! # Module Structure
//!
//! - `extraction`: Response schema and validation for field extraction
//! - `matching`: Response schema for semantic assignment matching

use async_trait::async_trait;
use serde::Serialize;

use crate::assignment::OpenAssignment;
use crate::error::Result;

pub mod extraction;
pub mod matching;

pub use extraction::{ExtractedFields, ExtractedIntent, parse_extraction};
pub use matching::parse_matches;

/// Input for one field-extraction call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRequest {
    pub utterance: String,
    /// Compact description of what is already known.
    pub known_facts: String,
}

/// Input for one semantic matching call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRequest {
    pub reference: String,
    pub assignments: Vec<OpenAssignment>,
}

/// External natural-language service.
///
/// Implementations return the raw model output. Callers parse it with
/// [`parse_extraction`] / [`parse_matches`].
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Extracts progress fields from an utterance.
    async fn extract_fields(&self, request: &ExtractionRequest) -> Result<String>;

    /// Ranks open assignments against a reference.
    async fn match_assignments(&self, request: &MatchRequest) -> Result<String>;
}

/// Finds the JSON payload in a model response.
///
/// Models often wrap JSON in prose or markdown fences; this returns the
/// outermost `{...}` or `[...]` span, whichever starts first.
pub fn json_payload(raw: &str) -> Option<&str> {
    let object = raw.find('{').zip(raw.rfind('}'));
    let array = raw.find('[').zip(raw.rfind(']'));

    let (start, end) = match (object, array) {
        (Some(o), Some(a)) => {
            if a.0 < o.0 {
                a
            } else {
                o
            }
        }
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    (start < end).then(|| &raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_payload_strips_fences() {
        let raw = "Sure!\n```json\n{\"intent\": \"cancel\"}\n```";
        assert_eq!(json_payload(raw), Some("{\"intent\": \"cancel\"}"));
    }

    #[test]
    fn test_json_payload_prefers_leading_array() {
        let raw = "[{\"assignment_id\": \"a1\"}]";
        assert_eq!(json_payload(raw), Some(raw));
    }

    #[test]
    fn test_json_payload_none_for_prose() {
        assert_eq!(json_payload("I could not understand that."), None);
        assert_eq!(json_payload("} backwards {"), None);
    }
}
