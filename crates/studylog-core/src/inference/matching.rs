//! Semantic matching response schema.

use serde::Deserialize;

use super::json_payload;
use crate::assignment::{AssignmentCandidate, OpenAssignment};

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(alias = "id")]
    assignment_id: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    #[allow(dead_code)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMatches {
    Wrapped { matches: Vec<RawMatch> },
    Bare(Vec<RawMatch>),
}

/// Parses a matching response into candidates.
///
/// Ids the model invented (not in `assignments`) are discarded and display
/// names always come from the catalog. Returns `None` when the response is
/// not parseable, `Some(vec![])` when the model matched nothing.
pub fn parse_matches(
    raw: &str,
    assignments: &[OpenAssignment],
) -> Option<Vec<AssignmentCandidate>> {
    let payload = json_payload(raw)?;
    let parsed: RawMatches = match serde_json::from_str(payload) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Could not parse assignment match response");
            return None;
        }
    };

    let raw_matches = match parsed {
        RawMatches::Wrapped { matches } => matches,
        RawMatches::Bare(matches) => matches,
    };

    let candidates = raw_matches
        .into_iter()
        .filter_map(|m| {
            let known = assignments.iter().find(|a| a.id == m.assignment_id);
            if known.is_none() {
                tracing::debug!(assignment_id = %m.assignment_id, "Ignoring unknown assignment id");
            }
            known.map(|a| AssignmentCandidate::from_assignment(a, m.confidence))
        })
        .collect();

    Some(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<OpenAssignment> {
        vec![
            OpenAssignment::new("a1", "Assignment 2: Probability"),
            OpenAssignment::new("a2", "Assignment 2: Statistics"),
        ]
    }

    #[test]
    fn test_parses_wrapped_matches() {
        let raw = r#"{"matches": [
            {"assignment_id": "a1", "confidence": 0.6, "reason": "number matches"},
            {"assignment_id": "a2", "confidence": 0.6, "reason": "number matches"}
        ]}"#;
        let candidates = parse_matches(raw, &catalog()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].display_name, "Assignment 2: Statistics");
    }

    #[test]
    fn test_parses_bare_list_and_drops_unknown_ids() {
        let raw = r#"[{"id": "zz", "confidence": 0.99}, {"id": "a1", "confidence": 1.4}]"#;
        let candidates = parse_matches(raw, &catalog()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].assignment_id, "a1");
        assert_eq!(candidates[0].confidence, 1.0);
    }

    #[test]
    fn test_empty_and_garbage() {
        assert_eq!(parse_matches(r#"{"matches": []}"#, &catalog()), Some(Vec::new()));
        assert_eq!(parse_matches("nothing found", &catalog()), None);
    }
}
