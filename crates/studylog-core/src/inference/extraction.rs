//! Field-extraction response schema.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::json_payload;
use crate::dialogue::TurnIntent;
use crate::session::{ProposedUpdates, RATING_RANGE};

/// Intent reported by the extraction model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractedIntent {
    LogProgress,
    Cancel,
    Other,
}

impl ExtractedIntent {
    fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "log_progress" | "log" | "progress" => Self::LogProgress,
            "cancel" | "abort" => Self::Cancel,
            _ => Self::Other,
        }
    }
}

/// Structured fields as the model returned them, before validation.
///
/// Numbers are accepted either as JSON numbers or numeric strings; anything
/// else becomes `None` rather than failing the whole parse.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default, alias = "assignment", alias = "assignment_reference")]
    pub assignment_ref: Option<String>,
    #[serde(default, alias = "minutes", deserialize_with = "lenient_number")]
    pub duration_minutes: Option<f64>,
    #[serde(default, alias = "is_estimate")]
    pub duration_is_estimate: Option<bool>,
    #[serde(default, alias = "original_phrase")]
    pub duration_phrase: Option<String>,
    #[serde(default, alias = "focus_level", deserialize_with = "lenient_number")]
    pub focus: Option<f64>,
    #[serde(default, alias = "quality_level", deserialize_with = "lenient_number")]
    pub quality: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ExtractedFields {
    pub fn intent(&self) -> Option<ExtractedIntent> {
        self.intent.as_deref().map(ExtractedIntent::from_label)
    }

    /// Validates the raw fields into proposed updates.
    ///
    /// Non-positive durations and ratings outside 1–5 are dropped; the
    /// caller's keyword intent, when present, wins over the model's.
    pub fn into_updates(self, keyword_intent: Option<TurnIntent>) -> ProposedUpdates {
        let intent = match (keyword_intent, self.intent()) {
            (Some(intent), _) => intent,
            (None, Some(ExtractedIntent::Cancel)) => TurnIntent::Cancel,
            _ => TurnIntent::Provide,
        };

        let minutes = self.duration_minutes.and_then(positive_minutes);
        if minutes.is_none() && self.duration_minutes.is_some() {
            tracing::warn!(
                value = ?self.duration_minutes,
                "Dropping non-positive or invalid duration"
            );
        }

        ProposedUpdates {
            intent,
            assignment_ref: non_empty(self.assignment_ref),
            minutes,
            duration_is_estimate: minutes.is_some() && self.duration_is_estimate.unwrap_or(false),
            duration_phrase: non_empty(self.duration_phrase),
            focus: self.focus.and_then(|v| rating("focus", v)),
            quality: self.quality.and_then(|v| rating("quality", v)),
            notes: non_empty(self.notes),
        }
    }
}

/// Parses a raw model response.
///
/// Returns `None` when no JSON object can be found or it does not match the
/// schema; the caller then treats the turn as carrying no new facts.
pub fn parse_extraction(raw: &str) -> Option<ExtractedFields> {
    let payload = json_payload(raw)?;
    match serde_json::from_str::<ExtractedFields>(payload) {
        Ok(fields) => Some(fields),
        Err(e) => {
            tracing::warn!(error = %e, "Could not parse extraction response");
            None
        }
    }
}

fn positive_minutes(value: f64) -> Option<u32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let rounded = value.round();
    (rounded >= 1.0 && rounded <= u32::MAX as f64).then_some(rounded as u32)
}

fn rating(field: &str, value: f64) -> Option<u8> {
    let rounded = value.round();
    if value.is_finite() && (rounded - value).abs() < f64::EPSILON {
        let candidate = rounded as i64;
        if let Ok(r) = u8::try_from(candidate) {
            if RATING_RANGE.contains(&r) {
                return Some(r);
            }
        }
    }
    tracing::warn!(field, value, "Dropping out-of-range rating");
    None
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_response() {
        let raw = r#"{
            "intent": "log_progress",
            "assignment_ref": "RL project",
            "duration_minutes": 90,
            "duration_is_estimate": false,
            "focus": 5,
            "quality": 4,
            "notes": "made good progress"
        }"#;

        let updates = parse_extraction(raw).unwrap().into_updates(None);
        assert_eq!(updates.intent, TurnIntent::Provide);
        assert_eq!(updates.assignment_ref.as_deref(), Some("RL project"));
        assert_eq!(updates.minutes, Some(90));
        assert!(!updates.duration_is_estimate);
        assert_eq!(updates.focus, Some(5));
        assert_eq!(updates.quality, Some(4));
        assert_eq!(updates.notes.as_deref(), Some("made good progress"));
    }

    #[test]
    fn test_lenient_numbers_and_nulls() {
        let raw = r#"{"duration_minutes": "45", "focus": null, "quality": "high", "notes": ""}"#;
        let updates = parse_extraction(raw).unwrap().into_updates(None);
        assert_eq!(updates.minutes, Some(45));
        assert!(updates.focus.is_none());
        assert!(updates.quality.is_none());
        assert!(updates.notes.is_none());
    }

    #[test]
    fn test_invalid_values_are_dropped() {
        let raw = r#"{"duration_minutes": -30, "focus": 7, "quality": 2.5}"#;
        let updates = parse_extraction(raw).unwrap().into_updates(None);
        assert!(updates.minutes.is_none());
        assert!(updates.focus.is_none());
        assert!(updates.quality.is_none());
        assert!(!updates.has_facts());
    }

    #[test]
    fn test_estimate_flag_requires_duration() {
        let raw = r#"{"duration_minutes": 120, "duration_is_estimate": true, "duration_phrase": "a couple of hours"}"#;
        let updates = parse_extraction(raw).unwrap().into_updates(None);
        assert!(updates.duration_is_estimate);
        assert_eq!(updates.duration_phrase.as_deref(), Some("a couple of hours"));

        let raw = r#"{"duration_is_estimate": true}"#;
        let updates = parse_extraction(raw).unwrap().into_updates(None);
        assert!(!updates.duration_is_estimate);
    }

    #[test]
    fn test_keyword_intent_wins_over_model() {
        let raw = r#"{"intent": "log_progress"}"#;
        let updates = parse_extraction(raw)
            .unwrap()
            .into_updates(Some(TurnIntent::Cancel));
        assert_eq!(updates.intent, TurnIntent::Cancel);

        let raw = r#"{"intent": "cancel"}"#;
        let updates = parse_extraction(raw).unwrap().into_updates(None);
        assert_eq!(updates.intent, TurnIntent::Cancel);
    }

    #[test]
    fn test_unparseable_response() {
        assert!(parse_extraction("no idea").is_none());
        assert!(parse_extraction("{not json}").is_none());
    }
}
