//! Facts gathered during a progress-logging conversation.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::dialogue::TurnIntent;

/// A fact the conversation may still need to ask for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldName {
    Assignment,
    Duration,
    Focus,
    Quality,
}

impl FieldName {
    /// Required fields in the order they are asked for.
    pub const REQUIRED: [FieldName; 2] = [FieldName::Assignment, FieldName::Duration];

    /// Optional fields in the order they are asked for.
    pub const OPTIONAL: [FieldName; 2] = [FieldName::Focus, FieldName::Quality];

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

/// Valid range for focus and quality ratings.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// The facts accepted so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnownFacts {
    /// What the user called the assignment, before resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
    /// The duration came from vague language and has not been confirmed.
    #[serde(default)]
    pub duration_estimated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_block_id: Option<String>,
}

/// Field updates proposed by one user turn.
///
/// Every value here has already been validated: durations are positive and
/// ratings are within [`RATING_RANGE`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedUpdates {
    pub intent: TurnIntent,
    pub assignment_ref: Option<String>,
    pub minutes: Option<u32>,
    pub duration_is_estimate: bool,
    pub duration_phrase: Option<String>,
    pub focus: Option<u8>,
    pub quality: Option<u8>,
    pub notes: Option<String>,
}

impl ProposedUpdates {
    /// An update carrying only an intent signal.
    pub fn intent_only(intent: TurnIntent) -> Self {
        Self {
            intent,
            assignment_ref: None,
            minutes: None,
            duration_is_estimate: false,
            duration_phrase: None,
            focus: None,
            quality: None,
            notes: None,
        }
    }

    pub fn has_facts(&self) -> bool {
        self.assignment_ref.is_some()
            || self.minutes.is_some()
            || self.focus.is_some()
            || self.quality.is_some()
            || self.notes.is_some()
    }
}

/// What changed when updates were merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub changed: bool,
    /// A different assignment was named; any earlier resolution is void.
    pub reference_changed: bool,
}

impl KnownFacts {
    pub fn has(&self, field: FieldName) -> bool {
        match field {
            FieldName::Assignment => self.assignment_id.is_some(),
            FieldName::Duration => self.minutes.is_some_and(|m| m > 0),
            FieldName::Focus => self.focus.is_some(),
            FieldName::Quality => self.quality.is_some(),
        }
    }

    /// Merges proposed updates. A `None` proposal never clears a known fact.
    pub fn merge(&mut self, updates: &ProposedUpdates) -> MergeReport {
        let mut report = MergeReport::default();

        if let Some(reference) = updates.assignment_ref.as_deref().map(str::trim) {
            if !reference.is_empty() && !self.refers_to_current(reference) {
                self.assignment_ref = Some(reference.to_string());
                self.assignment_id = None;
                self.assignment_title = None;
                self.course_id = None;
                report.changed = true;
                report.reference_changed = true;
            }
        }

        if let Some(minutes) = updates.minutes.filter(|m| *m > 0) {
            self.minutes = Some(minutes);
            self.duration_estimated = updates.duration_is_estimate;
            if updates.duration_is_estimate {
                let phrase = updates
                    .duration_phrase
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .unwrap_or("a rough description");
                self.append_note(&format!(
                    "duration estimated as {} min from \"{}\"",
                    minutes, phrase
                ));
            }
            report.changed = true;
        }

        if let Some(focus) = updates.focus.filter(|r| RATING_RANGE.contains(r)) {
            self.focus = Some(focus);
            report.changed = true;
        }

        if let Some(quality) = updates.quality.filter(|r| RATING_RANGE.contains(r)) {
            self.quality = Some(quality);
            report.changed = true;
        }

        if let Some(notes) = updates.notes.as_deref() {
            if self.append_note(notes) {
                report.changed = true;
            }
        }

        report
    }

    /// Appends a note unless it is empty or already present.
    pub fn append_note(&mut self, note: &str) -> bool {
        let note = note.trim();
        if note.is_empty() || self.notes.contains(note) {
            return false;
        }
        if !self.notes.is_empty() {
            self.notes.push_str("; ");
        }
        self.notes.push_str(note);
        true
    }

    /// Short summary handed to the inference backend so it does not re-ask.
    pub fn context_summary(&self) -> String {
        let mut parts = Vec::new();

        match (&self.assignment_title, &self.assignment_ref) {
            (Some(title), _) => parts.push(format!("assignment: {} (resolved)", title)),
            (None, Some(reference)) => parts.push(format!("assignment: \"{}\" (unresolved)", reference)),
            (None, None) => parts.push("assignment: unknown".to_string()),
        }
        match self.minutes {
            Some(m) if self.duration_estimated => parts.push(format!("duration: {} min (estimate)", m)),
            Some(m) => parts.push(format!("duration: {} min", m)),
            None => parts.push("duration: unknown".to_string()),
        }
        parts.push(match self.focus {
            Some(f) => format!("focus: {}/5", f),
            None => "focus: unknown".to_string(),
        });
        parts.push(match self.quality {
            Some(q) => format!("quality: {}/5", q),
            None => "quality: unknown".to_string(),
        });
        if !self.notes.is_empty() {
            parts.push(format!("notes: {}", self.notes));
        }

        parts.join("; ")
    }

    fn refers_to_current(&self, reference: &str) -> bool {
        let reference = reference.to_lowercase();
        let same_ref = self
            .assignment_ref
            .as_deref()
            .is_some_and(|r| r.to_lowercase() == reference);
        let same_title = self
            .assignment_title
            .as_deref()
            .is_some_and(|t| t.to_lowercase() == reference);
        same_ref || same_title
    }
}
