//! Completeness tracking.

use crate::config::DialogueConfig;
use crate::session::{FieldName, KnownFacts};

/// Result of checking which facts are still outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completeness {
    /// Missing required fields if any, otherwise missing optional fields.
    pub missing: Vec<FieldName>,
    /// Only optional fields remain and patience is exhausted.
    pub apply_defaults: bool,
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn required_missing(&self) -> bool {
        self.missing.iter().any(|f| f.is_required())
    }

    pub fn next_field(&self) -> Option<FieldName> {
        self.missing.first().copied()
    }
}

/// Computes outstanding fields from the known facts.
///
/// Pure: the same facts and turn count always give the same answer. The
/// assignment counts as outstanding until an id is set, which covers the
/// case where several candidates are still waiting for a pick.
#[derive(Debug, Clone, Copy)]
pub struct CompletenessTracker {
    patience_threshold: u32,
}

impl CompletenessTracker {
    pub fn new(config: &DialogueConfig) -> Self {
        Self {
            patience_threshold: config.patience_threshold,
        }
    }

    pub fn track(&self, facts: &KnownFacts, turn_count: u32) -> Completeness {
        let required: Vec<FieldName> = FieldName::REQUIRED
            .into_iter()
            .filter(|f| !facts.has(*f))
            .collect();
        if !required.is_empty() {
            return Completeness {
                missing: required,
                apply_defaults: false,
            };
        }

        let optional: Vec<FieldName> = FieldName::OPTIONAL
            .into_iter()
            .filter(|f| !facts.has(*f))
            .collect();
        let apply_defaults = !optional.is_empty() && self.patience_exhausted(turn_count);

        Completeness {
            missing: optional,
            apply_defaults,
        }
    }

    pub fn patience_exhausted(&self, turn_count: u32) -> bool {
        turn_count > self.patience_threshold
    }
}

/// Fills unset optional ratings with the neutral value.
///
/// Returns the fields that were defaulted.
pub fn apply_neutral_defaults(facts: &mut KnownFacts, neutral_rating: u8) -> Vec<FieldName> {
    let mut defaulted = Vec::new();
    if facts.focus.is_none() {
        facts.focus = Some(neutral_rating);
        defaulted.push(FieldName::Focus);
    }
    if facts.quality.is_none() {
        facts.quality = Some(neutral_rating);
        defaulted.push(FieldName::Quality);
    }
    defaulted
}
