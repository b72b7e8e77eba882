//! The per-turn decision function.
//!
//! `decide` looks only at typed session fields and the turn's intent; it
//! never touches the inference backend or storage. The orchestrator merges
//! extracted facts first (dropping `awaiting_confirmation` on a correction)
//! and then asks `decide` what to do.

use super::completeness::CompletenessTracker;
use super::gate::ConfirmationGate;
use super::intent::TurnIntent;
use crate::config::DialogueConfig;
use crate::session::{DialogueSession, FieldName};

/// What the orchestrator should do with this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// End the conversation without persisting anything.
    Cancel,
    /// Persist the known facts.
    Commit,
    /// The summary was rejected without a correction; ask what to change.
    AskForCorrection,
    /// Ask one targeted question for this field.
    AskFor(FieldName),
    /// Several (or one low-confidence) candidates wait for a pick.
    ChooseAssignment,
    /// The last reference matched nothing; say so and ask again.
    ReportNoMatch,
    /// Default the optional ratings, then commit or confirm.
    ApplyDefaults { then_confirm: bool },
    /// Show the summary and wait for a yes/no.
    RequestConfirmation,
}

pub fn decide(session: &DialogueSession, intent: TurnIntent, config: &DialogueConfig) -> Decision {
    if intent == TurnIntent::Cancel {
        return Decision::Cancel;
    }

    if session.awaiting_confirmation {
        match intent {
            TurnIntent::Accept => return Decision::Commit,
            TurnIntent::Reject => return Decision::AskForCorrection,
            _ => {}
        }
    }

    let gate = ConfirmationGate;
    let completeness = CompletenessTracker::new(config).track(&session.known_facts, session.turn_count);

    match completeness.next_field() {
        Some(FieldName::Assignment) => {
            if !session.assignment_candidates.is_empty() {
                Decision::ChooseAssignment
            } else if session.unmatched_reference.is_some() {
                Decision::ReportNoMatch
            } else {
                Decision::AskFor(FieldName::Assignment)
            }
        }
        Some(field) if field.is_required() => Decision::AskFor(field),
        Some(_) if completeness.apply_defaults => Decision::ApplyDefaults {
            then_confirm: gate.requires_confirmation(&session.known_facts, true),
        },
        Some(field) => Decision::AskFor(field),
        None => {
            if gate.requires_confirmation(&session.known_facts, false) {
                Decision::RequestConfirmation
            } else {
                Decision::Commit
            }
        }
    }
}
