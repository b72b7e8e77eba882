//! Keyword intent detection.
//!
//! Runs on every utterance independently of the inference backend, so a
//! user can always cancel or confirm even when extraction fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What the user is doing with this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnIntent {
    /// Supplying or correcting facts.
    Provide,
    /// Accepting the summary.
    Accept,
    /// Rejecting the summary without saying what is wrong.
    Reject,
    /// Abandoning the log.
    Cancel,
}

static CANCEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:cancel|never\s*mind|nvm|forget\s+(?:it|about\s+it)|abort|don'?t\s+(?:log|save|record)|stop\s+logging)\b",
    )
    .expect("cancel pattern is valid")
});

static ACCEPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:yes|yep|yeah|yup|y|sure|ok|okay|correct|confirm(?:ed)?|looks\s+(?:good|right)|sounds\s+good|that'?s\s+(?:right|correct)|save\s+it|log\s+it|go\s+ahead|do\s+it)(?:[\s,]+(?:please|thanks|thank\s+you))?$",
    )
    .expect("accept pattern is valid")
});

static REJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:no|nope|nah|n|not\s+quite|that'?s\s+(?:wrong|not\s+right)|wrong)$")
        .expect("reject pattern is valid")
});

/// Detects cancel/accept/reject keywords.
///
/// Cancellation matches anywhere in the utterance. Acceptance and rejection
/// must be the whole reply ("yes", "ok thanks"), so that "no, it was an hour"
/// is read as a correction rather than a bare rejection.
pub fn detect_keyword_intent(utterance: &str) -> Option<TurnIntent> {
    if CANCEL.is_match(utterance) {
        return Some(TurnIntent::Cancel);
    }

    let normalized = normalize(utterance);
    if ACCEPT.is_match(&normalized) {
        Some(TurnIntent::Accept)
    } else if REJECT.is_match(&normalized) {
        Some(TurnIntent::Reject)
    } else {
        None
    }
}

fn normalize(utterance: &str) -> String {
    let lowered = utterance.trim().to_lowercase().replace('\u{2019}', "'");
    lowered
        .trim_end_matches(|c: char| c == '.' || c == '!' || c == '?' || c.is_whitespace())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
