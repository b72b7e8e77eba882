//! Assistant message text.

use crate::assignment::AssignmentCandidate;
use crate::progress::ProgressSnapshot;
use crate::session::{DialogueSession, FieldName, KnownFacts};

pub fn question_for(field: FieldName, session: &DialogueSession) -> String {
    match field {
        FieldName::Assignment => "Which assignment were you working on?".to_string(),
        FieldName::Duration => match session.assignment_label() {
            Some(label) => format!(
                "How long did you work on {}? (for example \"45 minutes\" or \"1.5 hours\")",
                label
            ),
            None => "How long did you study? (for example \"45 minutes\" or \"1.5 hours\")"
                .to_string(),
        },
        FieldName::Focus => "On a scale of 1 to 5, how focused were you?".to_string(),
        FieldName::Quality => {
            "On a scale of 1 to 5, how would you rate the quality of the session?".to_string()
        }
    }
}

pub fn choose_assignment(candidates: &[AssignmentCandidate]) -> String {
    if let [only] = candidates {
        return format!(
            "Did you mean \"{}\"? Reply 1 to confirm, or tell me which assignment it was.",
            only.display_name
        );
    }

    let mut text = String::from("I found more than one assignment that could match:\n");
    for (i, candidate) in candidates.iter().enumerate() {
        text.push_str(&format!("  {}. {}\n", i + 1, candidate.display_name));
    }
    text.push_str("Which one did you mean? Reply with the number or the name.");
    text
}

pub fn no_match(reference: &str) -> String {
    format!(
        "I couldn't find a matching assignment for \"{}\". Which assignment were you working on?",
        reference
    )
}

pub fn lookup_failed() -> String {
    "I couldn't look up your assignments just now.".to_string()
}

pub fn summary(session: &DialogueSession) -> String {
    let facts = &session.known_facts;
    let mut text = String::from("Here's what I'll log:\n");
    text.push_str(&format!(
        "- Assignment: {}\n",
        session.assignment_label().unwrap_or("unknown")
    ));
    text.push_str(&format!("- Duration: {}\n", duration_label(facts)));
    text.push_str(&format!("- Focus: {}\n", rating_label(facts.focus)));
    text.push_str(&format!("- Quality: {}\n", rating_label(facts.quality)));
    if !facts.notes.is_empty() {
        text.push_str(&format!("- Notes: {}\n", facts.notes));
    }
    text.push_str("Shall I save this? (yes/no)");
    text
}

pub fn defaults_note(defaulted: &[FieldName], neutral_rating: u8) -> String {
    let names: Vec<String> = defaulted.iter().map(|f| f.to_string()).collect();
    format!("I used {}/5 for {} since we skipped it.", neutral_rating, names.join(" and "))
}

pub fn ask_for_correction() -> String {
    "No problem. What should I change?".to_string()
}

pub fn cancelled() -> String {
    "Okay, I won't log anything.".to_string()
}

pub fn committed(session: &DialogueSession, snapshot: Option<&ProgressSnapshot>) -> String {
    let minutes = session.known_facts.minutes.unwrap_or_default();
    let label = session.assignment_label().unwrap_or("your assignment");
    let mut text = format!("Logged {} minutes on {}.", minutes, label);

    if let Some(snapshot) = snapshot {
        text.push_str(&format!(" Total so far: {} hours", format_hours(snapshot.hours_done)));
        match snapshot.hours_remaining {
            Some(remaining) if remaining > 0.0 => {
                text.push_str(&format!("; about {} hours remaining.", format_hours(remaining)))
            }
            Some(_) => text.push_str("; the estimate says you're done."),
            None => text.push('.'),
        }
    }
    text
}

pub fn commit_failed() -> String {
    "I couldn't save your session just now. Your answers are kept; reply \"yes\" to try again."
        .to_string()
}

pub fn format_hours(hours: f64) -> String {
    let rounded = (hours * 100.0).round() / 100.0;
    if (rounded - rounded.trunc()).abs() < f64::EPSILON {
        format!("{:.0}", rounded)
    } else {
        let text = format!("{:.2}", rounded);
        text.trim_end_matches('0').to_string()
    }
}

fn duration_label(facts: &KnownFacts) -> String {
    match facts.minutes {
        Some(m) if facts.duration_estimated => format!("{} minutes (estimated)", m),
        Some(m) => format!("{} minutes", m),
        None => "unknown".to_string(),
    }
}

fn rating_label(rating: Option<u8>) -> String {
    rating
        .map(|r| format!("{}/5", r))
        .unwrap_or_else(|| "not given".to_string())
}
