//! Deterministic parts of assignment resolution.
//!
//! The semantic ranking comes from the inference backend; everything here is
//! pure so that the auto-accept rule and the fallback matcher can be tested
//! without one.

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{AssignmentCandidate, OpenAssignment, Resolution};

static NUMERIC_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:the\s+)?(?:number\s+|option\s+|no\.?\s*|#)?(\d+)(?:st|nd|rd|th)?(?:\s+one)?$")
        .expect("numeric choice pattern is valid")
});

static ORDINAL_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:the\s+)?(first|second|third|fourth|fifth|last)(?:\s+one)?$")
        .expect("ordinal choice pattern is valid")
});

/// Applies the auto-accept rule to a list of matches.
///
/// Matches are ranked by confidence (descending) and de-duplicated by
/// assignment id, keeping the best score. A match is accepted only when it
/// is the single one scoring strictly above `threshold`.
pub fn apply_auto_accept(matches: Vec<AssignmentCandidate>, threshold: f64) -> Resolution {
    let ranked = rank(matches);
    if ranked.is_empty() {
        return Resolution::NoMatch;
    }

    let mut above = ranked.iter().filter(|c| c.confidence > threshold);
    match (above.next(), above.next()) {
        (Some(only), None) => Resolution::Accepted(only.clone()),
        _ => Resolution::Ambiguous(ranked),
    }
}

/// Sorts by confidence and drops duplicate assignment ids.
pub fn rank(matches: Vec<AssignmentCandidate>) -> Vec<AssignmentCandidate> {
    let mut sorted = matches;
    sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut ranked: Vec<AssignmentCandidate> = Vec::with_capacity(sorted.len());
    for candidate in sorted {
        if !ranked
            .iter()
            .any(|kept| kept.assignment_id == candidate.assignment_id)
        {
            ranked.push(candidate);
        }
    }
    ranked
}

/// Case-insensitive containment match in either direction.
///
/// Used when the semantic matcher is unavailable or returns nothing. Every
/// hit gets the same low `confidence` so it can never be auto-accepted on its
/// own merits unless the configured threshold is below it.
pub fn substring_matches(
    reference: &str,
    assignments: &[OpenAssignment],
    confidence: f64,
) -> Vec<AssignmentCandidate> {
    let needle = reference.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    assignments
        .iter()
        .filter(|assignment| {
            let title = assignment.title.trim().to_lowercase();
            !title.is_empty() && (title.contains(&needle) || needle.contains(&title))
        })
        .map(|assignment| AssignmentCandidate::from_assignment(assignment, confidence))
        .collect()
}

/// Interprets a reply as an explicit pick among pending candidates.
///
/// Accepts a 1-based number ("2", "#2", "the 2nd one"), an ordinal word
/// ("first", "the last one") or text naming exactly one candidate title.
/// A reply equal to a title picks it even when that title is part of another.
pub fn choose_candidate<'a>(
    candidates: &'a [AssignmentCandidate],
    reply: &str,
) -> Option<&'a AssignmentCandidate> {
    if candidates.is_empty() {
        return None;
    }

    let normalized = normalize_reply(reply);
    if normalized.is_empty() {
        return None;
    }

    if let Some(caps) = NUMERIC_CHOICE.captures(&normalized) {
        let index: usize = caps[1].parse().ok()?;
        return index.checked_sub(1).and_then(|i| candidates.get(i));
    }

    if let Some(caps) = ORDINAL_CHOICE.captures(&normalized) {
        let index = match &caps[1] {
            "first" => 0,
            "second" => 1,
            "third" => 2,
            "fourth" => 3,
            "fifth" => 4,
            _ => candidates.len() - 1,
        };
        return candidates.get(index);
    }

    if let Some(exact) = candidates
        .iter()
        .find(|candidate| candidate.display_name.trim().to_lowercase() == normalized)
    {
        return Some(exact);
    }

    let mut named = candidates.iter().filter(|candidate| {
        let title = candidate.display_name.to_lowercase();
        normalized.contains(&title) || (normalized.len() >= 3 && title.contains(&normalized))
    });
    match (named.next(), named.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// True when the reply is nothing but a position ("2", "the first one").
///
/// Such a reply carries no other facts, so it needs no extraction.
pub fn is_positional_choice(reply: &str) -> bool {
    let normalized = normalize_reply(reply);
    NUMERIC_CHOICE.is_match(&normalized) || ORDINAL_CHOICE.is_match(&normalized)
}

fn normalize_reply(reply: &str) -> String {
    reply
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, name: &str, confidence: f64) -> AssignmentCandidate {
        AssignmentCandidate {
            assignment_id: id.to_string(),
            display_name: name.to_string(),
            confidence,
            course_id: None,
        }
    }

    #[test]
    fn test_single_match_above_threshold_is_accepted() {
        let resolution = apply_auto_accept(
            vec![candidate("a1", "RL Project", 0.95), candidate("a2", "Essay", 0.2)],
            0.8,
        );
        match resolution {
            Resolution::Accepted(c) => assert_eq!(c.assignment_id, "a1"),
            other => panic!("expected accepted, got {:?}", other),
        }
    }

    #[test]
    fn test_two_matches_above_threshold_are_never_auto_accepted() {
        let resolution = apply_auto_accept(
            vec![candidate("a1", "HW 2", 0.9), candidate("a2", "HW 2b", 0.85)],
            0.8,
        );
        match resolution {
            Resolution::Ambiguous(list) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[0].assignment_id, "a1");
            }
            other => panic!("expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let resolution = apply_auto_accept(vec![candidate("a1", "HW", 0.8)], 0.8);
        assert!(matches!(resolution, Resolution::Ambiguous(ref list) if list.len() == 1));
    }

    #[test]
    fn test_empty_matches_is_no_match() {
        assert_eq!(apply_auto_accept(Vec::new(), 0.8), Resolution::NoMatch);
    }

    #[test]
    fn test_rank_deduplicates_keeping_best_score() {
        let ranked = rank(vec![
            candidate("a1", "HW", 0.3),
            candidate("a2", "Essay", 0.6),
            candidate("a1", "HW", 0.7),
        ]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].assignment_id, "a1");
        assert_eq!(ranked[0].confidence, 0.7);
    }

    #[test]
    fn test_substring_matches_both_directions() {
        let assignments = vec![
            OpenAssignment::new("a1", "RL Project"),
            OpenAssignment::new("a2", "Linear Algebra Problem Set"),
        ];

        let hits = substring_matches("the rl project for CS285", &assignments, 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].assignment_id, "a1");

        let hits = substring_matches("ALGEBRA", &assignments, 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].assignment_id, "a2");
        assert_eq!(hits[0].confidence, 0.5);

        assert!(substring_matches("   ", &assignments, 0.5).is_empty());
    }

    #[test]
    fn test_choose_candidate_by_number_and_ordinal() {
        let candidates = vec![
            candidate("a1", "Assignment 2: Probability", 0.6),
            candidate("a2", "Assignment 2: Statistics", 0.6),
        ];

        assert_eq!(choose_candidate(&candidates, "2").unwrap().assignment_id, "a2");
        assert_eq!(choose_candidate(&candidates, "#1").unwrap().assignment_id, "a1");
        assert_eq!(
            choose_candidate(&candidates, "The first one.").unwrap().assignment_id,
            "a1"
        );
        assert_eq!(choose_candidate(&candidates, "last").unwrap().assignment_id, "a2");
        assert!(choose_candidate(&candidates, "3").is_none());
        assert!(choose_candidate(&candidates, "0").is_none());
    }

    #[test]
    fn test_choose_candidate_by_title() {
        let candidates = vec![
            candidate("a1", "Assignment 2: Probability", 0.6),
            candidate("a2", "Assignment 2: Statistics", 0.6),
        ];

        assert_eq!(
            choose_candidate(&candidates, "statistics").unwrap().assignment_id,
            "a2"
        );
        // Names both candidates, so it is not a pick.
        assert!(choose_candidate(&candidates, "assignment 2").is_none());
        assert!(choose_candidate(&[], "1").is_none());
    }

    #[test]
    fn test_exact_title_wins_over_prefix_title() {
        let candidates = vec![
            candidate("ps1", "Problem Set 1", 0.6),
            candidate("ps10", "Problem Set 10", 0.6),
        ];

        assert_eq!(
            choose_candidate(&candidates, "problem set 10").unwrap().assignment_id,
            "ps10"
        );
        assert_eq!(
            choose_candidate(&candidates, "Problem Set 1.").unwrap().assignment_id,
            "ps1"
        );
    }

    #[test]
    fn test_positional_choice_detection() {
        assert!(is_positional_choice("2"));
        assert!(is_positional_choice("The first one."));
        assert!(is_positional_choice("#1"));
        assert!(!is_positional_choice("statistics"));
        assert!(!is_positional_choice("the second one, for 45 minutes"));
    }
}
