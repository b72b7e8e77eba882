//! Assignment domain models.

use serde::{Deserialize, Serialize};

/// An assignment the user can still log time against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAssignment {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    /// Estimate produced by the difficulty assessment pipeline, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
}

impl OpenAssignment {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            course_id: None,
            estimated_hours: None,
        }
    }

    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }
}

/// A possible match for a textual assignment reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentCandidate {
    pub assignment_id: String,
    pub display_name: String,
    /// Match confidence in `[0, 1]`.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
}

impl AssignmentCandidate {
    pub fn from_assignment(assignment: &OpenAssignment, confidence: f64) -> Self {
        Self {
            assignment_id: assignment.id.clone(),
            display_name: assignment.title.clone(),
            confidence: confidence.clamp(0.0, 1.0),
            course_id: assignment.course_id.clone(),
        }
    }
}

/// Outcome of applying the auto-accept rule to a ranked match list.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exactly one match cleared the threshold.
    Accepted(AssignmentCandidate),
    /// The user has to pick; holds every match in rank order.
    Ambiguous(Vec<AssignmentCandidate>),
    /// Nothing matched the reference.
    NoMatch,
}
