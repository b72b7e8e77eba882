//! Prompt templates for the inference backend.
//!
//! Both prompts ask for a single JSON object so that the core parsers
//! (`parse_extraction`, `parse_matches`) can read the answer.

use minijinja::{Environment, UndefinedBehavior, context};
use studylog_core::inference::{ExtractionRequest, MatchRequest};
use studylog_core::{Result, StudyLogError};

const EXTRACTION_SYSTEM: &str = "\
You extract study-session facts from a student's chat message.
Reply with exactly one JSON object and nothing else, using these keys:
  \"intent\": \"log_progress\" | \"cancel\" | \"other\"
  \"assignment_ref\": the assignment as the student named it, or null
  \"duration_minutes\": total minutes studied as a number, or null
  \"duration_is_estimate\": true when the duration came from vague wording
  \"duration_phrase\": the words the duration came from, or null
  \"focus\": integer 1-5 only if the student rated their focus, else null
  \"quality\": integer 1-5 only if the student rated the session quality, else null
  \"notes\": any other detail worth keeping, or null
Rules:
- Convert hours to minutes (\"an hour and a half\" is 90).
- For vague durations (\"all afternoon\", \"a bit\") give your best estimate and set duration_is_estimate to true.
- Never invent a rating the student did not give.
- Use \"cancel\" only when the student wants to stop logging.
- Leave out facts that are already known unless the student changes them.";

const EXTRACTION_USER: &str = "\
Already known:
{{ known_facts }}

Student message:
{{ utterance }}";

const MATCHING_SYSTEM: &str = "\
You match a student's description of an assignment against their open assignments.
Reply with exactly one JSON object and nothing else:
{\"matches\": [{\"assignment_id\": \"...\", \"confidence\": 0.0, \"reason\": \"...\"}]}
Rules:
- Only use ids from the list you are given.
- confidence is between 0 and 1; use more than 0.8 only when the match is unambiguous.
- List every plausible match, best first. Return an empty list when nothing fits.";

const MATCHING_USER: &str = "\
Student's description: {{ reference }}

Open assignments:
{% for a in assignments -%}
- id: {{ a.id }} | title: {{ a.title }}{% if a.course_id is defined %} | course: {{ a.course_id }}{% endif %}
{% endfor %}";

/// A rendered system + user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Renders the extraction and matching prompts.
#[derive(Debug, Clone)]
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl PromptRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }

    pub fn extraction(&self, request: &ExtractionRequest) -> Result<RenderedPrompt> {
        let user = self
            .env
            .render_str(
                EXTRACTION_USER,
                context! {
                    known_facts => request.known_facts,
                    utterance => request.utterance,
                },
            )
            .map_err(template_error)?;

        Ok(RenderedPrompt {
            system: EXTRACTION_SYSTEM.to_string(),
            user,
        })
    }

    pub fn matching(&self, request: &MatchRequest) -> Result<RenderedPrompt> {
        let user = self
            .env
            .render_str(
                MATCHING_USER,
                context! {
                    reference => request.reference,
                    assignments => request.assignments,
                },
            )
            .map_err(template_error)?;

        Ok(RenderedPrompt {
            system: MATCHING_SYSTEM.to_string(),
            user,
        })
    }
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn template_error(err: minijinja::Error) -> StudyLogError {
    StudyLogError::internal(format!("Failed to render prompt: {err}"))
}
