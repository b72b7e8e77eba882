//! Dialogue logic module.
//!
//! Everything in here is deterministic: given the same session and intent it
//! produces the same decision and the same text.
//!
//! # Module Structure
//!
//! - `intent`: Keyword detection for cancel / accept / reject
//! - `completeness`: Outstanding fields and the bounded-patience rule
//! - `gate`: Whether a summary has to be accepted before committing
//! - `decision`: The per-turn decision function
//! - `messages`: Assistant message text

pub mod completeness;
mod decision;
mod gate;
mod intent;
pub mod messages;

pub use completeness::{Completeness, CompletenessTracker, apply_neutral_defaults};
pub use decision::{Decision, decide};
pub use gate::ConfirmationGate;
pub use intent::{TurnIntent, detect_keyword_intent};
