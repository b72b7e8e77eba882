//! Session domain module.
//!
//! This module contains the conversation state that travels between turns.
//!
//! # Module Structure
//!
//! - `facts`: Known facts, field names and the merge rule
//! - `model`: The `DialogueSession` value and its phases
//! - `repository`: Repository trait for keeping an open session

mod facts;
mod model;
mod repository;

pub use facts::{FieldName, KnownFacts, MergeReport, ProposedUpdates, RATING_RANGE};
pub use model::{DialogueSession, SessionPhase};
pub use repository::DialogueSessionRepository;
