//! Assignment domain module.
//!
//! # Module Structure
//!
//! - `model`: Open assignments, candidates and resolution outcomes
//! - `catalog`: Trait for listing a user's open assignments
//! - `selection`: Auto-accept rule, substring fallback, explicit picks

mod catalog;
mod model;
pub mod selection;

pub use catalog::AssignmentCatalog;
pub use model::{AssignmentCandidate, OpenAssignment, Resolution};
