//! Domain layer for studylog.
//!
//! Models, repository traits and the pure conversation logic of the
//! progress-logging pipeline. Nothing here performs I/O on its own.

pub mod assignment;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod inference;
pub mod progress;
pub mod session;

// Re-export common error type
pub use error::{Result, StudyLogError};
