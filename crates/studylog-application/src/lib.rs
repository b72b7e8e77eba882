//! Application layer for studylog.
//!
//! This crate wires the pure dialogue logic in `studylog-core` to the
//! inference backend, the assignment catalog and the progress store. The
//! orchestrator is the per-turn entry point; the use case adds session
//! persistence on top of it.

pub mod assignment_resolver;
pub mod conversation_usecase;
pub mod dialogue_orchestrator;
pub mod field_extractor;
pub mod keyed_lock;
pub mod progress_recorder;

#[cfg(test)]
mod test_support;

pub use assignment_resolver::AssignmentResolver;
pub use conversation_usecase::ConversationUseCase;
pub use dialogue_orchestrator::{CommittedRecord, DialogueOrchestrator, TurnOutcome};
pub use field_extractor::FieldExtractor;
pub use keyed_lock::KeyedLock;
pub use progress_recorder::{ProgressRecorder, RecordOutcome, RecordRequest};
