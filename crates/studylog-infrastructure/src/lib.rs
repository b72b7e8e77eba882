//! File-backed implementations of the studylog repository traits.

pub mod config_service;
pub mod paths;
pub mod storage;
pub mod toml_assignment_catalog;
pub mod toml_progress_store;
pub mod toml_session_repository;

pub use crate::config_service::ConfigService;
pub use crate::paths::{StorageLayout, StudyLogPaths};
pub use crate::toml_assignment_catalog::{CatalogEntry, TomlAssignmentCatalog};
pub use crate::toml_progress_store::TomlProgressStore;
pub use crate::toml_session_repository::TomlDialogueSessionRepository;
