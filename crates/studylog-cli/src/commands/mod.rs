pub mod chat;
pub mod config;
pub mod report;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use studylog_application::{ConversationUseCase, DialogueOrchestrator};
use studylog_core::config::AppConfig;
use studylog_infrastructure::{
    ConfigService, StudyLogPaths, TomlAssignmentCatalog, TomlDialogueSessionRepository,
    TomlProgressStore,
};
use studylog_interaction::ClaudeInferenceService;

/// Loaded configuration plus the file-backed stores it points at.
pub struct AppContext {
    pub config_service: ConfigService,
    pub config: AppConfig,
    pub data_dir: PathBuf,
}

impl AppContext {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new().context("Failed to locate the config directory")?,
        };
        let config = config_service
            .get_config()
            .with_context(|| format!("Failed to load {}", config_service.path().display()))?;
        let data_dir = StudyLogPaths::data_dir(&config)?;
        tracing::debug!(data_dir = %data_dir.display(), "Using data directory");

        Ok(Self {
            config_service,
            config,
            data_dir,
        })
    }

    pub fn progress_store(&self) -> Arc<TomlProgressStore> {
        Arc::new(TomlProgressStore::new(&self.data_dir))
    }

    pub fn catalog(&self) -> Arc<TomlAssignmentCatalog> {
        Arc::new(TomlAssignmentCatalog::new(&self.data_dir))
    }

    /// Builds the conversation stack. Needs an API key, unlike the listings.
    pub fn conversation(&self) -> Result<ConversationUseCase> {
        let inference = ClaudeInferenceService::from_config(&self.config.inference).context(
            "The chat needs an API key: set ANTHROPIC_API_KEY or [inference].api_key",
        )?;
        let catalog = self.catalog();
        let store = self.progress_store();

        let orchestrator = Arc::new(DialogueOrchestrator::new(
            Arc::new(inference),
            catalog.clone(),
            store.clone(),
            self.config.dialogue.clone(),
        ));

        Ok(ConversationUseCase::new(
            orchestrator,
            Arc::new(TomlDialogueSessionRepository::new(&self.data_dir)),
            catalog,
            store,
        ))
    }
}
