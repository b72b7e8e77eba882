//! Configuration service implementation.
//!
//! Loads `AppConfig` from `config.toml` (by default
//! `~/.config/studylog/config.toml`), applies environment overrides and
//! validates the result.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use studylog_core::config::AppConfig;
use studylog_core::{Result, StudyLogError};

use crate::paths::StudyLogPaths;
use crate::storage::AtomicTomlFile;

/// Overrides `[inference].api_key`.
pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
/// Overrides `[inference].model`.
pub const ENV_MODEL: &str = "STUDYLOG_MODEL";
/// Overrides `[storage].data_dir`.
pub const ENV_DATA_DIR: &str = "STUDYLOG_DATA_DIR";

/// Configuration service that loads and caches the application configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the platform default config file.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(StudyLogPaths::config_file()?))
    }

    /// Creates a service reading a specific file (for tests and `--config`).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the configuration, loading it on first access.
    pub fn get_config(&self) -> Result<AppConfig> {
        {
            let cached = self
                .config
                .read()
                .map_err(|_| StudyLogError::internal("config cache lock poisoned"))?;
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = self.load()?;

        let mut cached = self
            .config
            .write()
            .map_err(|_| StudyLogError::internal("config cache lock poisoned"))?;
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut cached) = self.config.write() {
            *cached = None;
        }
    }

    /// Reads the file, applies process environment overrides and validates.
    ///
    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<AppConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit environment lookup.
    pub fn load_with_env<F>(&self, env: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = AtomicTomlFile::<AppConfig>::new(&self.path);
        let mut config = match file.load()? {
            Some(config) => {
                tracing::debug!(path = %self.path.display(), "Loaded configuration");
                config
            }
            None => {
                tracing::debug!(path = %self.path.display(), "No configuration file, using defaults");
                AppConfig::default()
            }
        };

        apply_env_overrides(&mut config, env);
        config.validate()?;
        Ok(config)
    }

    /// Writes the default configuration if no file exists yet.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: A new file was written
    /// - `Ok(false)`: A file already existed and was left alone
    pub fn ensure_config_file(&self) -> Result<bool> {
        let file = AtomicTomlFile::<AppConfig>::new(&self.path);
        if file.load()?.is_some() {
            return Ok(false);
        }
        file.save(&AppConfig::default())?;
        tracing::info!(path = %self.path.display(), "Wrote default configuration");
        Ok(true)
    }
}

/// Applies `ANTHROPIC_API_KEY`, `STUDYLOG_MODEL` and `STUDYLOG_DATA_DIR`.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    if let Some(key) = lookup(ENV_API_KEY) {
        config.inference.api_key = Some(key);
    }
    if let Some(model) = lookup(ENV_MODEL) {
        config.inference.model = model;
    }
    if let Some(dir) = lookup(ENV_DATA_DIR) {
        config.storage.data_dir = Some(PathBuf::from(dir));
    }
}
