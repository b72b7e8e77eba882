//! Path management for studylog files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/studylog/          # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/studylog/     # Data directory (or [storage].data_dir)
//! ├── assignments.toml         # Open assignments per user
//! ├── study_blocks.toml        # Scheduled study blocks
//! ├── progress/
//! │   └── <user>.toml          # Study records + assignment aggregates
//! └── sessions/
//!     └── <user>.toml          # Open dialogue session
//! ```

use std::path::{Path, PathBuf};
use studylog_core::StudyLogError;
use studylog_core::config::AppConfig;
use thiserror::Error;

const APP_DIR: &str = "studylog";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// The platform config directory could not be determined.
    #[error("Cannot find the platform config directory")]
    ConfigDirNotFound,
    /// The platform data directory could not be determined.
    #[error("Cannot find the platform data directory")]
    DataDirNotFound,
}

impl From<PathError> for StudyLogError {
    fn from(err: PathError) -> Self {
        StudyLogError::config(err.to_string())
    }
}

/// Platform directories for studylog.
pub struct StudyLogPaths;

impl StudyLogPaths {
    /// Returns the studylog configuration directory (e.g. `~/.config/studylog/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the default data directory (e.g. `~/.local/share/studylog/`).
    pub fn default_data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::DataDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Resolves the data directory for a loaded configuration.
    ///
    /// `[storage].data_dir` wins over the platform default.
    pub fn data_dir(config: &AppConfig) -> Result<PathBuf, PathError> {
        match &config.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_dir(),
        }
    }
}

/// File layout below a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assignments_file(&self) -> PathBuf {
        self.root.join("assignments.toml")
    }

    pub fn study_blocks_file(&self) -> PathBuf {
        self.root.join("study_blocks.toml")
    }

    pub fn progress_file(&self, user_id: &str) -> PathBuf {
        self.root
            .join("progress")
            .join(format!("{}.toml", file_stem(user_id)))
    }

    pub fn session_file(&self, user_id: &str) -> PathBuf {
        self.root
            .join("sessions")
            .join(format!("{}.toml", file_stem(user_id)))
    }
}

/// Encodes a user id into a file-name-safe stem.
///
/// ASCII letters, digits, `-` and `_` pass through; every other byte becomes
/// `%XX`, so distinct ids never share a file.
fn file_stem(user_id: &str) -> String {
    let mut stem = String::with_capacity(user_id.len());
    for byte in user_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

/// Rejects ids that cannot name a file or a record owner.
pub(crate) fn require_user_id(user_id: &str) -> Result<(), StudyLogError> {
    if user_id.trim().is_empty() {
        return Err(StudyLogError::invalid_input("user id must not be empty"));
    }
    Ok(())
}
