//! Error types for studylog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the studylog workspace.
///
/// Variants are structured so that the dialogue layer can decide whether a
/// failure is worth re-prompting for (retryable persistence/inference errors)
/// or is a caller mistake.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum StudyLogError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The inference backend failed or timed out.
    #[error("Inference error: {message}")]
    Inference { message: String, is_retryable: bool },

    /// A request violated a precondition (non-positive minutes, no target).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A prior session was handed in by a different user than the caller.
    #[error("Session belongs to user '{owner}', not '{caller}'")]
    SessionOwnerMismatch { owner: String, caller: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyLogError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Inference error
    pub fn inference(message: impl Into<String>, is_retryable: bool) -> Self {
        Self::Inference {
            message: message.into(),
            is_retryable,
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an invalid input error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Whether retrying the same operation later may succeed.
    ///
    /// Storage and IO failures are treated as transient; precondition and
    /// ownership failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io { .. } | Self::DataAccess(_) => true,
            Self::Inference { is_retryable, .. } => *is_retryable,
            _ => false,
        }
    }
}

impl From<std::io::Error> for StudyLogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for StudyLogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for StudyLogError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for StudyLogError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for StudyLogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, StudyLogError>`.
pub type Result<T> = std::result::Result<T, StudyLogError>;
