//! Configuration types.
//!
//! The on-disk representation is `config.toml` with one table per concern:
//!
//! ```toml
//! [dialogue]
//! patience_threshold = 3
//! auto_accept_confidence = 0.8
//!
//! [inference]
//! model = "claude-sonnet-4-20250514"
//!
//! [storage]
//! data_dir = "/home/me/.local/share/studylog"
//! ```
//!
//! Every field has a default so a missing or partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, StudyLogError};

pub const DEFAULT_PATIENCE_THRESHOLD: u32 = 3;
pub const DEFAULT_AUTO_ACCEPT_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_NEUTRAL_RATING: u8 = 3;

/// Tunables for the progress-logging conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Optional ratings are defaulted once `turn_count` exceeds this value.
    pub patience_threshold: u32,
    /// A single match must score strictly above this to be auto-accepted.
    pub auto_accept_confidence: f64,
    /// Score given to substring matches when semantic matching is unavailable.
    pub fallback_confidence: f64,
    /// Value used for focus/quality when they are defaulted.
    pub neutral_rating: u8,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            patience_threshold: DEFAULT_PATIENCE_THRESHOLD,
            auto_accept_confidence: DEFAULT_AUTO_ACCEPT_CONFIDENCE,
            fallback_confidence: DEFAULT_FALLBACK_CONFIDENCE,
            neutral_rating: DEFAULT_NEUTRAL_RATING,
        }
    }
}

impl DialogueConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.auto_accept_confidence > 0.0 && self.auto_accept_confidence <= 1.0) {
            return Err(StudyLogError::config(format!(
                "dialogue.auto_accept_confidence must be in (0, 1], got {}",
                self.auto_accept_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.fallback_confidence) {
            return Err(StudyLogError::config(format!(
                "dialogue.fallback_confidence must be in [0, 1], got {}",
                self.fallback_confidence
            )));
        }
        if !(1..=5).contains(&self.neutral_rating) {
            return Err(StudyLogError::config(format!(
                "dialogue.neutral_rating must be between 1 and 5, got {}",
                self.neutral_rating
            )));
        }
        Ok(())
    }
}

/// Settings for the HTTP inference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub base_url: String,
    /// Inline API key. `ANTHROPIC_API_KEY` takes precedence when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            timeout_secs: 30,
            base_url: "https://api.anthropic.com/v1/messages".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dialogue: DialogueConfig,
    pub inference: InferenceConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.dialogue.validate()?;
        if self.inference.timeout_secs == 0 {
            return Err(StudyLogError::config("inference.timeout_secs must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[dialogue]\npatience_threshold = 5\n").unwrap();
        assert_eq!(config.dialogue.patience_threshold, 5);
        assert_eq!(config.dialogue.auto_accept_confidence, 0.8);
        assert_eq!(config.dialogue.neutral_rating, 3);
        assert_eq!(config.inference.timeout_secs, 30);
        assert!(config.storage.data_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = AppConfig::default();
        config.dialogue.neutral_rating = 7;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.dialogue.auto_accept_confidence = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.inference.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
