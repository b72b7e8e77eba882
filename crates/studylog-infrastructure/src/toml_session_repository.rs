//! TOML-based DialogueSessionRepository implementation.

use async_trait::async_trait;
use std::path::PathBuf;
use studylog_core::Result;
use studylog_core::session::{DialogueSession, DialogueSessionRepository};

use crate::paths::{StorageLayout, require_user_id};
use crate::storage::AtomicTomlFile;

/// Keeps each user's open conversation in `sessions/<user>.toml`.
///
/// Saving a terminal session removes the file instead, so `find_open` only
/// ever returns a conversation that can still take a turn.
#[derive(Debug, Clone)]
pub struct TomlDialogueSessionRepository {
    layout: StorageLayout,
}

impl TomlDialogueSessionRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: StorageLayout::new(data_dir),
        }
    }

    fn session_file(&self, user_id: &str) -> Result<AtomicTomlFile<DialogueSession>> {
        require_user_id(user_id)?;
        Ok(AtomicTomlFile::new(self.layout.session_file(user_id)))
    }
}

#[async_trait]
impl DialogueSessionRepository for TomlDialogueSessionRepository {
    async fn find_open(&self, user_id: &str) -> Result<Option<DialogueSession>> {
        let session = match self.session_file(user_id)?.load()? {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.user_id != user_id || session.is_terminal() {
            tracing::warn!(
                user_id = %user_id,
                session_id = %session.id,
                "Ignoring stale session file"
            );
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn save(&self, session: &DialogueSession) -> Result<()> {
        let file = self.session_file(&session.user_id)?;
        if session.is_terminal() {
            file.remove()?;
            tracing::debug!(session_id = %session.id, phase = %session.phase(), "Closed session");
        } else {
            file.save(session)?;
        }
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.session_file(user_id)?.remove()?;
        Ok(())
    }
}
