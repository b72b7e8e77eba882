//! Dialogue session repository trait.
//!
//! Defines the interface for keeping an open conversation between turns.

use async_trait::async_trait;

use super::model::DialogueSession;
use crate::error::Result;

/// An abstract repository for the open progress-logging session of a user.
///
/// A user has at most one open session. Terminal sessions are not kept.
#[async_trait]
pub trait DialogueSessionRepository: Send + Sync {
    /// Finds the user's open session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(DialogueSession))`: An open session exists
    /// - `Ok(None)`: No open session
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_open(&self, user_id: &str) -> Result<Option<DialogueSession>>;

    /// Saves the session as the user's open session.
    async fn save(&self, session: &DialogueSession) -> Result<()>;

    /// Removes the user's open session (or does nothing if there is none).
    async fn clear(&self, user_id: &str) -> Result<()>;
}
