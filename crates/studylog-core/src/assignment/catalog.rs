//! Assignment catalog trait.

use async_trait::async_trait;

use super::model::OpenAssignment;
use crate::error::Result;

/// Source of the assignments a user can log progress against.
///
/// The LMS sync that fills this list is outside this workspace; the catalog
/// only answers "what is open for this user right now".
#[async_trait]
pub trait AssignmentCatalog: Send + Sync {
    /// Lists the user's open assignments.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<OpenAssignment>)`: Open assignments (possibly empty)
    /// - `Err(_)`: Error occurred during retrieval
    async fn open_assignments(&self, user_id: &str) -> Result<Vec<OpenAssignment>>;
}
