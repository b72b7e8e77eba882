//! TOML-based AssignmentCatalog implementation.
//!
//! The catalog file is maintained by the course-sync side of the system;
//! this crate only reads it, plus an `upsert` used for seeding.
//!
//! ```toml
//! [[assignments]]
//! id = "a1"
//! title = "RL Project"
//! course_id = "cs285"
//! estimated_hours = 4.0
//! user_id = "alice"        # omit to share with every user
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use studylog_core::Result;
use studylog_core::assignment::{AssignmentCatalog, OpenAssignment};

use crate::paths::{StorageLayout, require_user_id};
use crate::storage::AtomicTomlFile;

/// One row of `assignments.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub assignment: OpenAssignment,
    /// Owner of the assignment; `None` makes it visible to every user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Submitted or archived assignments are no longer offered.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub closed: bool,
}

impl CatalogEntry {
    pub fn for_user(assignment: OpenAssignment, user_id: impl Into<String>) -> Self {
        Self {
            assignment,
            user_id: Some(user_id.into()),
            closed: false,
        }
    }

    fn is_open_for(&self, user_id: &str) -> bool {
        !self.closed && self.user_id.as_deref().is_none_or(|owner| owner == user_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    assignments: Vec<CatalogEntry>,
}

/// Reads open assignments from `assignments.toml` in the data directory.
#[derive(Debug, Clone)]
pub struct TomlAssignmentCatalog {
    file: AtomicTomlFile<CatalogDocument>,
}

impl TomlAssignmentCatalog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let layout = StorageLayout::new(data_dir);
        Self {
            file: AtomicTomlFile::new(layout.assignments_file()),
        }
    }

    /// Inserts or replaces an entry (matched by assignment id and owner).
    pub fn upsert(&self, entry: CatalogEntry) -> Result<()> {
        self.file.update(CatalogDocument::default(), move |doc| {
            match doc.assignments.iter_mut().find(|e| {
                e.assignment.id == entry.assignment.id && e.user_id == entry.user_id
            }) {
                Some(existing) => *existing = entry,
                None => doc.assignments.push(entry),
            }
        })?;
        Ok(())
    }
}

#[async_trait]
impl AssignmentCatalog for TomlAssignmentCatalog {
    async fn open_assignments(&self, user_id: &str) -> Result<Vec<OpenAssignment>> {
        require_user_id(user_id)?;
        let doc = self.file.load_or_default()?;
        Ok(doc
            .assignments
            .into_iter()
            .filter(|entry| entry.is_open_for(user_id))
            .map(|entry| entry.assignment)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_filters_by_owner_and_closed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("assignments.toml"),
            r#"
[[assignments]]
id = "a1"
title = "RL Project"
course_id = "cs285"
estimated_hours = 4.0
user_id = "alice"

[[assignments]]
id = "a2"
title = "Shared Reading"

[[assignments]]
id = "a3"
title = "Old Essay"
user_id = "alice"
closed = true

[[assignments]]
id = "a4"
title = "Bob's Lab"
user_id = "bob"
"#,
        )
        .unwrap();

        let catalog = TomlAssignmentCatalog::new(temp_dir.path());
        let ids: Vec<String> = catalog
            .open_assignments("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["a1", "a2"]);

        let alice = catalog.open_assignments("alice").await.unwrap();
        assert_eq!(alice[0].estimated_hours, Some(4.0));
        assert_eq!(alice[0].course_id.as_deref(), Some("cs285"));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = TomlAssignmentCatalog::new(temp_dir.path());
        assert!(catalog.open_assignments("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = TomlAssignmentCatalog::new(temp_dir.path());

        catalog
            .upsert(CatalogEntry::for_user(OpenAssignment::new("a1", "Draft"), "alice"))
            .unwrap();
        catalog
            .upsert(CatalogEntry::for_user(
                OpenAssignment::new("a1", "Final Essay").with_course("eng101"),
                "alice",
            ))
            .unwrap();

        let open = catalog.open_assignments("alice").await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "Final Essay");
    }
}
