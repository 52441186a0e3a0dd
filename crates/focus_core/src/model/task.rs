use super::Record;
use crate::id::Timestamp;
use serde::{Deserialize, Serialize};

/// A to-do item, optionally attached to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Record id.
    pub id: String,
    /// Task text.
    pub title: String,
    /// Completion flag.
    #[serde(default)]
    pub done: bool,
    /// Soft-deleted flag.
    #[serde(default)]
    pub archived: bool,
    /// Owning project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Task {
    /// Creates an open task.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        project_id: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            done: false,
            archived: false,
            project_id,
            created_at,
            updated_at: None,
        }
    }
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Option<Timestamp> {
        Some(self.created_at)
    }

    fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = Some(at);
    }
}
