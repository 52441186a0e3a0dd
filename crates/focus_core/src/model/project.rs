use super::Record;
use crate::id::Timestamp;
use serde::{Deserialize, Serialize};

/// A project groups tasks and sessions and carries a daily session goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Record id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display color, e.g. `#f97316`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Daily goal in work sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<u32>,
    /// Soft-deleted flag.
    #[serde(default)]
    pub archived: bool,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Project {
    /// Id of the project created when a workspace has none.
    pub const DEFAULT_ID: &'static str = "general";

    /// Creates an active project.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        goal: Option<u32>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: None,
            goal,
            archived: false,
            created_at,
            updated_at: None,
        }
    }

    /// Creates the fallback "General" project.
    pub fn general(created_at: Timestamp) -> Self {
        Self::new(Self::DEFAULT_ID, "General", Some(4), created_at)
    }
}

impl Record for Project {
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
