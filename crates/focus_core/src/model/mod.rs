//! Typed records for the five synchronized collections.

mod goal;
mod idea;
mod project;
mod session;
mod task;

pub use goal::{Goal, GoalType};
pub use idea::{Idea, Priority};
pub use project::Project;
pub use session::TimerSession;
pub use task::Task;

use crate::id::{epoch, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common behaviour of every stored record.
pub trait Record: Clone + Send + Sync + 'static {
    /// Returns the record id.
    fn id(&self) -> &str;

    /// Returns the creation time, if known.
    fn created_at(&self) -> Option<Timestamp>;

    /// Returns the last modification time, if known.
    fn updated_at(&self) -> Option<Timestamp>;

    /// Marks the record as modified at `at`.
    fn touch(&mut self, at: Timestamp);

    /// Timestamp used for last-write-wins: `updated_at`, else `created_at`,
    /// else the epoch.
    fn effective_timestamp(&self) -> Timestamp {
        self.updated_at()
            .or_else(|| self.created_at())
            .unwrap_or_else(epoch)
    }
}

/// The synchronized collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Projects.
    Projects,
    /// Tasks.
    Tasks,
    /// Completed timer sessions.
    Sessions,
    /// Planning goals.
    Goals,
    /// Ideas.
    Ideas,
}

impl Collection {
    /// All collections, in sync order.
    pub const ALL: [Collection; 5] = [
        Collection::Projects,
        Collection::Tasks,
        Collection::Sessions,
        Collection::Goals,
        Collection::Ideas,
    ];

    /// Returns the collection name.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Tasks => "tasks",
            Collection::Sessions => "sessions",
            Collection::Goals => "goals",
            Collection::Ideas => "ideas",
        }
    }

    /// Returns the local storage key.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Collection::Projects => "focus_projects_v1",
            Collection::Tasks => "focus_tasks_v1",
            Collection::Sessions => "focus_sessions_v1",
            Collection::Goals => "focus_goals_v1",
            Collection::Ideas => "focus_ideas_v1",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All five collections of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    /// Projects.
    pub projects: Vec<Project>,
    /// Tasks.
    pub tasks: Vec<Task>,
    /// Completed sessions.
    pub sessions: Vec<TimerSession>,
    /// Goals.
    pub goals: Vec<Goal>,
    /// Ideas.
    pub ideas: Vec<Idea>,
}

impl Collections {
    /// Returns the number of records in `collection`.
    pub fn len_of(&self, collection: Collection) -> usize {
        match collection {
            Collection::Projects => self.projects.len(),
            Collection::Tasks => self.tasks.len(),
            Collection::Sessions => self.sessions.len(),
            Collection::Goals => self.goals.len(),
            Collection::Ideas => self.ideas.len(),
        }
    }

    /// Returns the non-archived projects.
    pub fn active_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| !p.archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn effective_timestamp_prefers_updated() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let updated = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let mut task = Task::new("t-1", "Write", None, created);
        assert_eq!(task.effective_timestamp(), created);

        task.touch(updated);
        assert_eq!(task.effective_timestamp(), updated);
    }

    #[test]
    fn storage_keys_are_distinct() {
        let keys: std::collections::HashSet<_> =
            Collection::ALL.iter().map(|c| c.storage_key()).collect();
        assert_eq!(keys.len(), Collection::ALL.len());
    }
}
