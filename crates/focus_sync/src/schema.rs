//! Translation between local records and remote rows.
//!
//! Remote rows use snake_case columns, carry the owning `user_id` and store
//! timestamps as strings. Translation is lossless for every field both sides
//! know about; defaults are filled where the remote schema requires a value.

use crate::config::SyncConfig;
use focus_core::{
    epoch, format_timestamp, parse_timestamp, Collection, Goal, GoalType, Idea, Priority, Project,
    Record, Task, Timestamp, TimerSession,
};
use focus_timer::TimerMode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record type that has a remote row representation.
pub trait RemoteRecord: Record {
    /// Remote row type.
    type Row: Serialize + DeserializeOwned;

    /// Collection the record belongs to.
    const COLLECTION: Collection;

    /// Builds the remote row owned by `user_id`. Missing `updated_at`
    /// becomes `now`.
    fn to_row(&self, user_id: &str, config: &SyncConfig, now: Timestamp) -> Self::Row;

    /// Rebuilds a record from a remote row. Returns `None` for rows without
    /// an id.
    fn from_row(row: Self::Row, config: &SyncConfig) -> Option<Self>;
}

fn ts(value: &Option<String>) -> Option<Timestamp> {
    value.as_deref().and_then(parse_timestamp)
}

fn fmt(value: Timestamp) -> String {
    format_timestamp(&value)
}

fn id_of(id: String) -> Option<String> {
    if id.trim().is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Row of the projects table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    /// Record id.
    pub id: String,
    /// Owning user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Name.
    #[serde(default)]
    pub name: Option<String>,
    /// Color.
    #[serde(default)]
    pub color: Option<String>,
    /// Daily goal.
    #[serde(default)]
    pub daily_goal: Option<u32>,
    /// Archived flag.
    #[serde(default)]
    pub is_archived: Option<bool>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Modification time.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteRecord for Project {
    type Row = ProjectRow;
    const COLLECTION: Collection = Collection::Projects;

    fn to_row(&self, user_id: &str, config: &SyncConfig, now: Timestamp) -> ProjectRow {
        ProjectRow {
            id: self.id.clone(),
            user_id: Some(user_id.to_string()),
            name: Some(self.name.clone()),
            color: Some(
                self.color
                    .clone()
                    .unwrap_or_else(|| config.default_project_color.clone()),
            ),
            daily_goal: Some(self.goal.unwrap_or(config.default_daily_goal)),
            is_archived: Some(self.archived),
            created_at: Some(fmt(self.created_at)),
            updated_at: Some(fmt(self.updated_at.unwrap_or(now))),
        }
    }

    fn from_row(row: ProjectRow, config: &SyncConfig) -> Option<Self> {
        Some(Project {
            id: id_of(row.id)?,
            name: row.name.unwrap_or_default(),
            color: row.color,
            goal: Some(row.daily_goal.unwrap_or(config.default_daily_goal)),
            archived: row.is_archived.unwrap_or(false),
            created_at: ts(&row.created_at).unwrap_or_else(epoch),
            updated_at: ts(&row.updated_at),
        })
    }
}

/// Row of the tasks table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    /// Record id.
    pub id: String,
    /// Owning user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Owning project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Done flag.
    #[serde(default)]
    pub is_completed: Option<bool>,
    /// Archived flag.
    #[serde(default)]
    pub is_archived: Option<bool>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Modification time.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteRecord for Task {
    type Row = TaskRow;
    const COLLECTION: Collection = Collection::Tasks;

    fn to_row(&self, user_id: &str, _config: &SyncConfig, now: Timestamp) -> TaskRow {
        TaskRow {
            id: self.id.clone(),
            user_id: Some(user_id.to_string()),
            project_id: self.project_id.clone(),
            title: Some(self.title.clone()),
            is_completed: Some(self.done),
            is_archived: Some(self.archived),
            created_at: Some(fmt(self.created_at)),
            updated_at: Some(fmt(self.updated_at.unwrap_or(now))),
        }
    }

    fn from_row(row: TaskRow, _config: &SyncConfig) -> Option<Self> {
        Some(Task {
            id: id_of(row.id)?,
            title: row.title.unwrap_or_default(),
            done: row.is_completed.unwrap_or(false),
            archived: row.is_archived.unwrap_or(false),
            project_id: row.project_id,
            created_at: ts(&row.created_at).unwrap_or_else(epoch),
            updated_at: ts(&row.updated_at),
        })
    }
}

/// Row of the sessions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    /// Record id.
    pub id: String,
    /// Owning user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Task.
    #[serde(default)]
    pub task_id: Option<String>,
    /// Duration rounded to minutes.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Timer mode (`work`, `short`, `long`).
    #[serde(default)]
    pub session_type: Option<String>,
    /// Completion time.
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Modification time.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteRecord for TimerSession {
    type Row = SessionRow;
    const COLLECTION: Collection = Collection::Sessions;

    fn to_row(&self, user_id: &str, _config: &SyncConfig, _now: Timestamp) -> SessionRow {
        SessionRow {
            id: self.id.clone(),
            user_id: Some(user_id.to_string()),
            project_id: self.project_id.clone(),
            task_id: self.task_id.clone(),
            duration_minutes: Some(self.duration_minutes()),
            session_type: Some(self.mode.as_str().to_string()),
            completed_at: Some(fmt(self.completed_at)),
            created_at: Some(fmt(self.created_at)),
            updated_at: Some(fmt(self.updated_at.unwrap_or(self.completed_at))),
        }
    }

    fn from_row(row: SessionRow, _config: &SyncConfig) -> Option<Self> {
        let completed = ts(&row.completed_at);
        let created = ts(&row.created_at).or(completed);
        Some(TimerSession {
            id: id_of(row.id)?,
            mode: row
                .session_type
                .as_deref()
                .and_then(|m| m.parse::<TimerMode>().ok())
                .unwrap_or(TimerMode::Work),
            duration_seconds: row.duration_minutes.unwrap_or(0).saturating_mul(60),
            completed_at: completed.or(created).unwrap_or_else(epoch),
            created_at: created.unwrap_or_else(epoch),
            updated_at: ts(&row.updated_at).or(completed),
            project_id: row.project_id,
            task_id: row.task_id,
        })
    }
}

/// Row of the goals table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRow {
    /// Record id.
    pub id: String,
    /// Owning user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// `daily`, `weekly` or `long_term`.
    #[serde(default)]
    pub goal_type: Option<String>,
    /// Target session count.
    #[serde(default)]
    pub target_pomodoros: Option<u32>,
    /// Deadline.
    #[serde(default)]
    pub deadline: Option<String>,
    /// Completed flag.
    #[serde(default)]
    pub is_completed: Option<bool>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Modification time.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteRecord for Goal {
    type Row = GoalRow;
    const COLLECTION: Collection = Collection::Goals;

    fn to_row(&self, user_id: &str, _config: &SyncConfig, now: Timestamp) -> GoalRow {
        GoalRow {
            id: self.id.clone(),
            user_id: Some(user_id.to_string()),
            project_id: self.project_id.clone(),
            title: Some(self.title.clone()),
            description: self.description.clone(),
            goal_type: Some(self.goal_type.as_str().to_string()),
            target_pomodoros: self.target,
            deadline: self.deadline.map(fmt),
            is_completed: Some(self.completed),
            created_at: Some(fmt(self.created_at)),
            updated_at: Some(fmt(self.updated_at.unwrap_or(now))),
        }
    }

    fn from_row(row: GoalRow, _config: &SyncConfig) -> Option<Self> {
        Some(Goal {
            id: id_of(row.id)?,
            title: row.title.unwrap_or_default(),
            goal_type: row
                .goal_type
                .as_deref()
                .and_then(|t| t.parse::<GoalType>().ok())
                .unwrap_or_default(),
            target: row.target_pomodoros.filter(|t| *t > 0),
            project_id: row.project_id,
            completed: row.is_completed.unwrap_or(false),
            description: row.description.filter(|d| !d.is_empty()),
            deadline: ts(&row.deadline),
            created_at: ts(&row.created_at).unwrap_or_else(epoch),
            updated_at: ts(&row.updated_at),
        })
    }
}

/// Row of the ideas table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaRow {
    /// Record id.
    pub id: String,
    /// Owning user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Content.
    #[serde(default)]
    pub content: Option<String>,
    /// `low`, `medium` or `high`.
    #[serde(default)]
    pub priority: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Modification time.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteRecord for Idea {
    type Row = IdeaRow;
    const COLLECTION: Collection = Collection::Ideas;

    fn to_row(&self, user_id: &str, _config: &SyncConfig, now: Timestamp) -> IdeaRow {
        IdeaRow {
            id: self.id.clone(),
            user_id: Some(user_id.to_string()),
            project_id: self.project_id.clone(),
            content: Some(self.content.clone()),
            priority: Some(self.priority.as_str().to_string()),
            created_at: Some(fmt(self.created_at)),
            updated_at: Some(fmt(self.updated_at.unwrap_or(now))),
        }
    }

    fn from_row(row: IdeaRow, _config: &SyncConfig) -> Option<Self> {
        Some(Idea {
            id: id_of(row.id)?,
            content: row.content.unwrap_or_default(),
            priority: row
                .priority
                .as_deref()
                .and_then(|p| p.parse::<Priority>().ok())
                .unwrap_or_default(),
            project_id: row.project_id,
            created_at: ts(&row.created_at).unwrap_or_else(epoch),
            updated_at: ts(&row.updated_at),
        })
    }
}
