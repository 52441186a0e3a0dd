//! Configuration for sync.

use focus_core::Collection;

/// Remote table names, one per collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// Projects table.
    pub projects: String,
    /// Tasks table.
    pub tasks: String,
    /// Sessions table.
    pub sessions: String,
    /// Goals table.
    pub goals: String,
    /// Ideas table.
    pub ideas: String,
}

impl TableNames {
    /// Returns the table for `collection`.
    pub fn get(&self, collection: Collection) -> &str {
        match collection {
            Collection::Projects => &self.projects,
            Collection::Tasks => &self.tasks,
            Collection::Sessions => &self.sessions,
            Collection::Goals => &self.goals,
            Collection::Ideas => &self.ideas,
        }
    }

    fn slot(&mut self, collection: Collection) -> &mut String {
        match collection {
            Collection::Projects => &mut self.projects,
            Collection::Tasks => &mut self.tasks,
            Collection::Sessions => &mut self.sessions,
            Collection::Goals => &mut self.goals,
            Collection::Ideas => &mut self.ideas,
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            projects: "projects".into(),
            tasks: "tasks".into(),
            sessions: "pomodoro_sessions".into(),
            goals: "goals".into(),
            ideas: "ideas".into(),
        }
    }
}

/// Configuration for the sync manager.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote table names.
    pub tables: TableNames,
    /// Column holding the owning user id.
    pub user_column: String,
    /// Column used to resolve upsert conflicts.
    pub conflict_column: String,
    /// Daily goal written for projects without one.
    pub default_daily_goal: u32,
    /// Color written for projects without one.
    pub default_project_color: String,
}

impl SyncConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            tables: TableNames::default(),
            user_column: "user_id".into(),
            conflict_column: "id".into(),
            default_daily_goal: 4,
            default_project_color: "#f97316".into(),
        }
    }

    /// Returns the remote table for `collection`.
    pub fn table(&self, collection: Collection) -> &str {
        self.tables.get(collection)
    }

    /// Overrides the table for one collection.
    pub fn with_table(mut self, collection: Collection, table: impl Into<String>) -> Self {
        *self.tables.slot(collection) = table.into();
        self
    }

    /// Sets the user id column.
    pub fn with_user_column(mut self, column: impl Into<String>) -> Self {
        self.user_column = column.into();
        self
    }

    /// Sets the default project daily goal.
    pub fn with_default_daily_goal(mut self, goal: u32) -> Self {
        self.default_daily_goal = goal;
        self
    }

    /// Sets the default project color.
    pub fn with_default_project_color(mut self, color: impl Into<String>) -> Self {
        self.default_project_color = color.into();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables() {
        let config = SyncConfig::default();
        assert_eq!(config.table(Collection::Sessions), "pomodoro_sessions");
        assert_eq!(config.table(Collection::Ideas), "ideas");
        assert_eq!(config.user_column, "user_id");
        assert_eq!(config.default_daily_goal, 4);
    }

    #[test]
    fn builder_overrides() {
        let config = SyncConfig::new()
            .with_table(Collection::Tasks, "todo_items")
            .with_user_column("owner")
            .with_default_daily_goal(6)
            .with_default_project_color("#000000");
        assert_eq!(config.table(Collection::Tasks), "todo_items");
        assert_eq!(config.user_column, "owner");
        assert_eq!(config.default_daily_goal, 6);
        assert_eq!(config.default_project_color, "#000000");
    }
}
