use super::Record;
use crate::id::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Horizon of a planning goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    /// Counted over the last day.
    Daily,
    /// Counted over the last seven days.
    Weekly,
    /// Counted over the last ninety days.
    #[default]
    #[serde(alias = "long-term", alias = "longterm")]
    LongTerm,
}

impl GoalType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Daily => "daily",
            GoalType::Weekly => "weekly",
            GoalType::LongTerm => "long_term",
        }
    }

    /// Number of days of sessions counted towards the goal.
    pub fn window_days(&self) -> i64 {
        match self {
            GoalType::Daily => 1,
            GoalType::Weekly => 7,
            GoalType::LongTerm => 90,
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalType {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(GoalType::Daily),
            "weekly" => Ok(GoalType::Weekly),
            "long_term" | "long-term" | "longterm" => Ok(GoalType::LongTerm),
            other => Err(crate::CoreError::invalid_input(format!(
                "unknown goal type: {other}"
            ))),
        }
    }
}

/// A planning goal measured in work sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// Record id.
    pub id: String,
    /// Goal text.
    pub title: String,
    /// Horizon.
    #[serde(rename = "type", default)]
    pub goal_type: GoalType,
    /// Target session count; no cap when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    /// Related project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Explicitly completed.
    #[serde(default)]
    pub completed: bool,
    /// Longer description, carried from the remote store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deadline, carried from the remote store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Timestamp>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Record for Goal {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_type_parsing() {
        assert_eq!("weekly".parse::<GoalType>().unwrap(), GoalType::Weekly);
        assert_eq!("long-term".parse::<GoalType>().unwrap(), GoalType::LongTerm);
        assert!("yearly".parse::<GoalType>().is_err());
        assert_eq!(GoalType::LongTerm.window_days(), 90);
    }
}
