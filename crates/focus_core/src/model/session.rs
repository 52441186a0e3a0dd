use super::Record;
use crate::id::Timestamp;
use focus_timer::TimerMode;
use serde::{Deserialize, Serialize};

/// A completed timer interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    /// Record id.
    pub id: String,
    /// Mode that completed.
    pub mode: TimerMode,
    /// Configured interval length.
    pub duration_seconds: u32,
    /// When the interval ran out.
    pub completed_at: Timestamp,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// Project active at completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Task active at completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl TimerSession {
    /// Duration rounded to whole minutes.
    pub fn duration_minutes(&self) -> u32 {
        self.duration_seconds.saturating_add(30) / 60
    }
}

impl Record for TimerSession {
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
