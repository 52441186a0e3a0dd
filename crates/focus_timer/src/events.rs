//! Events emitted by the timer.

use crate::mode::TimerMode;
use chrono::{DateTime, Utc};

/// Emitted on every countdown step and whenever the clock is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// Seconds left in the current interval.
    pub remaining: u32,
    /// Configured length of the current interval.
    pub total: u32,
    /// Current mode.
    pub mode: TimerMode,
}

impl TickEvent {
    /// Fraction of the interval already elapsed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.total - self.remaining.min(self.total)) / f64::from(self.total)
    }

    /// Formats the remaining time as `m:ss`.
    pub fn clock(&self) -> String {
        format!("{}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

/// Emitted when the host selects a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChangeEvent {
    /// Newly selected mode.
    pub mode: TimerMode,
}

/// Emitted once when an interval runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    /// Mode that completed.
    pub mode: TimerMode,
    /// Configured length of the interval, independent of pauses.
    pub duration_seconds: u32,
    /// When the interval ran out.
    pub completed_at: DateTime<Utc>,
}
