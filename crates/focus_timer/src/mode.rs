//! Timer modes.

use crate::error::TimerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three Pomodoro intervals.
///
/// Serialized as `"work"`, `"short"` and `"long"`, which is also the
/// `session_type` stored remotely. The hyphenated and underscored spellings
/// (`"short-break"`, `"long_break"`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimerMode {
    /// Focus interval.
    #[default]
    #[serde(rename = "work")]
    Work,
    /// Short rest interval.
    #[serde(rename = "short", alias = "short-break", alias = "short_break")]
    ShortBreak,
    /// Long rest interval.
    #[serde(rename = "long", alias = "long-break", alias = "long_break")]
    LongBreak,
}

impl TimerMode {
    /// All modes in display order.
    pub const ALL: [TimerMode; 3] = [TimerMode::Work, TimerMode::ShortBreak, TimerMode::LongBreak];

    /// Returns the canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::ShortBreak => "short",
            TimerMode::LongBreak => "long",
        }
    }

    /// Returns the upper-case label shown next to the clock.
    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Work => "WORK",
            TimerMode::ShortBreak => "SHORT BREAK",
            TimerMode::LongBreak => "LONG BREAK",
        }
    }

    /// Returns true for the focus interval.
    pub fn is_work(&self) -> bool {
        matches!(self, TimerMode::Work)
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerMode {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(TimerMode::Work),
            "short" | "short-break" | "short_break" => Ok(TimerMode::ShortBreak),
            "long" | "long-break" | "long_break" => Ok(TimerMode::LongBreak),
            _ => Err(TimerError::UnknownMode(s.to_string())),
        }
    }
}
