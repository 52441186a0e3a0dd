//! Configuration for the timer.

use crate::error::{TimerError, TimerResult};
use crate::mode::TimerMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configured length of each mode, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    /// Work interval length.
    pub work: u32,
    /// Short break length.
    pub short_break: u32,
    /// Long break length.
    pub long_break: u32,
}

impl Durations {
    /// Upper bounds, in minutes, accepted from user input (work, short, long).
    pub const MAX_MINUTES: (u32, u32, u32) = (60, 30, 60);

    /// Creates durations from seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::ZeroDuration`] if any duration is zero.
    pub fn new(work: u32, short_break: u32, long_break: u32) -> TimerResult<Self> {
        for (mode, secs) in [
            (TimerMode::Work, work),
            (TimerMode::ShortBreak, short_break),
            (TimerMode::LongBreak, long_break),
        ] {
            if secs == 0 {
                return Err(TimerError::ZeroDuration {
                    mode: mode.to_string(),
                });
            }
        }
        Ok(Self {
            work,
            short_break,
            long_break,
        })
    }

    /// Creates durations from minutes, clamping each into its accepted range.
    ///
    /// Work and long breaks are clamped to 1..=60 minutes, short breaks to
    /// 1..=30 minutes.
    pub fn from_minutes(work: u32, short_break: u32, long_break: u32) -> Self {
        let (max_work, max_short, max_long) = Self::MAX_MINUTES;
        Self {
            work: work.clamp(1, max_work) * 60,
            short_break: short_break.clamp(1, max_short) * 60,
            long_break: long_break.clamp(1, max_long) * 60,
        }
    }

    /// Returns the duration configured for `mode`.
    pub fn for_mode(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work,
            TimerMode::ShortBreak => self.short_break,
            TimerMode::LongBreak => self.long_break,
        }
    }

    /// Applies an update, returning the modes whose duration changed.
    ///
    /// Zero values are ignored.
    pub fn apply(&mut self, update: &DurationUpdate) -> Vec<TimerMode> {
        let mut changed = Vec::new();
        for (mode, value) in [
            (TimerMode::Work, update.work),
            (TimerMode::ShortBreak, update.short_break),
            (TimerMode::LongBreak, update.long_break),
        ] {
            let Some(secs) = value else { continue };
            if secs == 0 {
                tracing::warn!(%mode, "ignoring zero duration");
                continue;
            }
            let slot = match mode {
                TimerMode::Work => &mut self.work,
                TimerMode::ShortBreak => &mut self.short_break,
                TimerMode::LongBreak => &mut self.long_break,
            };
            if *slot != secs {
                *slot = secs;
                changed.push(mode);
            }
        }
        changed
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work: 25 * 60,
            short_break: 5 * 60,
            long_break: 15 * 60,
        }
    }
}

/// Partial duration update; `None` leaves a mode untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationUpdate {
    /// New work length in seconds.
    pub work: Option<u32>,
    /// New short break length in seconds.
    pub short_break: Option<u32>,
    /// New long break length in seconds.
    pub long_break: Option<u32>,
}

impl DurationUpdate {
    /// Builds an update that replaces all three durations.
    pub fn all(durations: Durations) -> Self {
        Self {
            work: Some(durations.work),
            short_break: Some(durations.short_break),
            long_break: Some(durations.long_break),
        }
    }

    /// Builds an update for a single mode.
    pub fn only(mode: TimerMode, seconds: u32) -> Self {
        let mut update = Self::default();
        match mode {
            TimerMode::Work => update.work = Some(seconds),
            TimerMode::ShortBreak => update.short_break = Some(seconds),
            TimerMode::LongBreak => update.long_break = Some(seconds),
        }
        update
    }
}

/// Configuration for a [`crate::PomodoroTimer`].
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Mode durations.
    pub durations: Durations,
    /// Interval between countdown ticks.
    pub tick_period: Duration,
    /// Mode selected when the timer is created.
    pub initial_mode: TimerMode,
}

impl TimerConfig {
    /// Creates a configuration with the given durations.
    pub fn new(durations: Durations) -> Self {
        Self {
            durations,
            tick_period: Duration::from_secs(1),
            initial_mode: TimerMode::Work,
        }
    }

    /// Sets the mode durations.
    pub fn with_durations(mut self, durations: Durations) -> Self {
        self.durations = durations;
        self
    }

    /// Sets the tick period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Sets the initial mode.
    pub fn with_initial_mode(mut self, mode: TimerMode) -> Self {
        self.initial_mode = mode;
        self
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_durations() {
        let d = Durations::default();
        assert_eq!(d.work, 1500);
        assert_eq!(d.short_break, 300);
        assert_eq!(d.long_break, 900);
    }

    #[test]
    fn from_minutes_clamps() {
        let d = Durations::from_minutes(0, 45, 90);
        assert_eq!(d.work, 60);
        assert_eq!(d.short_break, 30 * 60);
        assert_eq!(d.long_break, 60 * 60);
    }

    #[test]
    fn new_rejects_zero() {
        assert!(Durations::new(1500, 0, 900).is_err());
        assert!(Durations::new(1500, 300, 900).is_ok());
    }

    #[test]
    fn apply_reports_changed_modes() {
        let mut d = Durations::default();
        let changed = d.apply(&DurationUpdate {
            work: Some(1500),
            short_break: Some(600),
            long_break: Some(0),
        });
        assert_eq!(changed, vec![TimerMode::ShortBreak]);
        assert_eq!(d.short_break, 600);
        assert_eq!(d.long_break, 900);
    }

    #[test]
    fn config_builder() {
        let config = TimerConfig::default()
            .with_tick_period(Duration::from_millis(10))
            .with_initial_mode(TimerMode::LongBreak)
            .with_durations(Durations::from_minutes(50, 10, 20));

        assert_eq!(config.tick_period, Duration::from_millis(10));
        assert_eq!(config.initial_mode, TimerMode::LongBreak);
        assert_eq!(config.durations.work, 3000);
    }
}
