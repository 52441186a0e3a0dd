//! Derived statistics over the workspace collections.
//!
//! Days are UTC calendar days. Only work sessions are counted.

use crate::id::Timestamp;
use crate::model::{Collections, Goal, TimerSession};
use chrono::{Duration, NaiveDate};

/// Daily goal used when no project sets one.
pub const DEFAULT_DAILY_GOAL: u32 = 4;

/// Session counts for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectStats {
    /// Project id.
    pub project_id: String,
    /// Project name.
    pub name: String,
    /// Whether the project is archived.
    pub archived: bool,
    /// Work sessions completed today.
    pub today: u32,
    /// Work sessions completed ever.
    pub total: u32,
    /// Daily goal, zero when unset.
    pub goal: u32,
}

/// Today's progress against the combined daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyProgress {
    /// Work sessions completed today.
    pub count: u32,
    /// Sum of project goals, or [`DEFAULT_DAILY_GOAL`].
    pub goal: u32,
    /// Minutes focused today.
    pub minutes: u32,
}

impl DailyProgress {
    /// Returns true once the goal is met.
    pub fn reached(&self) -> bool {
        self.goal > 0 && self.count >= self.goal
    }

    /// Fraction of the goal achieved, capped at 1.0.
    pub fn ratio(&self) -> f64 {
        if self.goal == 0 {
            return 0.0;
        }
        (f64::from(self.count) / f64::from(self.goal)).min(1.0)
    }
}

/// Work done on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    /// The day.
    pub date: NaiveDate,
    /// Work sessions completed.
    pub sessions: u32,
    /// Minutes focused.
    pub minutes: u32,
}

/// Progress of a planning goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProgress {
    /// Work sessions in the goal's window.
    pub count: u32,
    /// Target, if any.
    pub target: Option<u32>,
    /// Explicitly completed, or target reached.
    pub completed: bool,
    /// Percentage of the target reached, capped at 100; zero without target.
    pub percent: u32,
}

/// Session counts over the standard reporting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSummary {
    /// Last 7 days.
    pub last_7_days: usize,
    /// Last 30 days.
    pub last_30_days: usize,
    /// Last 90 days.
    pub last_90_days: usize,
}

fn work_sessions(data: &Collections) -> impl Iterator<Item = &TimerSession> {
    data.sessions.iter().filter(|s| s.mode.is_work())
}

fn minutes(seconds: u32) -> u32 {
    seconds.saturating_add(30) / 60
}

/// Per-project session counts, in project order.
pub fn project_stats(data: &Collections, today: NaiveDate) -> Vec<ProjectStats> {
    data.projects
        .iter()
        .map(|p| {
            let mut stats = ProjectStats {
                project_id: p.id.clone(),
                name: p.name.clone(),
                archived: p.archived,
                today: 0,
                total: 0,
                goal: p.goal.unwrap_or(0),
            };
            for s in work_sessions(data).filter(|s| s.project_id.as_deref() == Some(&p.id)) {
                stats.total += 1;
                if s.completed_at.date_naive() == today {
                    stats.today += 1;
                }
            }
            stats
        })
        .collect()
}

/// Today's work sessions against the sum of all project goals.
pub fn daily_progress(data: &Collections, today: NaiveDate) -> DailyProgress {
    let (count, seconds) = work_sessions(data)
        .filter(|s| s.completed_at.date_naive() == today)
        .fold((0u32, 0u32), |(count, secs), s| {
            (count + 1, secs.saturating_add(s.duration_seconds))
        });
    let goal: u32 = data.projects.iter().filter_map(|p| p.goal).sum();
    DailyProgress {
        count,
        goal: if goal == 0 { DEFAULT_DAILY_GOAL } else { goal },
        minutes: minutes(seconds),
    }
}

/// Work per day for the `days` days ending with `today`, oldest first.
pub fn sessions_per_day(data: &Collections, today: NaiveDate, days: u32) -> Vec<DayCount> {
    (0..days)
        .rev()
        .map(|back| {
            let date = today - Duration::days(i64::from(back));
            let (sessions, seconds) = work_sessions(data)
                .filter(|s| s.completed_at.date_naive() == date)
                .fold((0u32, 0u32), |(n, secs), s| {
                    (n + 1, secs.saturating_add(s.duration_seconds))
                });
            DayCount {
                date,
                sessions,
                minutes: minutes(seconds),
            }
        })
        .collect()
}

/// Counts work sessions completed at most `days` days before `now`,
/// optionally restricted to one project.
pub fn sessions_in_window(
    data: &Collections,
    now: Timestamp,
    days: i64,
    project_id: Option<&str>,
) -> usize {
    let cutoff = now - Duration::days(days);
    work_sessions(data)
        .filter(|s| s.completed_at >= cutoff)
        .filter(|s| project_id.map_or(true, |pid| s.project_id.as_deref() == Some(pid)))
        .count()
}

/// Session counts over the last 7, 30 and 90 days.
pub fn window_summary(data: &Collections, now: Timestamp) -> WindowSummary {
    WindowSummary {
        last_7_days: sessions_in_window(data, now, 7, None),
        last_30_days: sessions_in_window(data, now, 30, None),
        last_90_days: sessions_in_window(data, now, 90, None),
    }
}

/// Progress of `goal`, counting work sessions in its window.
pub fn goal_progress(goal: &Goal, data: &Collections, now: Timestamp) -> GoalProgress {
    let count = sessions_in_window(
        data,
        now,
        goal.goal_type.window_days(),
        goal.project_id.as_deref(),
    );
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    let target = goal.target.filter(|t| *t > 0);
    let percent = target
        .map(|t| ((u64::from(count) * 100 + u64::from(t) / 2) / u64::from(t)).min(100) as u32)
        .unwrap_or(0);
    GoalProgress {
        count,
        target,
        completed: goal.completed || target.is_some_and(|t| count >= t),
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GoalType, Project};
    use chrono::{TimeZone, Utc};
    use focus_timer::TimerMode;

    fn at(day: u32, hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn session(id: &str, project: &str, mode: TimerMode, when: Timestamp) -> TimerSession {
        TimerSession {
            id: id.into(),
            mode,
            duration_seconds: 1500,
            completed_at: when,
            created_at: when,
            updated_at: Some(when),
            project_id: Some(project.into()),
            task_id: None,
        }
    }

    fn sample() -> Collections {
        Collections {
            projects: vec![
                Project::new("a", "A", Some(3), at(1, 0)),
                Project::new("b", "B", None, at(1, 0)),
            ],
            sessions: vec![
                session("s1", "a", TimerMode::Work, at(10, 9)),
                session("s2", "a", TimerMode::Work, at(10, 11)),
                session("s3", "b", TimerMode::Work, at(9, 9)),
                session("s4", "a", TimerMode::ShortBreak, at(10, 12)),
                session("s5", "a", TimerMode::Work, at(1, 9)),
            ],
            ..Collections::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[test]
    fn per_project_counts() {
        let stats = project_stats(&sample(), today());
        assert_eq!(stats[0].today, 2);
        assert_eq!(stats[0].total, 3);
        assert_eq!(stats[0].goal, 3);
        assert_eq!(stats[1].today, 0);
        assert_eq!(stats[1].total, 1);
        assert_eq!(stats[1].goal, 0);
    }

    #[test]
    fn oversized_durations_saturate() {
        let mut data = sample();
        for s in &mut data.sessions {
            s.duration_seconds = u32::MAX;
        }
        assert_eq!(data.sessions[0].duration_minutes(), u32::MAX / 60);
        assert_eq!(daily_progress(&data, today()).minutes, u32::MAX / 60);
        let days = sessions_per_day(&data, today(), 1);
        assert_eq!(days[0].minutes, u32::MAX / 60);
    }

    #[test]
    fn daily_progress_sums_goals() {
        let progress = daily_progress(&sample(), today());
        assert_eq!(progress.count, 2);
        assert_eq!(progress.goal, 3);
        assert_eq!(progress.minutes, 50);
        assert!(!progress.reached());
    }

    #[test]
    fn daily_progress_defaults_goal() {
        let mut data = sample();
        for p in &mut data.projects {
            p.goal = None;
        }
        assert_eq!(daily_progress(&data, today()).goal, DEFAULT_DAILY_GOAL);
    }

    #[test]
    fn histogram_is_oldest_first() {
        let days = sessions_per_day(&sample(), today(), 3);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 8).unwrap());
        assert_eq!(days[1].sessions, 1);
        assert_eq!(days[2].sessions, 2);
    }

    #[test]
    fn goal_progress_by_window() {
        let data = sample();
        let mut goal = Goal {
            id: "g".into(),
            title: "Focus".into(),
            goal_type: GoalType::Weekly,
            target: Some(4),
            project_id: Some("a".into()),
            completed: false,
            description: None,
            deadline: None,
            created_at: at(1, 0),
            updated_at: None,
        };

        let progress = goal_progress(&goal, &data, at(10, 18));
        assert_eq!(progress.count, 2);
        assert_eq!(progress.percent, 50);
        assert!(!progress.completed);

        goal.goal_type = GoalType::LongTerm;
        goal.target = Some(3);
        let progress = goal_progress(&goal, &data, at(10, 18));
        assert_eq!(progress.count, 3);
        assert!(progress.completed);
        assert_eq!(progress.percent, 100);

        goal.target = None;
        let progress = goal_progress(&goal, &data, at(10, 18));
        assert_eq!(progress.percent, 0);
        assert!(!progress.completed);
    }

    #[test]
    fn window_summary_counts() {
        let summary = window_summary(&sample(), at(10, 18));
        assert_eq!(summary.last_7_days, 3);
        assert_eq!(summary.last_30_days, 4);
        assert_eq!(summary.last_90_days, 4);
    }
}
