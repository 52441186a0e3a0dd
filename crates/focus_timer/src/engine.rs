//! The Pomodoro state machine.

use crate::config::{DurationUpdate, Durations, TimerConfig};
use crate::events::{CompletionEvent, ModeChangeEvent, TickEvent};
use crate::mode::TimerMode;
use crate::observer::{Listeners, Subscription};
use crate::scheduler::{CountdownHandle, CountdownScheduler};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Run sub-state of the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not counting down. Remaining is either full or zero after completion.
    #[default]
    Idle,
    /// A countdown is active.
    Running,
    /// Countdown stopped with time remaining.
    Paused,
}

/// Point-in-time view of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    /// Current mode.
    pub mode: TimerMode,
    /// Seconds left.
    pub remaining: u32,
    /// Configured length of the current interval.
    pub total: u32,
    /// Run sub-state.
    pub run_state: RunState,
    /// Configured durations.
    pub durations: Durations,
}

struct TimerState {
    mode: TimerMode,
    durations: Durations,
    remaining: u32,
    total: u32,
    run_state: RunState,
    countdown: Option<CountdownHandle>,
    /// Bumped whenever a countdown is started or stopped so that callbacks
    /// from a cancelled countdown are ignored.
    generation: u64,
}

impl TimerState {
    fn tick_event(&self) -> TickEvent {
        TickEvent {
            remaining: self.remaining,
            total: self.total,
            mode: self.mode,
        }
    }

    fn reload(&mut self) {
        let duration = self.durations.for_mode(self.mode);
        self.total = duration;
        self.remaining = duration;
    }

    fn stop_countdown(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.countdown.take() {
            handle.cancel();
        }
    }
}

struct Shared<S> {
    state: Mutex<TimerState>,
    ticks: Arc<Listeners<TickEvent>>,
    mode_changes: Arc<Listeners<ModeChangeEvent>>,
    completions: Arc<Listeners<CompletionEvent>>,
    scheduler: S,
    tick_period: Duration,
}

enum Step {
    Ignored,
    Tick(TickEvent),
    Complete(TickEvent, CompletionEvent),
}

/// A Pomodoro countdown timer.
///
/// The timer owns at most one active countdown. Events are delivered
/// synchronously to listeners after the internal lock is released, so
/// listeners may call back into the timer.
///
/// Cloning yields another handle to the same timer.
///
/// # Example
///
/// ```rust
/// use focus_timer::{ManualScheduler, PomodoroTimer, TimerConfig, TimerMode};
///
/// let scheduler = ManualScheduler::new();
/// let timer = PomodoroTimer::new(TimerConfig::default(), scheduler.clone());
///
/// timer.switch_mode(TimerMode::ShortBreak);
/// timer.start();
/// scheduler.advance(60);
/// assert_eq!(timer.remaining(), 240);
/// ```
pub struct PomodoroTimer<S: CountdownScheduler + 'static> {
    shared: Arc<Shared<S>>,
}

impl<S: CountdownScheduler + 'static> Clone for PomodoroTimer<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: CountdownScheduler + 'static> PomodoroTimer<S> {
    /// Creates an idle timer in the configured initial mode.
    ///
    /// Nothing is emitted on construction; hosts read the initial state via
    /// [`PomodoroTimer::snapshot`].
    pub fn new(config: TimerConfig, scheduler: S) -> Self {
        let mut state = TimerState {
            mode: config.initial_mode,
            durations: config.durations,
            remaining: 0,
            total: 0,
            run_state: RunState::Idle,
            countdown: None,
            generation: 0,
        };
        state.reload();

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                ticks: Listeners::new(),
                mode_changes: Listeners::new(),
                completions: Listeners::new(),
                scheduler,
                tick_period: config.tick_period,
            }),
        }
    }

    /// Registers a tick listener.
    pub fn on_tick(&self, listener: impl Fn(&TickEvent) + Send + Sync + 'static) -> Subscription {
        self.shared.ticks.subscribe(Arc::new(listener))
    }

    /// Registers a mode-change listener.
    pub fn on_mode_change(
        &self,
        listener: impl Fn(&ModeChangeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.mode_changes.subscribe(Arc::new(listener))
    }

    /// Registers a completion listener.
    pub fn on_complete(
        &self,
        listener: impl Fn(&CompletionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.completions.subscribe(Arc::new(listener))
    }

    /// Starts the countdown. Does nothing if already running.
    ///
    /// A timer that ran out is reloaded with the full duration first.
    pub fn start(&self) {
        let reloaded = {
            let mut state = self.shared.state.lock();
            if state.run_state == RunState::Running {
                return;
            }

            let reloaded = if state.remaining == 0 {
                state.reload();
                Some(state.tick_event())
            } else {
                None
            };

            state.stop_countdown();
            let generation = state.generation;
            let weak: Weak<Shared<S>> = Arc::downgrade(&self.shared);
            let handle = self.shared.scheduler.schedule(
                self.shared.tick_period,
                Arc::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        step(&shared, Some(generation));
                    }
                }),
            );
            state.countdown = Some(handle);
            state.run_state = RunState::Running;
            tracing::debug!(mode = %state.mode, remaining = state.remaining, "timer started");
            reloaded
        };

        if let Some(tick) = reloaded {
            self.shared.ticks.emit(&tick);
        }
    }

    /// Pauses the countdown, keeping the remaining time. Does nothing unless
    /// running.
    pub fn pause(&self) {
        let mut state = self.shared.state.lock();
        if state.run_state != RunState::Running {
            return;
        }
        state.stop_countdown();
        state.run_state = RunState::Paused;
        tracing::debug!(mode = %state.mode, remaining = state.remaining, "timer paused");
    }

    /// Stops the countdown and reloads the current mode's duration.
    pub fn reset(&self) {
        let tick = {
            let mut state = self.shared.state.lock();
            state.stop_countdown();
            state.run_state = RunState::Idle;
            state.reload();
            state.tick_event()
        };
        self.shared.ticks.emit(&tick);
    }

    /// Selects a mode, stopping any countdown and loading its duration.
    ///
    /// Emits the mode change, then a tick for the new mode.
    pub fn switch_mode(&self, mode: TimerMode) {
        let tick = {
            let mut state = self.shared.state.lock();
            state.stop_countdown();
            state.mode = mode;
            state.run_state = RunState::Idle;
            state.reload();
            tracing::debug!(%mode, "timer mode switched");
            state.tick_event()
        };
        self.shared.mode_changes.emit(&ModeChangeEvent { mode });
        self.shared.ticks.emit(&tick);
    }

    /// Replaces some or all durations.
    ///
    /// If the current mode's duration changed, remaining and total are reset
    /// to the new value immediately and a tick is emitted. A running
    /// countdown keeps running.
    pub fn update_durations(&self, update: DurationUpdate) {
        let tick = {
            let mut state = self.shared.state.lock();
            let changed = state.durations.apply(&update);
            if !changed.contains(&state.mode) {
                return;
            }
            state.reload();
            state.tick_event()
        };
        self.shared.ticks.emit(&tick);
    }

    /// Advances the countdown by one step.
    ///
    /// Called by the scheduler; hosts driving their own loop may call it
    /// directly. Ignored unless running.
    pub fn tick(&self) {
        step(&self.shared, None);
    }

    /// Returns the current mode.
    pub fn mode(&self) -> TimerMode {
        self.shared.state.lock().mode
    }

    /// Returns the seconds left.
    pub fn remaining(&self) -> u32 {
        self.shared.state.lock().remaining
    }

    /// Returns the configured length of the current interval.
    pub fn total(&self) -> u32 {
        self.shared.state.lock().total
    }

    /// Returns true while a countdown is active.
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().run_state == RunState::Running
    }

    /// Returns the run sub-state.
    pub fn run_state(&self) -> RunState {
        self.shared.state.lock().run_state
    }

    /// Returns the configured durations.
    pub fn durations(&self) -> Durations {
        self.shared.state.lock().durations
    }

    /// Returns a consistent view of the timer.
    pub fn snapshot(&self) -> TimerSnapshot {
        let state = self.shared.state.lock();
        TimerSnapshot {
            mode: state.mode,
            remaining: state.remaining,
            total: state.total,
            run_state: state.run_state,
            durations: state.durations,
        }
    }
}

impl<S: CountdownScheduler + 'static> std::fmt::Debug for PomodoroTimer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PomodoroTimer")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

fn step<S: CountdownScheduler>(shared: &Shared<S>, generation: Option<u64>) {
    let outcome = {
        let mut state = shared.state.lock();
        let stale = generation.is_some_and(|g| g != state.generation);
        if state.run_state != RunState::Running || stale {
            Step::Ignored
        } else {
            state.remaining = state.remaining.saturating_sub(1);
            if state.remaining == 0 {
                state.stop_countdown();
                state.run_state = RunState::Idle;
                let completion = CompletionEvent {
                    mode: state.mode,
                    duration_seconds: state.total,
                    completed_at: Utc::now(),
                };
                tracing::debug!(mode = %state.mode, duration = state.total, "timer completed");
                Step::Complete(state.tick_event(), completion)
            } else {
                Step::Tick(state.tick_event())
            }
        }
    };

    match outcome {
        Step::Ignored => {}
        Step::Tick(tick) => shared.ticks.emit(&tick),
        Step::Complete(tick, completion) => {
            shared.ticks.emit(&tick);
            shared.completions.emit(&completion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    fn timer_with(work: u32) -> (PomodoroTimer<ManualScheduler>, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        let durations = Durations::new(work, 5, 9).unwrap();
        let timer = PomodoroTimer::new(TimerConfig::new(durations), scheduler.clone());
        (timer, scheduler)
    }

    #[test]
    fn new_timer_is_idle_in_work() {
        let (timer, _) = timer_with(1500);
        let snap = timer.snapshot();
        assert_eq!(snap.mode, TimerMode::Work);
        assert_eq!(snap.remaining, 1500);
        assert_eq!(snap.total, 1500);
        assert_eq!(snap.run_state, RunState::Idle);
    }

    #[test]
    fn start_is_idempotent() {
        let (timer, scheduler) = timer_with(10);
        timer.start();
        timer.start();
        assert_eq!(scheduler.active_count(), 1);
        assert_eq!(scheduler.scheduled_count(), 1);

        scheduler.advance(1);
        assert_eq!(timer.remaining(), 9);
    }

    #[test]
    fn pause_keeps_remaining() {
        let (timer, scheduler) = timer_with(10);
        timer.start();
        scheduler.advance(4);
        timer.pause();
        timer.pause();
        assert_eq!(timer.run_state(), RunState::Paused);
        assert_eq!(scheduler.active_count(), 0);

        scheduler.advance(4);
        assert_eq!(timer.remaining(), 6);
    }

    #[test]
    fn tick_ignored_when_not_running() {
        let (timer, _) = timer_with(10);
        timer.tick();
        assert_eq!(timer.remaining(), 10);
    }

    #[test]
    fn completion_stops_and_clamps() {
        let (timer, scheduler) = timer_with(3);
        let completions = Arc::new(Mutex::new(Vec::new()));
        let c = Arc::clone(&completions);
        let _sub = timer.on_complete(move |e| c.lock().push(e.clone()));

        timer.start();
        scheduler.advance(5);

        assert_eq!(timer.remaining(), 0);
        assert_eq!(timer.run_state(), RunState::Idle);
        assert_eq!(scheduler.active_count(), 0);

        let completions = completions.lock();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].mode, TimerMode::Work);
        assert_eq!(completions[0].duration_seconds, 3);
    }

    #[test]
    fn start_after_completion_reloads() {
        let (timer, scheduler) = timer_with(2);
        timer.start();
        scheduler.advance(2);
        assert_eq!(timer.remaining(), 0);

        timer.start();
        assert_eq!(timer.remaining(), 2);
        assert!(timer.is_running());
    }

    #[test]
    fn reset_reloads_and_emits() {
        let (timer, scheduler) = timer_with(10);
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let t = Arc::clone(&ticks);
        let _sub = timer.on_tick(move |e| t.lock().push(e.remaining));

        timer.start();
        scheduler.advance(3);
        timer.reset();

        assert_eq!(timer.remaining(), 10);
        assert!(!timer.is_running());
        assert_eq!(*ticks.lock(), vec![9, 8, 7, 10]);
    }

    #[test]
    fn update_durations_reapplies_current_mode() {
        let (timer, _) = timer_with(10);
        timer.update_durations(DurationUpdate::only(TimerMode::Work, 20));
        assert_eq!(timer.remaining(), 20);
        assert_eq!(timer.total(), 20);
    }

    #[test]
    fn update_other_mode_keeps_remaining() {
        let (timer, scheduler) = timer_with(10);
        timer.start();
        scheduler.advance(2);
        timer.update_durations(DurationUpdate::only(TimerMode::LongBreak, 600));

        assert_eq!(timer.remaining(), 8);
        assert_eq!(timer.durations().long_break, 600);
    }

    #[test]
    fn listener_may_call_back_into_timer() {
        let (timer, scheduler) = timer_with(2);
        let handle = timer.clone();
        let _sub = timer.on_complete(move |_| handle.switch_mode(TimerMode::ShortBreak));

        timer.start();
        scheduler.advance(2);

        assert_eq!(timer.mode(), TimerMode::ShortBreak);
        assert_eq!(timer.remaining(), 5);
    }
}
