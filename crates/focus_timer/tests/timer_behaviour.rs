//! Behavioural tests for the Pomodoro timer.

use focus_timer::{
    DurationUpdate, Durations, ManualScheduler, PomodoroTimer, RunState, TimerConfig, TimerMode,
    TokioScheduler,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Tick(u32, TimerMode),
    Mode(TimerMode),
    Complete(TimerMode, u32),
}

fn recorded(timer: &PomodoroTimer<ManualScheduler>) -> Arc<Mutex<Vec<Seen>>> {
    let log = Arc::new(Mutex::new(Vec::new()));

    let l = Arc::clone(&log);
    let _ = timer.on_tick(move |e| l.lock().push(Seen::Tick(e.remaining, e.mode)));
    let l = Arc::clone(&log);
    let _ = timer.on_mode_change(move |e| l.lock().push(Seen::Mode(e.mode)));
    let l = Arc::clone(&log);
    let _ = timer.on_complete(move |e| l.lock().push(Seen::Complete(e.mode, e.duration_seconds)));

    log
}

fn manual(durations: Durations) -> (PomodoroTimer<ManualScheduler>, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let timer = PomodoroTimer::new(TimerConfig::new(durations), scheduler.clone());
    (timer, scheduler)
}

#[test]
fn completion_reports_configured_total_despite_pauses() {
    let (timer, scheduler) = manual(Durations::new(5, 3, 4).unwrap());
    let log = recorded(&timer);

    timer.start();
    scheduler.advance(2);
    timer.pause();
    scheduler.advance(10);
    timer.start();
    scheduler.advance(1);
    timer.pause();
    timer.start();
    scheduler.advance(2);

    let log = log.lock();
    assert_eq!(
        *log,
        vec![
            Seen::Tick(4, TimerMode::Work),
            Seen::Tick(3, TimerMode::Work),
            Seen::Tick(2, TimerMode::Work),
            Seen::Tick(1, TimerMode::Work),
            Seen::Tick(0, TimerMode::Work),
            Seen::Complete(TimerMode::Work, 5),
        ]
    );
    assert_eq!(timer.run_state(), RunState::Idle);
}

#[test]
fn double_start_ticks_once_per_period() {
    let (timer, scheduler) = manual(Durations::default());
    let log = recorded(&timer);

    timer.start();
    timer.start();
    scheduler.advance(3);

    assert_eq!(log.lock().len(), 3);
    assert_eq!(timer.remaining(), 1497);
}

#[test]
fn switch_mode_emits_mode_change_before_tick() {
    let (timer, scheduler) = manual(Durations::default());
    timer.start();
    scheduler.advance(10);

    let log = recorded(&timer);
    timer.switch_mode(TimerMode::LongBreak);

    assert_eq!(
        *log.lock(),
        vec![
            Seen::Mode(TimerMode::LongBreak),
            Seen::Tick(900, TimerMode::LongBreak),
        ]
    );
    assert_eq!(timer.remaining(), 900);
    assert!(!timer.is_running());
    assert_eq!(scheduler.active_count(), 0);
}

#[test]
fn no_auto_advance_after_break() {
    let (timer, scheduler) = manual(Durations::new(5, 2, 4).unwrap());
    timer.switch_mode(TimerMode::ShortBreak);
    timer.start();
    scheduler.advance(2);

    assert_eq!(timer.mode(), TimerMode::ShortBreak);
    assert_eq!(timer.remaining(), 0);
}

#[test]
fn unknown_mode_is_rejected_by_parser() {
    let (timer, _) = manual(Durations::default());
    if let Ok(mode) = "siesta".parse::<TimerMode>() {
        timer.switch_mode(mode);
    }
    assert_eq!(timer.mode(), TimerMode::Work);
    assert_eq!(timer.remaining(), 1500);
}

#[test]
fn unsubscribed_listener_is_silent() {
    let (timer, scheduler) = manual(Durations::default());
    let count = Arc::new(Mutex::new(0u32));
    let c = Arc::clone(&count);
    let sub = timer.on_tick(move |_| *c.lock() += 1);

    timer.start();
    scheduler.advance(2);
    sub.unsubscribe();
    scheduler.advance(2);

    assert_eq!(*count.lock(), 2);
}

#[test]
fn updating_durations_while_running() {
    let (timer, scheduler) = manual(Durations::default());
    timer.start();
    scheduler.advance(5);

    timer.update_durations(DurationUpdate::only(TimerMode::Work, 600));
    assert_eq!(timer.remaining(), 600);
    assert!(timer.is_running());

    scheduler.advance(1);
    assert_eq!(timer.remaining(), 599);
}

#[tokio::test(start_paused = true)]
async fn tokio_countdown_completes() {
    let scheduler = TokioScheduler::current().unwrap();
    let timer = PomodoroTimer::new(
        TimerConfig::new(Durations::new(3, 1, 1).unwrap()),
        scheduler,
    );

    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Mutex::new(Some(tx));
    let _sub = timer.on_complete(move |e| {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(e.duration_seconds);
        }
    });

    timer.start();
    let duration = tokio::time::timeout(Duration::from_secs(10), rx)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(duration, 3);
    assert_eq!(timer.remaining(), 0);
    assert!(!timer.is_running());
}
