//! Foreground countdown.

use crate::app::App;
use crate::error::CliResult;
use focus_timer::{
    CompletionEvent, DurationUpdate, PomodoroTimer, TickEvent, TimerConfig, TimerMode,
    TokioScheduler,
};
use parking_lot::Mutex;
use std::io::{self, Write};
use tokio::sync::oneshot;

/// Runs one interval in the foreground and records it when it completes.
///
/// Ctrl-C pauses the timer and exits without recording anything.
pub fn run(
    app: &App,
    mode: TimerMode,
    minutes: Option<u32>,
    task: Option<&str>,
) -> CliResult<()> {
    app.bootstrap();
    if let Some(task) = task {
        app.mutate(|ws| ws.set_active_task(Some(task)))?;
    }

    let mut durations = app.config().durations;
    if let Some(minutes) = minutes {
        durations.apply(&DurationUpdate::only(mode, minutes * 60));
    }
    let config = TimerConfig::new(durations).with_initial_mode(mode);

    let (project, task_title) = app.read(|ws| {
        let project = ws
            .active_project()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let task = ws
            .active_task_id()
            .and_then(|id| ws.tasks().iter().find(|t| t.id == id))
            .map(|t| t.title.clone());
        (project, task)
    });
    match &task_title {
        Some(title) => println!("{} | {project} | {title}", mode.label()),
        None => println!("{} | {project}", mode.label()),
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let scheduler = TokioScheduler::new(runtime.handle().clone());
    let completed = runtime.block_on(countdown(config, scheduler));
    drop(runtime);

    match completed {
        Some(event) => {
            println!("\n{} complete.", event.mode.label());
            if let Some(session) = app.mutate(|ws| ws.record_completion(&event))? {
                let today = session.completed_at.date_naive();
                let daily =
                    app.read(|ws| focus_core::analytics::daily_progress(ws.collections(), today));
                println!("Today: {}/{} sessions", daily.count, daily.goal);
            }
        }
        None => println!("\nPaused. Nothing recorded."),
    }
    Ok(())
}

async fn countdown(config: TimerConfig, scheduler: TokioScheduler) -> Option<CompletionEvent> {
    let timer = PomodoroTimer::new(config, scheduler);
    let (done_tx, done_rx) = oneshot::channel();
    let done_tx = Mutex::new(Some(done_tx));

    let _ticks = timer.on_tick(|tick| {
        print!("\r{} {:>6}", tick.mode.label(), tick.clock());
        let _ = io::stdout().flush();
    });
    let _complete = timer.on_complete(move |event| {
        if let Some(tx) = done_tx.lock().take() {
            let _ = tx.send(event.clone());
        }
    });

    timer.start();
    let snapshot = timer.snapshot();
    let first = TickEvent {
        remaining: snapshot.remaining,
        total: snapshot.total,
        mode: snapshot.mode,
    };
    print!("\r{} {:>6}", first.mode.label(), first.clock());
    let _ = io::stdout().flush();

    tokio::select! {
        event = done_rx => event.ok(),
        _ = tokio::signal::ctrl_c() => {
            timer.pause();
            None
        }
    }
}

