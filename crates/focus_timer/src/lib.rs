//! # Focus Timer
//!
//! Pomodoro countdown state machine for Focus.
//!
//! This crate provides:
//! - Mode state machine (work → short break → long break, selected by the host)
//! - Run sub-states (idle → running ↔ paused → completed)
//! - Countdown scheduling behind the [`CountdownScheduler`] trait
//! - Synchronous listener fan-out for tick, mode-change and completion events
//!
//! ## Key Invariants
//!
//! - At most one active countdown per timer
//! - `start()` and `pause()` are idempotent
//! - Completion reports the configured duration, not wall-clock elapsed time
//! - Listeners run synchronously, in registration order
//! - The timer never advances to the next mode on its own
//!
//! The crate has no knowledge of storage or sync.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod events;
mod mode;
mod observer;
mod scheduler;

pub use config::{DurationUpdate, Durations, TimerConfig};
pub use engine::{PomodoroTimer, RunState, TimerSnapshot};
pub use error::{TimerError, TimerResult};
pub use events::{CompletionEvent, ModeChangeEvent, TickEvent};
pub use mode::TimerMode;
pub use observer::{Listener, Listeners, Subscription};
pub use scheduler::{
    CountdownHandle, CountdownScheduler, ManualScheduler, TickCallback, TokioScheduler,
};
