//! Countdown scheduling.
//!
//! The timer never sleeps itself. It asks a [`CountdownScheduler`] to call a
//! tick callback once per period and keeps the returned [`CountdownHandle`]
//! for as long as the countdown runs. Cancelling (or dropping) the handle
//! stops the callbacks.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};

/// Callback invoked once per countdown period.
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// Schedules recurring countdown callbacks.
///
/// Implementations must stop invoking `tick` once the returned handle is
/// cancelled or dropped.
pub trait CountdownScheduler: Send + Sync {
    /// Starts calling `tick` every `period`, first after one full period.
    fn schedule(&self, period: Duration, tick: TickCallback) -> CountdownHandle;
}

/// Owner of one scheduled countdown.
pub struct CountdownHandle {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CountdownHandle {
    /// Creates a handle that runs `cancel` exactly once.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops the countdown.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for CountdownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Runs countdowns as tokio tasks on a runtime handle.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler that spawns onto `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a scheduler for the runtime the caller is running on.
    ///
    /// Returns `None` outside of a tokio runtime.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl CountdownScheduler for TokioScheduler {
    fn schedule(&self, period: Duration, tick: TickCallback) -> CountdownHandle {
        let task = self.handle.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });
        CountdownHandle::new(move || task.abort())
    }
}

/// A scheduler driven by explicit [`ManualScheduler::advance`] calls.
///
/// Each call to `advance(n)` fires every active countdown `n` times. Useful
/// for tests and for hosts that own their own event loop.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

#[derive(Default)]
struct ManualInner {
    next_id: u64,
    active: Vec<(u64, TickCallback)>,
    scheduled: usize,
}

impl ManualScheduler {
    /// Creates a manual scheduler with no active countdowns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires all active countdowns `periods` times.
    pub fn advance(&self, periods: u32) {
        for _ in 0..periods {
            let callbacks: Vec<TickCallback> = self
                .inner
                .lock()
                .active
                .iter()
                .map(|(_, tick)| Arc::clone(tick))
                .collect();
            for tick in callbacks {
                tick();
            }
        }
    }

    /// Returns the number of countdowns currently scheduled.
    pub fn active_count(&self) -> usize {
        self.inner.lock().active.len()
    }

    /// Returns how many countdowns were ever scheduled.
    pub fn scheduled_count(&self) -> usize {
        self.inner.lock().scheduled
    }
}

impl CountdownScheduler for ManualScheduler {
    fn schedule(&self, _period: Duration, tick: TickCallback) -> CountdownHandle {
        let id = {
            let mut inner = self.inner.lock();
            inner.next_id += 1;
            inner.scheduled += 1;
            let id = inner.next_id;
            inner.active.push((id, tick));
            id
        };

        let inner = Arc::clone(&self.inner);
        CountdownHandle::new(move || {
            inner.lock().active.retain(|(active_id, _)| *active_id != id);
        })
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("active", &self.active_count())
            .finish()
    }
}
