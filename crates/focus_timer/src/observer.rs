//! Synchronous observer lists.
//!
//! A [`Listeners`] set fans an event out to every registered callback on the
//! emitting thread, in registration order. Callbacks are snapshotted before
//! delivery, so a callback may subscribe or unsubscribe (itself included)
//! without deadlocking; such changes take effect from the next emission.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// A registered callback.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// An ordered set of listeners for events of type `E`.
pub struct Listeners<E> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Listener<E>)>>,
}

impl<E: 'static> Listeners<E> {
    /// Creates an empty listener set.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        })
    }

    /// Registers a listener, returning the handle that detaches it.
    pub fn subscribe(self: &Arc<Self>, listener: Listener<E>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().push((id, listener));

        let weak: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(set) = weak.upgrade() {
                set.entries.write().retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Delivers `event` to every listener registered at the time of the call.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .entries
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.read().len())
            .finish()
    }
}

/// Handle returned by every `subscribe`/`on_*` call.
///
/// Dropping the handle keeps the listener attached; call
/// [`Subscription::unsubscribe`] to detach it.
#[must_use = "keep the subscription to be able to detach the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Creates a subscription that runs `detach` when unsubscribed.
    pub fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A subscription with nothing to detach.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    /// Detaches the listener.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn emit_in_registration_order() {
        let listeners = Listeners::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = Arc::clone(&seen);
        let _a = listeners.subscribe(Arc::new(move |v: &u32| s1.lock().push(("a", *v))));
        let s2 = Arc::clone(&seen);
        let _b = listeners.subscribe(Arc::new(move |v: &u32| s2.lock().push(("b", *v))));

        listeners.emit(&7);
        assert_eq!(*seen.lock(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_detaches() {
        let listeners = Listeners::<u32>::new();
        let count = Arc::new(AtomicU64::new(0));

        let c = Arc::clone(&count);
        let sub = listeners.subscribe(Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        listeners.emit(&1);
        sub.unsubscribe();
        listeners.emit(&2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn listener_may_subscribe_during_emit() {
        let listeners = Listeners::<u32>::new();
        let inner = Arc::clone(&listeners);
        let _outer = listeners.subscribe(Arc::new(move |_| {
            let _ = inner.subscribe(Arc::new(|_| {}));
        }));

        listeners.emit(&1);
        assert_eq!(listeners.len(), 2);
    }

    #[test]
    fn unsubscribe_after_set_dropped_is_harmless() {
        let listeners = Listeners::<u32>::new();
        let sub = listeners.subscribe(Arc::new(|_| {}));
        drop(listeners);
        sub.unsubscribe();
    }
}
