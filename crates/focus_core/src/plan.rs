//! Freemium plan state and the plan gate.

use crate::error::{CoreError, CoreResult};
use crate::id::{now, Timestamp};
use crate::storage::{load_value, save_json, LocalStore};
use focus_timer::{Listener, Listeners, Subscription};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Storage key of the plan state.
pub const PLAN_STATE_KEY: &str = "freemium_state_v1";

/// Subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free plan, local only.
    #[default]
    Basic,
    /// Paid plan with cloud sync.
    Pro,
}

impl Plan {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "basic",
            Plan::Pro => "pro",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" | "free" => Ok(Plan::Basic),
            "pro" => Ok(Plan::Pro),
            other => Err(CoreError::invalid_input(format!("unknown plan: {other}"))),
        }
    }
}

/// Persisted plan state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanState {
    /// Current plan.
    pub plan: Plan,
    /// Signed-in user email, empty when signed out.
    #[serde(default)]
    pub user_email: String,
    /// Last change to the state.
    pub last_updated: Timestamp,
}

impl PlanState {
    fn fresh() -> Self {
        Self {
            plan: Plan::Basic,
            user_email: String::new(),
            last_updated: now(),
        }
    }

    fn from_value(value: serde_json::Value) -> Self {
        let mut state = Self::fresh();
        if let Some(plan) = value.get("plan").and_then(|p| p.as_str()) {
            // Anything other than "pro" is treated as the free plan.
            state.plan = if plan == "pro" { Plan::Pro } else { Plan::Basic };
        }
        if let Some(email) = value.get("userEmail").and_then(|e| e.as_str()) {
            state.user_email = email.to_string();
        }
        if let Some(ts) = value
            .get("lastUpdated")
            .and_then(|t| t.as_str())
            .and_then(crate::id::parse_timestamp)
        {
            state.last_updated = ts;
        }
        state
    }
}

/// Callback receiving the new plan state.
pub type PlanListener = Listener<PlanState>;

/// Answers whether paid features are available.
///
/// The sync manager depends only on this trait.
pub trait PlanGate: Send + Sync {
    /// Returns true on the paid plan.
    fn is_paid(&self) -> bool;

    /// Registers a listener for plan changes.
    ///
    /// The listener is not called with the current state.
    fn subscribe(&self, listener: PlanListener) -> Subscription;
}

/// Plan state persisted in a [`LocalStore`].
pub struct FreemiumState<S: LocalStore> {
    store: Arc<S>,
    state: RwLock<PlanState>,
    listeners: Arc<Listeners<PlanState>>,
}

impl<S: LocalStore> FreemiumState<S> {
    /// Loads the plan state, defaulting to the free plan.
    pub fn load(store: Arc<S>) -> Self {
        let state = load_value(store.as_ref(), PLAN_STATE_KEY)
            .map(PlanState::from_value)
            .unwrap_or_else(PlanState::fresh);
        tracing::debug!(plan = %state.plan, "plan state loaded");
        Self {
            store,
            state: RwLock::new(state),
            listeners: Listeners::new(),
        }
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> PlanState {
        self.state.read().clone()
    }

    /// Returns true on the paid plan.
    pub fn is_pro(&self) -> bool {
        self.state.read().plan == Plan::Pro
    }

    /// Changes the plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted; listeners are
    /// not notified in that case.
    pub fn set_plan(&self, plan: Plan) -> CoreResult<()> {
        self.update(|state| state.plan = plan)
    }

    /// Records the signed-in user's email.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub fn set_email(&self, email: impl Into<String>) -> CoreResult<()> {
        let email = email.into();
        self.update(|state| state.user_email = email)
    }

    /// Returns to the free plan and clears the email.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub fn reset(&self) -> CoreResult<()> {
        self.update(|state| {
            state.plan = Plan::Basic;
            state.user_email.clear();
        })
    }

    /// Fails with [`CoreError::PlanRequired`] unless on the paid plan.
    pub fn require_pro(&self, feature: &str) -> CoreResult<()> {
        if self.is_pro() {
            Ok(())
        } else {
            Err(CoreError::plan_required(feature))
        }
    }

    fn update(&self, change: impl FnOnce(&mut PlanState)) -> CoreResult<()> {
        let snapshot = {
            let mut state = self.state.write();
            let mut next = state.clone();
            change(&mut next);
            next.last_updated = now();
            save_json(self.store.as_ref(), PLAN_STATE_KEY, &next)?;
            *state = next.clone();
            next
        };
        tracing::info!(plan = %snapshot.plan, "plan state changed");
        self.listeners.emit(&snapshot);
        Ok(())
    }
}

impl<S: LocalStore> PlanGate for FreemiumState<S> {
    fn is_paid(&self) -> bool {
        self.is_pro()
    }

    fn subscribe(&self, listener: PlanListener) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

impl<S: LocalStore> fmt::Debug for FreemiumState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreemiumState")
            .field("state", &*self.state.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use parking_lot::Mutex;

    #[test]
    fn defaults_to_basic() {
        let plan = FreemiumState::load(Arc::new(MemoryStore::new()));
        assert!(!plan.is_pro());
        assert!(plan.require_pro("Ideas").is_err());
        assert_eq!(plan.state().user_email, "");
    }

    #[test]
    fn unknown_plan_is_basic() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(PLAN_STATE_KEY, r#"{"plan":"enterprise","userEmail":"a@b.c"}"#)
            .unwrap();
        let plan = FreemiumState::load(store);
        assert_eq!(plan.state().plan, Plan::Basic);
        assert_eq!(plan.state().user_email, "a@b.c");
    }

    struct ReadOnlyStore;

    impl LocalStore for ReadOnlyStore {
        fn read(&self, _key: &str) -> CoreResult<Option<String>> {
            Ok(None)
        }

        fn write(&self, _key: &str, _value: &str) -> CoreResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn remove(&self, _key: &str) -> CoreResult<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_save_keeps_previous_state() {
        let plan = FreemiumState::load(Arc::new(ReadOnlyStore));
        let before = plan.state();
        let seen = Arc::new(Mutex::new(0));
        let s = Arc::clone(&seen);
        let _sub = plan.subscribe(Arc::new(move |_: &PlanState| *s.lock() += 1));

        assert!(matches!(plan.set_plan(Plan::Pro), Err(CoreError::Io(_))));
        assert!(!plan.is_pro());
        assert_eq!(plan.state(), before);
        assert_eq!(*seen.lock(), 0);
    }

    #[test]
    fn set_plan_persists_and_notifies() {
        let store = Arc::new(MemoryStore::new());
        let plan = FreemiumState::load(Arc::clone(&store));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = plan.subscribe(Arc::new(move |state: &PlanState| s.lock().push(state.plan)));
        assert!(seen.lock().is_empty());

        plan.set_plan(Plan::Pro).unwrap();
        assert!(plan.is_pro());
        assert_eq!(*seen.lock(), vec![Plan::Pro]);

        let reloaded = FreemiumState::load(store);
        assert!(reloaded.is_pro());
    }

    #[test]
    fn reset_clears_email() {
        let plan = FreemiumState::load(Arc::new(MemoryStore::new()));
        plan.set_email("me@example.com").unwrap();
        plan.set_plan(Plan::Pro).unwrap();
        plan.reset().unwrap();

        let state = plan.state();
        assert_eq!(state.plan, Plan::Basic);
        assert!(state.user_email.is_empty());
    }

    #[test]
    fn corrupt_state_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store.write(PLAN_STATE_KEY, "{{{").unwrap();
        let plan = FreemiumState::load(store);
        assert_eq!(plan.state().plan, Plan::Basic);
    }
}
