//! Sync manager: push, pull, coalescing and bootstrap.

use crate::applier::{LocalState, RemoteCollections};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::{RemoteClient, RemoteUser};
use crate::schema::RemoteRecord;
use crate::status::{
    CollectionOutcome, SkipReason, SyncDirection, SyncReport, SyncStats, SyncStatus,
};
use focus_core::{
    now, Collection, Goal, Idea, PlanGate, Project, Subscription, Task, Timestamp, TimerSession,
};
use focus_timer::Listeners;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

/// Holds the in-flight flag for the lifetime of a cycle.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum Preflight<'a, R> {
    Ready(&'a R, RemoteUser),
    Skip(SkipReason),
}

/// Keeps local collections and the remote store in step.
///
/// At most one cycle runs at a time. Every cycle first checks, in order,
/// that a remote client is configured, that the plan is paid and that a user
/// is signed in; no remote call is made before the plan check passes.
///
/// # Example
///
/// ```rust
/// use focus_core::{Collections, FreemiumState, MemoryStore, Plan, PlanGate};
/// use focus_sync::{MemoryLocalState, MemoryRemote, RemoteUser, SyncConfig, SyncManager, SyncStatus};
/// use std::sync::Arc;
///
/// let plan = Arc::new(FreemiumState::load(Arc::new(MemoryStore::new())));
/// let gate: Arc<dyn PlanGate> = plan.clone();
/// let remote = Arc::new(MemoryRemote::with_user(RemoteUser::new("u-1")));
///
/// let manager = SyncManager::new(
///     SyncConfig::default(),
///     Some(Arc::clone(&remote)),
///     MemoryLocalState::new(Collections::default()),
///     gate,
/// );
///
/// let report = manager.sync_up().unwrap();
/// assert!(!report.ran());
/// assert_eq!(manager.status(), SyncStatus::OfflineFreePlan);
/// assert_eq!(remote.call_count(), 0);
///
/// plan.set_plan(Plan::Pro).unwrap();
/// assert!(manager.sync_up().unwrap().ran());
/// ```
pub struct SyncManager<R: RemoteClient, L: LocalState> {
    config: SyncConfig,
    remote: Option<R>,
    local: L,
    plan: Arc<dyn PlanGate>,
    in_flight: AtomicBool,
    last_paid: AtomicBool,
    status: RwLock<SyncStatus>,
    listeners: Arc<Listeners<SyncStatus>>,
    stats: RwLock<SyncStats>,
    plan_subscription: Mutex<Option<Subscription>>,
}

impl<R: RemoteClient, L: LocalState> SyncManager<R, L> {
    /// Creates a manager. Pass `None` for `remote` to run local-only.
    pub fn new(config: SyncConfig, remote: Option<R>, local: L, plan: Arc<dyn PlanGate>) -> Self {
        let paid = plan.is_paid();
        Self {
            config,
            remote,
            local,
            plan,
            in_flight: AtomicBool::new(false),
            last_paid: AtomicBool::new(paid),
            status: RwLock::new(SyncStatus::Idle),
            listeners: Listeners::new(),
            stats: RwLock::new(SyncStats::default()),
            plan_subscription: Mutex::new(None),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the local state.
    pub fn local(&self) -> &L {
        &self.local
    }

    /// Returns true when a remote client is configured.
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Returns the last reported status.
    pub fn status(&self) -> SyncStatus {
        self.status.read().clone()
    }

    /// Returns a copy of the counters.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns true while a cycle runs.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Registers a status listener. It is called on every status change,
    /// synchronously on the syncing thread.
    pub fn on_status(
        &self,
        listener: impl Fn(&SyncStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.listeners.subscribe(Arc::new(listener))
    }

    /// Uploads every local collection.
    ///
    /// Records are upserted by id; local deletions are not propagated. A
    /// failing collection is logged and reported, and the others proceed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the signed-in user cannot be determined.
    pub fn sync_up(&self) -> SyncResult<SyncReport> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("sync_up skipped: cycle in flight");
            return Ok(SyncReport::skipped(SyncDirection::Up, SkipReason::InFlight));
        };
        let start = Instant::now();
        let (remote, user) = match self.preflight()? {
            Preflight::Ready(remote, user) => (remote, user),
            Preflight::Skip(reason) => return Ok(SyncReport::skipped(SyncDirection::Up, reason)),
        };
        let Some(data) = self.local.snapshot() else {
            return Ok(SyncReport::skipped(SyncDirection::Up, SkipReason::NoLocalState));
        };

        self.set_status(SyncStatus::Pushing);
        let at = now();
        let collections = vec![
            (Collection::Projects, self.push(remote, &user.id, &data.projects, at)),
            (Collection::Tasks, self.push(remote, &user.id, &data.tasks, at)),
            (Collection::Sessions, self.push(remote, &user.id, &data.sessions, at)),
            (Collection::Goals, self.push(remote, &user.id, &data.goals, at)),
            (Collection::Ideas, self.push(remote, &user.id, &data.ideas, at)),
        ];

        let report = SyncReport {
            direction: SyncDirection::Up,
            skipped: None,
            collections,
            duration: start.elapsed(),
        };
        self.finish(&report, SyncStatus::Synced);
        Ok(report)
    }

    /// Downloads every remote collection and hands it to the local state.
    ///
    /// A collection whose select fails is left out of the handoff and keeps
    /// its local records.
    ///
    /// # Errors
    ///
    /// Returns an error if the signed-in user cannot be determined or the
    /// local state rejects the pulled records.
    pub fn sync_down(&self) -> SyncResult<SyncReport> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("sync_down skipped: cycle in flight");
            return Ok(SyncReport::skipped(SyncDirection::Down, SkipReason::InFlight));
        };
        let start = Instant::now();
        let (remote, user) = match self.preflight()? {
            Preflight::Ready(remote, user) => (remote, user),
            Preflight::Skip(reason) => return Ok(SyncReport::skipped(SyncDirection::Down, reason)),
        };

        self.set_status(SyncStatus::Pulling);
        let mut collections = Vec::with_capacity(Collection::ALL.len());
        let mut pulled = RemoteCollections::default();

        let (outcome, records) = self.pull::<Project>(remote, &user.id);
        collections.push((Collection::Projects, outcome));
        pulled.projects = records;
        let (outcome, records) = self.pull::<Task>(remote, &user.id);
        collections.push((Collection::Tasks, outcome));
        pulled.tasks = records;
        let (outcome, records) = self.pull::<TimerSession>(remote, &user.id);
        collections.push((Collection::Sessions, outcome));
        pulled.sessions = records;
        let (outcome, records) = self.pull::<Goal>(remote, &user.id);
        collections.push((Collection::Goals, outcome));
        pulled.goals = records;
        let (outcome, records) = self.pull::<Idea>(remote, &user.id);
        collections.push((Collection::Ideas, outcome));
        pulled.ideas = records;

        if let Err(err) = self.local.apply_remote(pulled) {
            self.fail(&err);
            return Err(err);
        }

        let report = SyncReport {
            direction: SyncDirection::Down,
            skipped: None,
            collections,
            duration: start.elapsed(),
        };
        self.finish(&report, SyncStatus::Pulled);
        Ok(report)
    }

    /// Requests an upload after a local change.
    ///
    /// The request is dropped when a cycle is already in flight; the next
    /// change queues another. Returns true if an upload ran.
    pub fn queue_sync(&self) -> bool {
        if self.is_in_flight() {
            self.stats.write().dropped_requests += 1;
            tracing::debug!("sync request dropped: cycle in flight");
            return false;
        }
        match self.sync_up() {
            Ok(report) => {
                if report.skipped == Some(SkipReason::InFlight) {
                    self.stats.write().dropped_requests += 1;
                }
                report.ran()
            }
            Err(err) => {
                tracing::warn!(error = %err, "queued sync failed");
                false
            }
        }
    }

    fn preflight(&self) -> SyncResult<Preflight<'_, R>> {
        let Some(remote) = self.remote.as_ref() else {
            self.set_status(SyncStatus::OfflineNoClient);
            return Ok(Preflight::Skip(SkipReason::NoRemote));
        };
        if !self.plan.is_paid() {
            self.set_status(SyncStatus::OfflineFreePlan);
            return Ok(Preflight::Skip(SkipReason::FreePlan));
        }
        match remote.current_user() {
            Ok(Some(user)) => Ok(Preflight::Ready(remote, user)),
            Ok(None) => {
                self.set_status(SyncStatus::OfflineNotSignedIn);
                Ok(Preflight::Skip(SkipReason::NotSignedIn))
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    fn push<T: RemoteRecord>(
        &self,
        remote: &R,
        user_id: &str,
        records: &[T],
        at: Timestamp,
    ) -> CollectionOutcome {
        if records.is_empty() {
            return CollectionOutcome::Empty;
        }
        let table = self.config.table(T::COLLECTION);
        let rows = records
            .iter()
            .map(|record| serde_json::to_value(record.to_row(user_id, &self.config, at)))
            .collect::<Result<Vec<Value>, _>>();
        let result = rows
            .map_err(SyncError::from)
            .and_then(|rows| {
                remote
                    .upsert(table, &rows, &self.config.conflict_column)
                    .map(|()| rows.len())
            });
        match result {
            Ok(count) => {
                tracing::debug!(table, rows = count, "collection pushed");
                CollectionOutcome::Pushed(count)
            }
            Err(err) => {
                tracing::warn!(table, error = %err, "collection push failed");
                CollectionOutcome::Failed(err.to_string())
            }
        }
    }

    fn pull<T: RemoteRecord>(
        &self,
        remote: &R,
        user_id: &str,
    ) -> (CollectionOutcome, Option<Vec<T>>) {
        let table = self.config.table(T::COLLECTION);
        match remote.select_by_user(table, &self.config.user_column, user_id) {
            Ok(rows) => {
                let records: Vec<T> = rows
                    .into_iter()
                    .filter_map(|row| match serde_json::from_value::<T::Row>(row) {
                        Ok(row) => T::from_row(row, &self.config),
                        Err(err) => {
                            tracing::warn!(table, error = %err, "skipping undecodable row");
                            None
                        }
                    })
                    .collect();
                tracing::debug!(table, rows = records.len(), "collection pulled");
                (CollectionOutcome::Pulled(records.len()), Some(records))
            }
            Err(err) => {
                tracing::warn!(table, error = %err, "collection pull failed");
                (CollectionOutcome::Failed(err.to_string()), None)
            }
        }
    }

    fn finish(&self, report: &SyncReport, done: SyncStatus) {
        let failed = report.failed_count();
        {
            let mut stats = self.stats.write();
            match report.direction {
                SyncDirection::Up => {
                    stats.pushes += 1;
                    stats.rows_pushed += report.rows() as u64;
                }
                SyncDirection::Down => {
                    stats.pulls += 1;
                    stats.rows_pulled += report.rows() as u64;
                }
            }
            stats.collection_failures += failed as u64;
            stats.last_sync_time = Some(Instant::now());
            if failed == 0 {
                stats.last_error = None;
            }
        }
        tracing::info!(
            direction = ?report.direction,
            rows = report.rows(),
            failed,
            elapsed_ms = report.duration.as_millis() as u64,
            "sync cycle finished"
        );
        if failed == 0 {
            self.set_status(done);
        } else {
            self.set_status(SyncStatus::PartiallySynced { failed });
        }
    }

    fn fail(&self, err: &SyncError) {
        tracing::warn!(error = %err, "sync cycle failed");
        self.stats.write().last_error = Some(err.to_string());
        self.set_status(SyncStatus::Failed(err.to_string()));
    }

    fn set_status(&self, status: SyncStatus) {
        {
            let mut current = self.status.write();
            if *current == status {
                return;
            }
            *current = status.clone();
        }
        tracing::debug!(%status, "sync status changed");
        self.listeners.emit(&status);
    }
}

impl<R, L> SyncManager<R, L>
where
    R: RemoteClient + 'static,
    L: LocalState + 'static,
{
    /// Starts sync for a freshly loaded workspace.
    ///
    /// Without a remote client the manager stays offline. Otherwise it
    /// subscribes to plan changes, so that an upgrade to the paid plan pulls
    /// remote data, and pulls immediately when already paid. Returns the
    /// pull report, or `None` when no pull ran.
    ///
    /// # Errors
    ///
    /// Returns the error of the initial pull.
    pub fn bootstrap(self: &Arc<Self>) -> SyncResult<Option<SyncReport>> {
        if self.remote.is_none() {
            self.set_status(SyncStatus::OfflineNoClient);
            return Ok(None);
        }
        self.watch_plan();

        let paid = self.plan.is_paid();
        self.last_paid.store(paid, Ordering::SeqCst);
        if !paid {
            self.set_status(SyncStatus::OfflineFreePlan);
            return Ok(None);
        }
        self.sync_down().map(Some)
    }

    fn watch_plan(self: &Arc<Self>) {
        let mut slot = self.plan_subscription.lock();
        if slot.is_some() {
            return;
        }
        let weak: Weak<Self> = Arc::downgrade(self);
        *slot = Some(self.plan.subscribe(Arc::new(move |_state| {
            let Some(manager) = weak.upgrade() else {
                return;
            };
            let paid = manager.plan.is_paid();
            let was_paid = manager.last_paid.swap(paid, Ordering::SeqCst);
            if paid && !was_paid {
                tracing::info!("plan upgraded, pulling remote data");
                if let Err(err) = manager.sync_down() {
                    tracing::warn!(error = %err, "pull after upgrade failed");
                }
            } else if !paid {
                manager.set_status(SyncStatus::OfflineFreePlan);
            }
        })));
    }
}

impl<R: RemoteClient, L: LocalState> Drop for SyncManager<R, L> {
    fn drop(&mut self) {
        if let Some(subscription) = self.plan_subscription.get_mut().take() {
            subscription.unsubscribe();
        }
    }
}

impl<R: RemoteClient, L: LocalState> fmt::Debug for SyncManager<R, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncManager")
            .field("has_remote", &self.has_remote())
            .field("status", &*self.status.read())
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}
