//! Composition root.
//!
//! [`App`] owns the store, plan state, workspace and sync manager and wires
//! them together: workspace changes mark the app dirty, and the pending
//! upload runs once the workspace lock is released.

use crate::config::AppConfig;
use crate::error::CliResult;
use crate::http::ReqwestClient;
use focus_core::{
    load_value, save_json, CoreResult, FileStore, FreemiumState, LocalStore, PlanGate,
    Subscription, Timestamp, Workspace,
};
use focus_sync::{
    RestRemote, SyncConfig, SyncManager, SyncReport, SyncStatus, WorkspaceState,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Key of the last sync record.
pub const LAST_SYNC_KEY: &str = "focus_last_sync";

/// Remote client used by the binary.
pub type Remote = RestRemote<ReqwestClient>;

/// Sync manager used by the binary.
pub type AppSync = SyncManager<Remote, WorkspaceState<FileStore>>;

/// Outcome of the last finished sync, persisted for `sync status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastSync {
    /// Status text.
    pub status: String,
    /// When the status was reached.
    pub at: Timestamp,
}

/// The wired application.
pub struct App {
    config: AppConfig,
    store: Arc<FileStore>,
    plan: Arc<FreemiumState<FileStore>>,
    workspace: Arc<Mutex<Workspace<FileStore>>>,
    sync: Arc<AppSync>,
    dirty: Arc<AtomicBool>,
    _subscriptions: Vec<Subscription>,
}

impl App {
    /// Opens the data directory and wires every component.
    pub fn open(config: AppConfig) -> CliResult<Self> {
        let store = Arc::new(FileStore::open(&config.data_dir)?);
        let plan = Arc::new(FreemiumState::load(Arc::clone(&store)));
        let gate: Arc<dyn PlanGate> = plan.clone();
        let workspace = Arc::new(Mutex::new(Workspace::load(
            Arc::clone(&store),
            Arc::clone(&gate),
        )));

        let remote = match config.rest_config() {
            Some(rest) => match ReqwestClient::new() {
                Ok(client) => Some(RestRemote::new(rest, client)),
                Err(err) => {
                    tracing::warn!(error = %err, "HTTP client unavailable; running local-only");
                    None
                }
            },
            None => None,
        };
        let sync = Arc::new(SyncManager::new(
            SyncConfig::default(),
            remote,
            WorkspaceState::new(Arc::clone(&workspace)),
            gate,
        ));

        let dirty = Arc::new(AtomicBool::new(false));
        let mut subscriptions = Vec::new();
        {
            let dirty = Arc::clone(&dirty);
            subscriptions.push(workspace.lock().on_change(move |collection| {
                tracing::debug!(%collection, "local change");
                dirty.store(true, Ordering::SeqCst);
            }));
        }
        {
            let store = Arc::clone(&store);
            subscriptions.push(sync.on_status(move |status| {
                record_status(store.as_ref(), status);
            }));
        }

        Ok(Self {
            config,
            store,
            plan,
            workspace,
            sync,
            dirty,
            _subscriptions: subscriptions,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the plan state.
    pub fn plan(&self) -> &Arc<FreemiumState<FileStore>> {
        &self.plan
    }

    /// Returns the sync manager.
    pub fn sync(&self) -> &Arc<AppSync> {
        &self.sync
    }

    /// Runs `read` with the workspace locked.
    pub fn read<T>(&self, read: impl FnOnce(&Workspace<FileStore>) -> T) -> T {
        read(&self.workspace.lock())
    }

    /// Runs `change` with the workspace locked, then queues an upload if
    /// anything changed.
    pub fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Workspace<FileStore>) -> CoreResult<T>,
    ) -> CliResult<T> {
        let result = change(&mut self.workspace.lock());
        self.flush();
        Ok(result?)
    }

    /// Queues an upload if the workspace changed since the last one.
    pub fn flush(&self) {
        if self.dirty.swap(false, Ordering::SeqCst) {
            self.sync.queue_sync();
        }
    }

    /// Starts sync: pulls remote data when possible and watches the plan.
    pub fn bootstrap(&self) -> Option<SyncReport> {
        match self.sync.bootstrap() {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(error = %err, "initial sync failed");
                None
            }
        }
    }

    /// Returns the last persisted sync record.
    pub fn last_sync(&self) -> Option<LastSync> {
        load_value(self.store.as_ref(), LAST_SYNC_KEY)
            .and_then(|value| serde_json::from_value(value).ok())
    }
}

fn record_status(store: &dyn LocalStore, status: &SyncStatus) {
    if status.is_active() {
        return;
    }
    let record = LastSync {
        status: status.to_string(),
        at: focus_core::now(),
    };
    if let Err(err) = save_json(store, LAST_SYNC_KEY, &record) {
        tracing::warn!(error = %err, "failed to record sync status");
    }
}
