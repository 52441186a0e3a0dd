//! Local side of a sync cycle.
//!
//! The manager reads local records through [`LocalState::snapshot`] and hands
//! pulled records to [`LocalState::apply_remote`]. The host decides how they
//! are merged and persisted; [`WorkspaceState`] merges with
//! [`merge_collections`] and writes through the workspace.

use crate::error::SyncResult;
use crate::merge::merge_collections;
use focus_core::{
    Collection, Collections, Goal, Idea, LocalStore, Project, Record, Task, TimerSession, Workspace,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Records pulled from the remote store.
///
/// A collection is `None` when its pull failed; it is then left untouched
/// locally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteCollections {
    /// Pulled projects.
    pub projects: Option<Vec<Project>>,
    /// Pulled tasks.
    pub tasks: Option<Vec<Task>>,
    /// Pulled sessions.
    pub sessions: Option<Vec<TimerSession>>,
    /// Pulled goals.
    pub goals: Option<Vec<Goal>>,
    /// Pulled ideas.
    pub ideas: Option<Vec<Idea>>,
}

impl RemoteCollections {
    /// Returns the collections that were pulled.
    pub fn present(&self) -> Vec<Collection> {
        Collection::ALL
            .into_iter()
            .filter(|c| match c {
                Collection::Projects => self.projects.is_some(),
                Collection::Tasks => self.tasks.is_some(),
                Collection::Sessions => self.sessions.is_some(),
                Collection::Goals => self.goals.is_some(),
                Collection::Ideas => self.ideas.is_some(),
            })
            .collect()
    }

    /// Merges every pulled collection into `local`.
    pub fn merge_into(self, local: &mut Collections) {
        fn merge<T: Record>(local: &mut Vec<T>, remote: Option<Vec<T>>) {
            if let Some(remote) = remote {
                *local = merge_collections(local, &remote);
            }
        }
        merge(&mut local.projects, self.projects);
        merge(&mut local.tasks, self.tasks);
        merge(&mut local.sessions, self.sessions);
        merge(&mut local.goals, self.goals);
        merge(&mut local.ideas, self.ideas);
    }
}

/// Host state the sync manager reads from and writes to.
pub trait LocalState: Send + Sync {
    /// Returns the current local records, or `None` when nothing is loaded.
    fn snapshot(&self) -> Option<Collections>;

    /// Merges pulled records into local state and persists the result.
    fn apply_remote(&self, remote: RemoteCollections) -> SyncResult<()>;
}

impl<L: LocalState + ?Sized> LocalState for Arc<L> {
    fn snapshot(&self) -> Option<Collections> {
        (**self).snapshot()
    }

    fn apply_remote(&self, remote: RemoteCollections) -> SyncResult<()> {
        (**self).apply_remote(remote)
    }
}

/// [`LocalState`] over a shared [`Workspace`].
pub struct WorkspaceState<S: LocalStore> {
    workspace: Arc<Mutex<Workspace<S>>>,
}

impl<S: LocalStore> WorkspaceState<S> {
    /// Wraps a shared workspace.
    pub fn new(workspace: Arc<Mutex<Workspace<S>>>) -> Self {
        Self { workspace }
    }

    /// Returns the shared workspace.
    pub fn workspace(&self) -> &Arc<Mutex<Workspace<S>>> {
        &self.workspace
    }
}

impl<S: LocalStore> LocalState for WorkspaceState<S> {
    fn snapshot(&self) -> Option<Collections> {
        Some(self.workspace.lock().collections().clone())
    }

    fn apply_remote(&self, remote: RemoteCollections) -> SyncResult<()> {
        let mut workspace = self.workspace.lock();
        let mut merged = workspace.collections().clone();
        remote.merge_into(&mut merged);
        workspace.replace_collections(merged)?;
        Ok(())
    }
}

/// In-memory [`LocalState`] for tests.
#[derive(Debug, Default)]
pub struct MemoryLocalState {
    data: RwLock<Option<Collections>>,
}

impl MemoryLocalState {
    /// Creates a state holding `data`.
    pub fn new(data: Collections) -> Self {
        Self {
            data: RwLock::new(Some(data)),
        }
    }

    /// Creates a state with nothing loaded.
    pub fn unloaded() -> Self {
        Self::default()
    }

    /// Returns a copy of the current data.
    pub fn data(&self) -> Option<Collections> {
        self.data.read().clone()
    }

    /// Mutates the data in place, loading an empty set first if needed.
    pub fn update(&self, change: impl FnOnce(&mut Collections)) {
        let mut data = self.data.write();
        change(data.get_or_insert_with(Collections::default));
    }
}

impl LocalState for MemoryLocalState {
    fn snapshot(&self) -> Option<Collections> {
        self.data()
    }

    fn apply_remote(&self, remote: RemoteCollections) -> SyncResult<()> {
        self.update(|data| remote.merge_into(data));
        Ok(())
    }
}
