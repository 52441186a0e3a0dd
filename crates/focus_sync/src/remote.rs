//! Remote store abstraction.
//!
//! The sync manager talks to the hosted database only through
//! [`RemoteClient`]. Rows travel as JSON values; translation to typed records
//! happens in the schema layer.

use crate::error::{SyncError, SyncResult};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The signed-in remote user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    /// User id, written to the user column of every row.
    pub id: String,
    /// Email, if the backend reports one.
    pub email: Option<String>,
}

impl RemoteUser {
    /// Creates a user without email.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

/// Client for the remote row store.
pub trait RemoteClient: Send + Sync {
    /// Returns the signed-in user, or `None` when not authenticated.
    fn current_user(&self) -> SyncResult<Option<RemoteUser>>;

    /// Returns every row of `table` whose `user_column` equals `user_id`.
    fn select_by_user(&self, table: &str, user_column: &str, user_id: &str)
        -> SyncResult<Vec<Value>>;

    /// Inserts or updates `rows`, resolving conflicts on `on_conflict`.
    fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> SyncResult<()>;
}

impl<R: RemoteClient + ?Sized> RemoteClient for Arc<R> {
    fn current_user(&self) -> SyncResult<Option<RemoteUser>> {
        (**self).current_user()
    }

    fn select_by_user(
        &self,
        table: &str,
        user_column: &str,
        user_id: &str,
    ) -> SyncResult<Vec<Value>> {
        (**self).select_by_user(table, user_column, user_id)
    }

    fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> SyncResult<()> {
        (**self).upsert(table, rows, on_conflict)
    }
}

type UpsertHook = Arc<dyn Fn(&str) + Send + Sync>;

/// In-process remote store for tests and offline demos.
///
/// Counts every call, including `current_user`, and can be told to fail
/// requests against particular tables.
#[derive(Default)]
pub struct MemoryRemote {
    user: RwLock<Option<RemoteUser>>,
    tables: RwLock<HashMap<String, Vec<Value>>>,
    failing: RwLock<HashSet<String>>,
    calls: AtomicUsize,
    upsert_hook: Mutex<Option<UpsertHook>>,
}

impl MemoryRemote {
    /// Creates an empty store with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with `user` signed in.
    pub fn with_user(user: RemoteUser) -> Self {
        let remote = Self::new();
        remote.set_user(Some(user));
        remote
    }

    /// Signs a user in or out.
    pub fn set_user(&self, user: Option<RemoteUser>) {
        *self.user.write() = user;
    }

    /// Appends rows to `table` without going through `upsert`.
    pub fn insert_rows(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Returns a copy of the rows of `table`.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// Makes every request against `table` fail with a server error.
    pub fn fail_table(&self, table: &str) {
        self.failing.write().insert(table.to_string());
    }

    /// Clears all injected failures.
    pub fn heal(&self) {
        self.failing.write().clear();
    }

    /// Returns the number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Installs a hook run at the start of every `upsert`, before any row is
    /// stored. Used to observe calls made while a sync is in flight.
    pub fn set_upsert_hook(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.upsert_hook.lock() = Some(Arc::new(hook));
    }

    fn check(&self, table: &str) -> SyncResult<()> {
        if self.failing.read().contains(table) {
            return Err(SyncError::remote(table, 503, "injected failure"));
        }
        Ok(())
    }
}

impl RemoteClient for MemoryRemote {
    fn current_user(&self) -> SyncResult<Option<RemoteUser>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.user.read().clone())
    }

    fn select_by_user(
        &self,
        table: &str,
        user_column: &str,
        user_id: &str,
    ) -> SyncResult<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check(table)?;
        Ok(self
            .tables
            .read()
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.get(user_column).and_then(Value::as_str) == Some(user_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> SyncResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hook = self.upsert_hook.lock().clone();
        if let Some(hook) = hook {
            hook(table);
        }
        self.check(table)?;

        let mut tables = self.tables.write();
        let stored = tables.entry(table.to_string()).or_default();
        for row in rows {
            let key = row.get(on_conflict).cloned();
            match stored
                .iter_mut()
                .find(|existing| key.is_some() && existing.get(on_conflict).cloned() == key)
            {
                Some(existing) => *existing = row.clone(),
                None => stored.push(row.clone()),
            }
        }
        tracing::trace!(table, rows = rows.len(), "memory upsert");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read();
        let mut names: Vec<&String> = tables.keys().collect();
        names.sort();
        f.debug_struct("MemoryRemote")
            .field("user", &*self.user.read())
            .field("tables", &names)
            .field("calls", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row_id(row: &Value) -> Option<&str> {
        row.get("id").and_then(Value::as_str)
    }

    #[test]
    fn select_filters_by_user() {
        let remote = MemoryRemote::new();
        remote.insert_rows(
            "tasks",
            [
                json!({ "id": "a", "user_id": "u1" }),
                json!({ "id": "b", "user_id": "u2" }),
            ],
        );
        let rows = remote.select_by_user("tasks", "user_id", "u1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(row_id(&rows[0]), Some("a"));
        assert!(remote
            .select_by_user("missing", "user_id", "u1")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn upsert_replaces_by_conflict_column() {
        let remote = MemoryRemote::new();
        remote
            .upsert("tasks", &[json!({ "id": "a", "title": "one" })], "id")
            .unwrap();
        remote
            .upsert(
                "tasks",
                &[
                    json!({ "id": "a", "title": "two" }),
                    json!({ "id": "b", "title": "three" }),
                ],
                "id",
            )
            .unwrap();
        let rows = remote.rows("tasks");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], "two");
        assert_eq!(remote.call_count(), 2);
    }

    #[test]
    fn injected_failures() {
        let remote = MemoryRemote::new();
        remote.fail_table("goals");
        let err = remote.upsert("goals", &[], "id").unwrap_err();
        assert!(err.is_retryable());
        remote.heal();
        assert!(remote.upsert("goals", &[], "id").is_ok());
    }

    #[test]
    fn current_user_is_counted() {
        let remote = MemoryRemote::with_user(RemoteUser::new("u1"));
        assert_eq!(remote.current_user().unwrap().unwrap().id, "u1");
        remote.set_user(None);
        assert!(remote.current_user().unwrap().is_none());
        assert_eq!(remote.call_count(), 2);
    }
}
