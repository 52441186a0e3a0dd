//! Local persistence boundary.
//!
//! A [`LocalStore`] is a string key/value store, the shape of browser
//! `localStorage`. Typed access goes through [`load_json`] and [`save_json`].
//! Loading never fails: missing or corrupt values fall back to a default and
//! a warning is logged.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::CoreResult;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A string key/value store.
///
/// # Thread Safety
///
/// Implementations must be safe to share across threads.
pub trait LocalStore: Send + Sync {
    /// Reads the raw value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written.
    fn read(&self, key: &str) -> CoreResult<Option<String>>;

    /// Replaces the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> CoreResult<()>;
}

impl<S: LocalStore + ?Sized> LocalStore for std::sync::Arc<S> {
    fn read(&self, key: &str) -> CoreResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> CoreResult<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        (**self).remove(key)
    }
}

/// Loads the raw JSON value stored under `key`.
///
/// Returns `None` when the key is missing, unreadable or not valid JSON.
pub fn load_value(store: &dyn LocalStore, key: &str) -> Option<serde_json::Value> {
    let raw = match store.read(key) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => return None,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read local value");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding corrupt local value");
            None
        }
    }
}

/// Loads and decodes the value stored under `key`, or returns `fallback`.
pub fn load_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str, fallback: T) -> T {
    let Some(value) = load_value(store, key) else {
        return fallback;
    };
    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::warn!(key, error = %err, "local value has unexpected shape");
            fallback
        }
    }
}

/// Encodes `value` as JSON and stores it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn LocalStore,
    key: &str,
    value: &T,
) -> CoreResult<()> {
    let encoded = serde_json::to_string(value)?;
    store.write(key, &encoded)
}
