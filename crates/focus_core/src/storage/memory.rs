//! In-memory store for tests and ephemeral sessions.

use super::LocalStore;
use crate::error::CoreResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A [`LocalStore`] kept entirely in memory.
///
/// # Example
///
/// ```rust
/// use focus_core::{LocalStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.write("focus_active_project", "general").unwrap();
/// assert_eq!(store.read("focus_active_project").unwrap().as_deref(), Some("general"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl LocalStore for MemoryStore {
    fn read(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> CoreResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.read("a").unwrap(), None);

        store.write("a", "1").unwrap();
        store.write("a", "2").unwrap();
        assert_eq!(store.read("a").unwrap().as_deref(), Some("2"));

        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(store.keys().is_empty());
    }
}
