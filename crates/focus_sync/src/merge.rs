//! Last-write-wins merge of record collections.
//!
//! For every distinct non-empty key the record with the latest effective
//! timestamp (`updated_at`, else `created_at`, else the epoch) is kept. On
//! equal timestamps the record seen later wins; since local records are
//! iterated before remote ones, remote wins ties. The output keeps the order
//! in which keys first appear in `local` followed by `remote`, and a replaced
//! record keeps the slot of the key.
//!
//! Merging is idempotent (`merge(merge(a, b), b) == merge(a, b)`) but not
//! commutative on ties.

use focus_core::Record;
use std::collections::HashMap;

/// Merges two collections keyed by record id.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use focus_core::Task;
/// use focus_sync::merge_collections;
///
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
///
/// let mut local = Task::new("t-1", "edited locally", None, t0);
/// local.updated_at = Some(t1);
/// let remote = Task::new("t-1", "stale copy", None, t0);
///
/// let merged = merge_collections(&[local], &[remote]);
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].title, "edited locally");
/// ```
pub fn merge_collections<T: Record>(local: &[T], remote: &[T]) -> Vec<T> {
    merge_collections_by(local, remote, |record| record.id())
}

/// Merges two collections using `key` to identify records.
///
/// Records whose key is empty are dropped.
pub fn merge_collections_by<T, F>(local: &[T], remote: &[T], key: F) -> Vec<T>
where
    T: Record,
    F: Fn(&T) -> &str,
{
    let mut merged: Vec<T> = Vec::with_capacity(local.len() + remote.len());
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(local.len() + remote.len());

    for record in local.iter().chain(remote) {
        let k = key(record);
        if k.is_empty() {
            continue;
        }
        match slots.get(k) {
            Some(&slot) => {
                if record.effective_timestamp() >= merged[slot].effective_timestamp() {
                    merged[slot] = record.clone();
                }
            }
            None => {
                slots.insert(k, merged.len());
                merged.push(record.clone());
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use focus_core::{Task, Timestamp};

    fn ts(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn task(id: &str, title: &str, updated: Option<u32>) -> Task {
        let mut t = Task::new(id, title, None, ts(1));
        t.updated_at = updated.map(ts);
        t
    }

    #[test]
    fn later_timestamp_wins() {
        let local = vec![task("a", "local", Some(5))];
        let remote = vec![task("a", "remote", Some(3))];
        assert_eq!(merge_collections(&local, &remote)[0].title, "local");
        assert_eq!(merge_collections(&remote, &local)[0].title, "local");
    }

    #[test]
    fn remote_wins_ties() {
        let local = vec![task("a", "local", Some(5))];
        let remote = vec![task("a", "remote", Some(5))];
        assert_eq!(merge_collections(&local, &remote)[0].title, "remote");
    }

    #[test]
    fn created_at_used_without_updated_at() {
        let local = vec![task("a", "local", None)];
        let remote = vec![task("a", "remote", Some(2))];
        assert_eq!(merge_collections(&local, &remote)[0].title, "remote");
    }

    #[test]
    fn order_follows_first_appearance() {
        let local = vec![task("b", "b", None), task("a", "a-old", Some(2))];
        let remote = vec![task("c", "c", None), task("a", "a-new", Some(3))];
        let merged = merge_collections(&local, &remote);
        let ids: Vec<&str> = merged.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(merged[1].title, "a-new");
    }

    #[test]
    fn empty_keys_are_dropped() {
        let local = vec![task("", "nameless", None), task("a", "a", None)];
        let merged = merge_collections(&local, &[]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn custom_key() {
        let local = vec![task("1", "same", Some(2)), task("2", "same", Some(4))];
        let merged = merge_collections_by(&local, &[], |t| t.title.as_str());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "2");
    }
}
