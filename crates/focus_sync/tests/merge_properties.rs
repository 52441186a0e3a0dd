//! Property tests for the last-write-wins merge.

use chrono::{Duration, TimeZone, Utc};
use focus_core::{Record, Task, Timestamp};
use focus_sync::merge_collections;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn base() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        prop_oneof![4 => "[a-e]", 1 => Just(String::new())],
        "[a-z]{1,6}",
        0i64..4,
        proptest::option::of(0i64..6),
    )
        .prop_map(|(id, title, created, updated)| {
            let mut task = Task::new(id, title, None, base() + Duration::hours(created));
            task.updated_at = updated.map(|h| base() + Duration::hours(h));
            task
        })
}

fn arb_side() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(arb_task(), 0..12)
}

proptest! {
    #[test]
    fn merge_is_idempotent(local in arb_side(), remote in arb_side()) {
        let once = merge_collections(&local, &remote);
        let twice = merge_collections(&once, &remote);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_keeps_every_key_once(local in arb_side(), remote in arb_side()) {
        let merged = merge_collections(&local, &remote);

        let expected: HashSet<&str> = local
            .iter()
            .chain(&remote)
            .map(|t| t.id.as_str())
            .filter(|id| !id.is_empty())
            .collect();
        let ids: Vec<&str> = merged.iter().map(|t| t.id.as_str()).collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();

        prop_assert_eq!(ids.len(), unique.len());
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn merge_keeps_latest_timestamp(local in arb_side(), remote in arb_side()) {
        let merged = merge_collections(&local, &remote);

        let mut latest: HashMap<&str, Timestamp> = HashMap::new();
        for task in local.iter().chain(&remote).filter(|t| !t.id.is_empty()) {
            let ts = task.effective_timestamp();
            latest
                .entry(task.id.as_str())
                .and_modify(|best| *best = (*best).max(ts))
                .or_insert(ts);
        }
        for task in &merged {
            prop_assert_eq!(Some(&task.effective_timestamp()), latest.get(task.id.as_str()));
        }
    }

    #[test]
    fn merge_with_itself_collapses_to_latest(side in arb_side()) {
        let merged = merge_collections(&side, &side);
        prop_assert_eq!(&merged, &merge_collections(&side, &[]));

        let keys: HashSet<&str> = side
            .iter()
            .map(|t| t.id.as_str())
            .filter(|id| !id.is_empty())
            .collect();
        let ids: HashSet<&str> = merged.iter().map(|t| t.id.as_str()).collect();
        prop_assert_eq!(ids, keys);

        for task in &merged {
            let latest = side
                .iter()
                .filter(|t| t.id == task.id)
                .map(Record::effective_timestamp)
                .max();
            prop_assert_eq!(Some(task.effective_timestamp()), latest);
            prop_assert!(side.contains(task));
        }
    }

    #[test]
    fn merge_with_nothing_deduplicates(local in arb_side()) {
        let merged = merge_collections(&local, &[]);
        let again = merge_collections(&merged, &[]);
        prop_assert_eq!(merged, again);
    }
}
