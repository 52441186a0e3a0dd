//! Workspace persistence against the file store.

use focus_core::{
    migrate, now, Collection, FileStore, FreemiumState, LocalStore, Plan, PlanGate, Workspace,
};
use focus_timer::{CompletionEvent, TimerMode};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::tempdir;

fn open(dir: &std::path::Path) -> (Workspace<FileStore>, Arc<FreemiumState<FileStore>>) {
    let store = Arc::new(FileStore::open(dir).unwrap());
    let plan = Arc::new(FreemiumState::load(Arc::clone(&store)));
    let gate: Arc<dyn PlanGate> = plan.clone();
    (Workspace::load(store, gate), plan)
}

#[test]
fn state_survives_reopen() {
    let dir = tempdir().unwrap();
    let task_id;
    {
        let (mut ws, plan) = open(dir.path());
        plan.set_plan(Plan::Pro).unwrap();
        let project = ws.add_project("Thesis", Some(6)).unwrap();
        ws.set_active_project(&project.id).unwrap();
        task_id = ws.add_task("Chapter 1", Some(&project.id)).unwrap().id;
        ws.record_completion(&CompletionEvent {
            mode: TimerMode::Work,
            duration_seconds: 1500,
            completed_at: now(),
        })
        .unwrap();
    }

    let (ws, plan) = open(dir.path());
    assert!(plan.is_pro());
    assert_eq!(ws.projects().len(), 2);
    assert_eq!(ws.active_project().unwrap().name, "Thesis");
    assert_eq!(ws.tasks()[0].id, task_id);
    assert_eq!(
        ws.sessions()[0].project_id.as_deref(),
        Some(ws.active_project_id())
    );
}

#[test]
fn legacy_files_are_normalized() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store
        .write(
            Collection::Projects.storage_key(),
            &json!([{ "id": "p-old", "name": "Old", "createdAt": "2023-01-01T00:00:00Z" }])
                .to_string(),
        )
        .unwrap();
    store
        .write(
            Collection::Sessions.storage_key(),
            &json!([{ "id": "s-old", "duration_minutes": 50, "completed_at": "2023-01-02T10:00:00Z" }])
                .to_string(),
        )
        .unwrap();
    store
        .write(Collection::Tasks.storage_key(), "not json at all")
        .unwrap();
    store.write("focus_active_project", "p-missing").unwrap();

    let (ws, _) = open(dir.path());
    assert_eq!(ws.active_project_id(), "p-old");
    assert!(ws.tasks().is_empty());
    let session = &ws.sessions()[0];
    assert_eq!(session.duration_seconds, 3000);
    assert_eq!(session.project_id.as_deref(), Some("p-old"));
}

fn arb_record() -> impl Strategy<Value = Value> {
    (
        prop_oneof![Just(None), "[a-c]{0,2}".prop_map(Some)],
        any::<bool>(),
    )
        .prop_map(|(id, archived)| match id {
            Some(id) => json!({ "id": id, "name": "n", "archived": archived }),
            None => json!({ "name": "anonymous" }),
        })
}

proptest! {
    #[test]
    fn normalized_projects_are_unique_and_non_empty(
        records in prop::collection::vec(arb_record(), 0..20)
    ) {
        let projects = migrate::projects(Some(Value::Array(records)), now());
        prop_assert!(!projects.is_empty());
        let ids: HashSet<&str> = projects.iter().map(|p| p.id.as_str()).collect();
        prop_assert_eq!(ids.len(), projects.len());
        prop_assert!(projects.iter().all(|p| !p.id.is_empty()));
    }
}
