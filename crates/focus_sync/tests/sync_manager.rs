//! Sync manager against a workspace and an in-memory or loopback remote.

use chrono::{TimeZone, Utc};
use focus_core::{
    Collection, Collections, FreemiumState, Goal, GoalType, MemoryStore, Plan, PlanGate, Task,
    Timestamp, TimerSession, Workspace,
};
use focus_sync::{
    CollectionOutcome, Header, HttpClient, HttpResponse, MemoryRemote, RemoteClient, RemoteUser,
    RestConfig, RestRemote, SkipReason, SyncConfig, SyncManager, SyncStatus, WorkspaceState,
};
use focus_timer::TimerMode;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::{Arc, Weak};

type Manager<R> = SyncManager<R, WorkspaceState<MemoryStore>>;

fn at(hour: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 4, 1, hour, 0, 0).unwrap()
}

fn session(id: &str, updated: Timestamp) -> TimerSession {
    TimerSession {
        id: id.into(),
        mode: TimerMode::Work,
        duration_seconds: 1500,
        completed_at: updated,
        created_at: updated,
        updated_at: Some(updated),
        project_id: None,
        task_id: None,
    }
}

struct Setup<R: RemoteClient> {
    plan: Arc<FreemiumState<MemoryStore>>,
    workspace: Arc<Mutex<Workspace<MemoryStore>>>,
    manager: Arc<Manager<R>>,
}

fn setup<R: RemoteClient>(remote: R, pro: bool) -> Setup<R> {
    let store = Arc::new(MemoryStore::new());
    let plan = Arc::new(FreemiumState::load(Arc::clone(&store)));
    if pro {
        plan.set_plan(Plan::Pro).unwrap();
    }
    let gate: Arc<dyn PlanGate> = plan.clone();
    let workspace = Arc::new(Mutex::new(Workspace::load(store, Arc::clone(&gate))));
    let manager = Arc::new(SyncManager::new(
        SyncConfig::default(),
        Some(remote),
        WorkspaceState::new(Arc::clone(&workspace)),
        gate,
    ));
    Setup {
        plan,
        workspace,
        manager,
    }
}

fn signed_in() -> Arc<MemoryRemote> {
    Arc::new(MemoryRemote::with_user(RemoteUser::new("u-1")))
}

#[test]
fn pull_merges_by_latest_timestamp() {
    let remote = signed_in();
    remote.insert_rows(
        "pomodoro_sessions",
        [
            json!({
                "id": "s1", "user_id": "u-1", "duration_minutes": 25, "session_type": "work",
                "completed_at": "2024-04-01T08:00:00Z", "updated_at": "2024-04-01T08:00:00Z"
            }),
            json!({
                "id": "s2", "user_id": "u-1", "duration_minutes": 25, "session_type": "work",
                "completed_at": "2024-04-01T10:00:00Z", "updated_at": "2024-04-01T10:00:00Z"
            }),
            json!({ "id": "s3", "user_id": "someone-else", "duration_minutes": 5 }),
        ],
    );
    let setup = setup(Arc::clone(&remote), true);
    {
        let mut ws = setup.workspace.lock();
        let mut data = ws.collections().clone();
        data.sessions = vec![session("s1", at(9))];
        ws.replace_collections(data).unwrap();
    }

    let report = setup.manager.sync_down().unwrap();
    assert_eq!(
        report.outcome(Collection::Sessions),
        Some(&CollectionOutcome::Pulled(2))
    );

    let ws = setup.workspace.lock();
    let sessions = ws.sessions();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, "s1");
    assert_eq!(sessions[0].updated_at, Some(at(9)));
    assert_eq!(sessions[1].id, "s2");
    assert_eq!(sessions[1].updated_at, Some(at(10)));
    assert_eq!(setup.manager.status(), SyncStatus::Pulled);
}

#[test]
fn free_plan_never_touches_the_remote() {
    let remote = signed_in();
    let setup = setup(Arc::clone(&remote), false);

    assert_eq!(
        setup.manager.sync_up().unwrap().skipped,
        Some(SkipReason::FreePlan)
    );
    assert_eq!(
        setup.manager.sync_down().unwrap().skipped,
        Some(SkipReason::FreePlan)
    );
    assert!(!setup.manager.queue_sync());
    assert!(setup.manager.bootstrap().unwrap().is_none());
    assert_eq!(remote.call_count(), 0);
}

#[test]
fn requests_during_a_cycle_are_dropped() {
    let remote = signed_in();
    let setup = setup(Arc::clone(&remote), true);
    setup
        .workspace
        .lock()
        .add_task("Draft outline", None)
        .unwrap();

    let handle: Arc<Mutex<Option<Weak<Manager<Arc<MemoryRemote>>>>>> = Arc::new(Mutex::new(None));
    let results = Arc::new(Mutex::new(Vec::new()));
    {
        let handle = Arc::clone(&handle);
        let results = Arc::clone(&results);
        remote.set_upsert_hook(move |_table| {
            let manager = handle.lock().as_ref().and_then(Weak::upgrade);
            if let Some(manager) = manager {
                results.lock().push(manager.queue_sync());
            }
        });
    }
    *handle.lock() = Some(Arc::downgrade(&setup.manager));

    assert!(setup.manager.queue_sync());

    // projects and tasks are non-empty: one user check and two upserts
    assert_eq!(*results.lock(), vec![false, false]);
    assert_eq!(remote.call_count(), 3);
    assert_eq!(setup.manager.stats().dropped_requests, 2);
    assert!(!setup.manager.is_in_flight());
}

#[test]
fn failing_collection_does_not_block_others() {
    let remote = signed_in();
    let setup = setup(Arc::clone(&remote), true);
    {
        let mut ws = setup.workspace.lock();
        ws.add_task("Review", None).unwrap();
        ws.add_goal("Ship", GoalType::Weekly, Some(10), None).unwrap();
    }
    remote.fail_table("tasks");

    let report = setup.manager.sync_up().unwrap();
    assert!(report.outcome(Collection::Tasks).unwrap().is_failed());
    assert_eq!(
        report.outcome(Collection::Goals),
        Some(&CollectionOutcome::Pushed(1))
    );
    assert_eq!(
        setup.manager.status(),
        SyncStatus::PartiallySynced { failed: 1 }
    );

    remote.heal();
    setup.manager.sync_up().unwrap();
    assert_eq!(setup.manager.status(), SyncStatus::Synced);
    assert_eq!(remote.rows("tasks").len(), 1);
}

#[test]
fn failed_pull_keeps_local_records() {
    let remote = signed_in();
    let setup = setup(Arc::clone(&remote), true);
    setup
        .workspace
        .lock()
        .add_goal("Read more", GoalType::Daily, None, None)
        .unwrap();
    remote.fail_table("goals");

    let report = setup.manager.sync_down().unwrap();
    assert_eq!(report.failed_count(), 1);
    let goals: Vec<Goal> = setup.workspace.lock().goals().to_vec();
    assert_eq!(goals.len(), 1);
}

#[test]
fn upgrade_after_bootstrap_pulls() {
    let remote = signed_in();
    remote.insert_rows(
        "tasks",
        [json!({ "id": "t-cloud", "user_id": "u-1", "title": "From another device" })],
    );
    let setup = setup(Arc::clone(&remote), false);
    assert!(setup.manager.bootstrap().unwrap().is_none());
    assert_eq!(setup.manager.status(), SyncStatus::OfflineFreePlan);

    setup.plan.set_plan(Plan::Pro).unwrap();
    let ws = setup.workspace.lock();
    assert!(ws.tasks().iter().any(|t: &Task| t.id == "t-cloud"));
}

#[test]
fn oversized_remote_duration_still_pushes() {
    let remote = signed_in();
    remote.insert_rows(
        "pomodoro_sessions",
        [json!({
            "id": "s-big", "user_id": "u-1", "duration_minutes": 100_000_000u64,
            "session_type": "work", "completed_at": "2024-04-01T08:00:00Z"
        })],
    );
    let setup = setup(Arc::clone(&remote), true);

    setup.manager.sync_down().unwrap();
    assert_eq!(
        setup.workspace.lock().sessions()[0].duration_seconds,
        u32::MAX
    );

    let report = setup.manager.sync_up().unwrap();
    assert_eq!(
        report.outcome(Collection::Sessions),
        Some(&CollectionOutcome::Pushed(1))
    );
    assert_eq!(
        remote.rows("pomodoro_sessions")[0]["duration_minutes"],
        u32::MAX / 60
    );
}

/// Serves the PostgREST URL scheme from a [`MemoryRemote`].
struct Loopback {
    store: Arc<MemoryRemote>,
    token: String,
}

impl Loopback {
    fn authorized(&self, headers: &[Header]) -> bool {
        let expected = format!("Bearer {}", self.token);
        headers
            .iter()
            .any(|(name, value)| name == "Authorization" && *value == expected)
    }

    fn route(url: &str) -> (String, Vec<(String, String)>) {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let table = path.rsplit('/').next().unwrap_or_default().to_string();
        let params = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), urlencoding::decode(v).unwrap().into_owned()))
            .collect();
        (table, params)
    }
}

impl HttpClient for Loopback {
    fn get(&self, url: &str, headers: &[Header]) -> Result<HttpResponse, String> {
        if !self.authorized(headers) {
            return Ok(HttpResponse::new(401, "{}"));
        }
        if url.ends_with("/auth/v1/user") {
            return Ok(HttpResponse::new(200, r#"{"id":"u-1","email":"a@b.c"}"#));
        }
        let (table, params) = Self::route(url);
        let (column, value) = params
            .iter()
            .find_map(|(k, v)| v.strip_prefix("eq.").map(|v| (k.clone(), v.to_string())))
            .ok_or("missing filter")?;
        let rows = self
            .store
            .select_by_user(&table, &column, &value)
            .map_err(|e| e.to_string())?;
        Ok(HttpResponse::new(200, serde_json::to_vec(&rows).unwrap()))
    }

    fn post(&self, url: &str, headers: &[Header], body: Vec<u8>) -> Result<HttpResponse, String> {
        if !self.authorized(headers) {
            return Ok(HttpResponse::new(401, "{}"));
        }
        let (table, params) = Self::route(url);
        let on_conflict = params
            .iter()
            .find(|(k, _)| k == "on_conflict")
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| "id".into());
        let rows: Vec<Value> = serde_json::from_slice(&body).map_err(|e| e.to_string())?;
        self.store
            .upsert(&table, &rows, &on_conflict)
            .map_err(|e| e.to_string())?;
        Ok(HttpResponse::new(201, Vec::new()))
    }
}

fn rest_client(store: &Arc<MemoryRemote>, token: &str) -> RestRemote<Loopback> {
    let loopback = Loopback {
        store: Arc::clone(store),
        token: "secret".into(),
    };
    RestRemote::new(
        RestConfig::new("https://db.example.com", "anon").with_access_token(token),
        loopback,
    )
}

#[test]
fn round_trip_through_rest_client() {
    let store = Arc::new(MemoryRemote::new());
    let device_a = setup(rest_client(&store, "secret"), true);
    {
        let mut ws = device_a.workspace.lock();
        let project = ws.add_project("Thesis", Some(6)).unwrap();
        ws.add_task("Chapter 2", Some(&project.id)).unwrap();
    }
    let pushed = device_a.manager.sync_up().unwrap();
    assert_eq!(pushed.failed_count(), 0);
    assert_eq!(
        pushed.outcome(Collection::Projects),
        Some(&CollectionOutcome::Pushed(2))
    );
    assert_eq!(store.rows("tasks")[0]["user_id"], "u-1");

    let device_b = setup(rest_client(&store, "secret"), true);
    let report = device_b.manager.sync_down().unwrap();
    assert_eq!(
        report.outcome(Collection::Tasks),
        Some(&CollectionOutcome::Pulled(1))
    );
    let local: Collections = device_b.workspace.lock().collections().clone();
    assert_eq!(local.tasks.len(), 1);
    assert_eq!(local.tasks[0].title, "Chapter 2");
    // both devices start with the same default project id
    assert_eq!(local.projects.len(), 2);
    assert!(local
        .projects
        .iter()
        .any(|p| p.name == "Thesis" && p.goal == Some(6)));
}

#[test]
fn rejected_token_reads_as_signed_out() {
    let store = Arc::new(MemoryRemote::new());
    let setup = setup(rest_client(&store, "stale"), true);
    assert_eq!(
        setup.manager.sync_up().unwrap().skipped,
        Some(SkipReason::NotSignedIn)
    );
    assert_eq!(setup.manager.status(), SyncStatus::OfflineNotSignedIn);
}
