//! Load-time normalization of persisted collections.
//!
//! Stored data may have been written by older versions that used different
//! field names (`project_id`, `task_id`, `text`, `completed_at`,
//! `duration_minutes`, `goalType`) or omitted timestamps. Every collection is
//! read as raw JSON, each element is parsed leniently into a typed record and
//! elements that cannot be salvaged are skipped with a warning.

use crate::id::{parse_timestamp, Timestamp};
use crate::model::{Collections, Goal, GoalType, Idea, Priority, Project, Task, TimerSession};
use focus_timer::TimerMode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Raw JSON of each collection as read from the store.
#[derive(Debug, Clone, Default)]
pub struct RawCollections {
    /// Stored projects.
    pub projects: Option<Value>,
    /// Stored tasks.
    pub tasks: Option<Value>,
    /// Stored sessions.
    pub sessions: Option<Value>,
    /// Stored goals.
    pub goals: Option<Value>,
    /// Stored ideas.
    pub ideas: Option<Value>,
}

/// Normalizes all collections.
///
/// Guarantees on the result:
/// - at least one project exists (a "General" project is created otherwise)
/// - ids are unique within each collection (first occurrence kept)
/// - every session is attributed to a project
pub fn normalize(raw: RawCollections, now: Timestamp) -> Collections {
    let projects = projects(raw.projects, now);
    let default_project = projects.first().map(|p| p.id.clone());
    Collections {
        tasks: tasks(raw.tasks, now),
        sessions: sessions(raw.sessions, default_project.as_deref(), now),
        goals: goals(raw.goals, now),
        ideas: ideas(raw.ideas, now),
        projects,
    }
}

/// Normalizes the project collection.
pub fn projects(raw: Option<Value>, now: Timestamp) -> Vec<Project> {
    let mut projects: Vec<Project> = elements::<RawProject>("projects", raw)
        .into_iter()
        .filter_map(|p| {
            let id = non_empty(p.id)?;
            Some(Project {
                id,
                name: p.name.unwrap_or_else(|| "Untitled".to_string()),
                color: p.color,
                goal: p.goal.as_ref().and_then(as_count),
                archived: p.archived.unwrap_or(false),
                created_at: first_timestamp(&[&p.created_at, &p.created_at_legacy]).unwrap_or(now),
                updated_at: first_timestamp(&[&p.updated_at, &p.updated_at_legacy]),
            })
        })
        .collect();
    dedup(&mut projects, |p| &p.id, "projects");
    if projects.is_empty() {
        projects.push(Project::general(now));
    }
    projects
}

/// Normalizes the task collection.
pub fn tasks(raw: Option<Value>, now: Timestamp) -> Vec<Task> {
    let mut tasks: Vec<Task> = elements::<RawTask>("tasks", raw)
        .into_iter()
        .filter_map(|t| {
            let id = non_empty(t.id)?;
            Some(Task {
                id,
                title: t.title.or(t.text).unwrap_or_default(),
                done: t.done.unwrap_or(false),
                archived: t.archived.unwrap_or(false),
                project_id: t.project_id.or(t.project_id_legacy),
                created_at: first_timestamp(&[&t.created_at, &t.created_at_legacy]).unwrap_or(now),
                updated_at: first_timestamp(&[&t.updated_at, &t.updated_at_legacy]),
            })
        })
        .collect();
    dedup(&mut tasks, |t| &t.id, "tasks");
    tasks
}

/// Normalizes the session collection.
///
/// Sessions without a project are attributed to `default_project`.
pub fn sessions(
    raw: Option<Value>,
    default_project: Option<&str>,
    now: Timestamp,
) -> Vec<TimerSession> {
    let mut sessions: Vec<TimerSession> = elements::<RawSession>("sessions", raw)
        .into_iter()
        .filter_map(|s| {
            let id = non_empty(s.id)?;
            let completed_at = first_timestamp(&[&s.completed_at, &s.completed_at_legacy]);
            let duration_seconds = s
                .duration_seconds
                .as_ref()
                .and_then(as_count)
                .filter(|secs| *secs > 0)
                .or_else(|| {
                    s.duration_minutes
                        .as_ref()
                        .and_then(as_count)
                        .map(|mins| mins.saturating_mul(60))
                })
                .unwrap_or(0);
            let mode = s
                .mode
                .as_deref()
                .and_then(|m| m.parse::<TimerMode>().ok())
                .unwrap_or(TimerMode::Work);
            Some(TimerSession {
                id,
                mode,
                duration_seconds,
                completed_at: completed_at.unwrap_or(now),
                created_at: first_timestamp(&[&s.created_at, &s.created_at_legacy])
                    .or(completed_at)
                    .unwrap_or(now),
                updated_at: first_timestamp(&[&s.updated_at, &s.updated_at_legacy])
                    .or(completed_at)
                    .or(Some(now)),
                project_id: s
                    .project_id
                    .or(s.project_id_legacy)
                    .or_else(|| default_project.map(str::to_string)),
                task_id: s.task_id.or(s.task_id_legacy),
            })
        })
        .collect();
    dedup(&mut sessions, |s| &s.id, "sessions");
    sessions
}

/// Normalizes the goal collection.
pub fn goals(raw: Option<Value>, now: Timestamp) -> Vec<Goal> {
    let mut goals: Vec<Goal> = elements::<RawGoal>("goals", raw)
        .into_iter()
        .filter_map(|g| {
            let id = non_empty(g.id)?;
            let goal_type = g
                .goal_type
                .or(g.goal_type_legacy)
                .or(g.goal_type_snake)
                .and_then(|t| t.parse::<GoalType>().ok())
                .unwrap_or_default();
            Some(Goal {
                id,
                title: g.title.or(g.text).unwrap_or_default(),
                goal_type,
                target: g
                    .target
                    .as_ref()
                    .and_then(as_count)
                    .filter(|target| *target > 0),
                project_id: g.project_id.or(g.project_id_legacy),
                completed: g.completed.unwrap_or(false),
                description: g.description,
                deadline: g.deadline.as_deref().and_then(parse_timestamp),
                created_at: first_timestamp(&[&g.created_at, &g.created_at_legacy]).unwrap_or(now),
                updated_at: first_timestamp(&[&g.updated_at, &g.updated_at_legacy]),
            })
        })
        .collect();
    dedup(&mut goals, |g| &g.id, "goals");
    goals
}

/// Normalizes the idea collection.
pub fn ideas(raw: Option<Value>, now: Timestamp) -> Vec<Idea> {
    let mut ideas: Vec<Idea> = elements::<RawIdea>("ideas", raw)
        .into_iter()
        .filter_map(|i| {
            let id = non_empty(i.id)?;
            Some(Idea {
                id,
                content: i.content.or(i.text).unwrap_or_default(),
                priority: i
                    .priority
                    .as_deref()
                    .and_then(|p| p.parse::<Priority>().ok())
                    .unwrap_or_default(),
                project_id: i.project_id.or(i.project_id_legacy),
                created_at: first_timestamp(&[&i.created_at, &i.created_at_legacy]).unwrap_or(now),
                updated_at: first_timestamp(&[&i.updated_at, &i.updated_at_legacy]),
            })
        })
        .collect();
    dedup(&mut ideas, |i| &i.id, "ideas");
    ideas
}

fn elements<T: DeserializeOwned>(collection: &str, raw: Option<Value>) -> Vec<T> {
    let items = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            tracing::warn!(collection, "stored collection is not an array; ignoring");
            return Vec::new();
        }
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!(collection, index, error = %err, "skipping malformed record");
                None
            }
        })
        .collect()
}

fn dedup<T>(records: &mut Vec<T>, id: impl Fn(&T) -> &String, collection: &str) {
    let mut seen = HashSet::new();
    let before = records.len();
    records.retain(|r| seen.insert(id(r).clone()));
    if records.len() != before {
        tracing::warn!(
            collection,
            dropped = before - records.len(),
            "dropped records with duplicate ids"
        );
    }
}

fn non_empty(id: Option<Value>) -> Option<String> {
    match id? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_timestamp(candidates: &[&Option<String>]) -> Option<Timestamp> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find_map(parse_timestamp)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    goal: Option<Value>,
    #[serde(default)]
    archived: Option<bool>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, rename = "created_at")]
    created_at_legacy: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default, rename = "updated_at")]
    updated_at_legacy: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    archived: Option<bool>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default, rename = "project_id")]
    project_id_legacy: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, rename = "created_at")]
    created_at_legacy: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default, rename = "updated_at")]
    updated_at_legacy: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    duration_seconds: Option<Value>,
    #[serde(default, rename = "duration_minutes", alias = "durationMinutes")]
    duration_minutes: Option<Value>,
    #[serde(default)]
    completed_at: Option<String>,
    #[serde(default, rename = "completed_at")]
    completed_at_legacy: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, rename = "created_at")]
    created_at_legacy: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default, rename = "updated_at")]
    updated_at_legacy: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default, rename = "project_id")]
    project_id_legacy: Option<String>,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default, rename = "task_id")]
    task_id_legacy: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGoal {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "type")]
    goal_type: Option<String>,
    #[serde(default, rename = "goalType")]
    goal_type_legacy: Option<String>,
    #[serde(default, rename = "goal_type")]
    goal_type_snake: Option<String>,
    #[serde(default)]
    target: Option<Value>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default, rename = "project_id")]
    project_id_legacy: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, rename = "created_at")]
    created_at_legacy: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default, rename = "updated_at")]
    updated_at_legacy: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIdea {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default, rename = "project_id")]
    project_id_legacy: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, rename = "created_at")]
    created_at_legacy: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default, rename = "updated_at")]
    updated_at_legacy: Option<String>,
}
