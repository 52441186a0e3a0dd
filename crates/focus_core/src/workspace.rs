//! Workspace state: the five collections plus the active selection.
//!
//! All mutations go through [`Workspace`]. Each successful mutating call
//! persists the affected collection and then notifies change listeners with
//! the collection that changed; hosts typically queue a sync from there.
//! [`Workspace::replace_collections`] persists without notifying, since it is
//! how pulled remote data is written back.

use crate::error::{CoreError, CoreResult};
use crate::id::{generate_id, now};
use crate::migrate::{self, RawCollections};
use crate::model::{
    Collection, Collections, Goal, GoalType, Idea, Priority, Project, Record, Task, TimerSession,
};
use crate::plan::PlanGate;
use crate::storage::{load_value, save_json, LocalStore};
use focus_timer::{CompletionEvent, Listeners, Subscription};
use std::sync::Arc;

/// Storage key of the active project id.
pub const ACTIVE_PROJECT_KEY: &str = "focus_active_project";

const LAST_ACTIVE_PROJECT: &str = "You need at least one active project.";

/// The user's projects, tasks, sessions, goals and ideas.
pub struct Workspace<S: LocalStore> {
    store: Arc<S>,
    plan: Arc<dyn PlanGate>,
    data: Collections,
    active_project_id: String,
    active_task_id: Option<String>,
    changes: Arc<Listeners<Collection>>,
}

impl<S: LocalStore> Workspace<S> {
    /// Loads and normalizes all collections from `store`.
    ///
    /// Never fails: unreadable collections start empty and a default project
    /// is created if none survives.
    pub fn load(store: Arc<S>, plan: Arc<dyn PlanGate>) -> Self {
        let raw = {
            let s: &dyn LocalStore = store.as_ref();
            RawCollections {
                projects: load_value(s, Collection::Projects.storage_key()),
                tasks: load_value(s, Collection::Tasks.storage_key()),
                sessions: load_value(s, Collection::Sessions.storage_key()),
                goals: load_value(s, Collection::Goals.storage_key()),
                ideas: load_value(s, Collection::Ideas.storage_key()),
            }
        };
        let data = migrate::normalize(raw, now());

        let stored_active = match store.read(ACTIVE_PROJECT_KEY) {
            Ok(value) => value.map(|v| v.trim().trim_matches('"').to_string()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read active project");
                None
            }
        };

        let mut workspace = Self {
            store,
            plan,
            data,
            active_project_id: stored_active.unwrap_or_default(),
            active_task_id: None,
            changes: Listeners::new(),
        };
        workspace.repoint_active_project();
        tracing::debug!(
            projects = workspace.data.projects.len(),
            tasks = workspace.data.tasks.len(),
            sessions = workspace.data.sessions.len(),
            goals = workspace.data.goals.len(),
            ideas = workspace.data.ideas.len(),
            "workspace loaded"
        );
        workspace
    }

    /// Registers a listener called with each collection after it changes.
    pub fn on_change(
        &self,
        listener: impl Fn(&Collection) + Send + Sync + 'static,
    ) -> Subscription {
        self.changes.subscribe(Arc::new(listener))
    }

    /// Returns all collections.
    pub fn collections(&self) -> &Collections {
        &self.data
    }

    /// Returns the plan gate.
    pub fn plan(&self) -> &Arc<dyn PlanGate> {
        &self.plan
    }

    /// Returns the project list.
    pub fn projects(&self) -> &[Project] {
        &self.data.projects
    }

    /// Returns the task list.
    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }

    /// Returns the session list.
    pub fn sessions(&self) -> &[TimerSession] {
        &self.data.sessions
    }

    /// Returns the goal list.
    pub fn goals(&self) -> &[Goal] {
        &self.data.goals
    }

    /// Returns the idea list.
    pub fn ideas(&self) -> &[Idea] {
        &self.data.ideas
    }

    /// Looks up a project.
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.data.projects.iter().find(|p| p.id == id)
    }

    /// Returns the id of the project new sessions are attributed to.
    pub fn active_project_id(&self) -> &str {
        &self.active_project_id
    }

    /// Returns the project new sessions are attributed to.
    pub fn active_project(&self) -> Option<&Project> {
        self.project(&self.active_project_id)
    }

    /// Selects the active project.
    ///
    /// # Errors
    ///
    /// Fails if the project does not exist or is archived.
    pub fn set_active_project(&mut self, id: &str) -> CoreResult<()> {
        match self.project(id) {
            Some(p) if !p.archived => {}
            Some(_) => {
                return Err(CoreError::invalid_input(format!(
                    "project {id} is archived"
                )))
            }
            None => return Err(CoreError::not_found("projects", id)),
        }
        self.active_project_id = id.to_string();
        self.store.write(ACTIVE_PROJECT_KEY, id)
    }

    /// Returns the id of the task new sessions are attributed to.
    pub fn active_task_id(&self) -> Option<&str> {
        self.active_task_id.as_deref()
    }

    /// Selects (or clears) the active task.
    ///
    /// # Errors
    ///
    /// Fails if the task does not exist or is archived.
    pub fn set_active_task(&mut self, id: Option<&str>) -> CoreResult<()> {
        if let Some(id) = id {
            match self.data.tasks.iter().find(|t| t.id == id) {
                Some(t) if !t.archived => {}
                Some(_) => {
                    return Err(CoreError::invalid_input(format!("task {id} is archived")))
                }
                None => return Err(CoreError::not_found("tasks", id)),
            }
        }
        self.active_task_id = id.map(str::to_string);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// On the free plan only one active project is allowed.
    pub fn add_project(&mut self, name: &str, goal: Option<u32>) -> CoreResult<Project> {
        let name = required("project name", name)?;
        if self.data.active_projects().count() >= 1 && !self.plan.is_paid() {
            return Err(CoreError::plan_required("Projects & goals"));
        }
        let project = Project::new(generate_id("p"), name, goal, now());
        self.data.projects.push(project.clone());
        self.commit(Collection::Projects)?;
        Ok(project)
    }

    /// Renames a project.
    pub fn rename_project(&mut self, id: &str, name: &str) -> CoreResult<()> {
        let name = required("project name", name)?;
        let idx = position(&self.data.projects, "projects", id)?;
        let project = &mut self.data.projects[idx];
        project.name = name;
        project.touch(now());
        self.commit(Collection::Projects)
    }

    /// Sets a project's daily goal.
    pub fn set_project_goal(&mut self, id: &str, goal: u32) -> CoreResult<()> {
        let idx = position(&self.data.projects, "projects", id)?;
        let project = &mut self.data.projects[idx];
        project.goal = Some(goal);
        project.touch(now());
        self.commit(Collection::Projects)
    }

    /// Archives a project, moving the active selection if needed.
    ///
    /// # Errors
    ///
    /// Archiving the last active project is rejected.
    pub fn archive_project(&mut self, id: &str) -> CoreResult<()> {
        let idx = position(&self.data.projects, "projects", id)?;
        if self.data.projects[idx].archived {
            return Ok(());
        }
        if self.data.active_projects().count() <= 1 {
            return Err(CoreError::invariant(LAST_ACTIVE_PROJECT));
        }
        let project = &mut self.data.projects[idx];
        project.archived = true;
        project.touch(now());
        self.repoint_active_project();
        self.commit(Collection::Projects)
    }

    /// Restores an archived project.
    ///
    /// # Errors
    ///
    /// On the free plan only one active project is allowed.
    pub fn restore_project(&mut self, id: &str) -> CoreResult<()> {
        let idx = position(&self.data.projects, "projects", id)?;
        if !self.data.projects[idx].archived {
            return Ok(());
        }
        if self.data.active_projects().count() >= 1 && !self.plan.is_paid() {
            return Err(CoreError::plan_required("Projects & goals"));
        }
        let project = &mut self.data.projects[idx];
        project.archived = false;
        project.touch(now());
        self.commit(Collection::Projects)
    }

    /// Deletes a project.
    ///
    /// # Errors
    ///
    /// Deleting the last active project is rejected and leaves the workspace
    /// unchanged.
    pub fn delete_project(&mut self, id: &str) -> CoreResult<()> {
        let idx = position(&self.data.projects, "projects", id)?;
        if !self.data.projects[idx].archived && self.data.active_projects().count() <= 1 {
            return Err(CoreError::invariant(LAST_ACTIVE_PROJECT));
        }
        self.data.projects.remove(idx);
        self.repoint_active_project();
        self.commit(Collection::Projects)
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Creates a task, attached to `project_id` when given.
    pub fn add_task(&mut self, title: &str, project_id: Option<&str>) -> CoreResult<Task> {
        let title = required("task title", title)?;
        if let Some(pid) = project_id {
            position(&self.data.projects, "projects", pid)?;
        }
        let task = Task::new(
            generate_id("t"),
            title,
            project_id.map(str::to_string),
            now(),
        );
        self.data.tasks.push(task.clone());
        self.commit(Collection::Tasks)?;
        Ok(task)
    }

    /// Marks a task done or open.
    pub fn set_task_done(&mut self, id: &str, done: bool) -> CoreResult<()> {
        self.edit_task(id, |t| t.done = done)
    }

    /// Archives a task.
    pub fn archive_task(&mut self, id: &str) -> CoreResult<()> {
        self.edit_task(id, |t| t.archived = true)?;
        if self.active_task_id.as_deref() == Some(id) {
            self.active_task_id = None;
        }
        Ok(())
    }

    /// Restores an archived task.
    pub fn restore_task(&mut self, id: &str) -> CoreResult<()> {
        self.edit_task(id, |t| t.archived = false)
    }

    /// Deletes a task, clearing the active task if it was selected.
    pub fn delete_task(&mut self, id: &str) -> CoreResult<()> {
        let idx = position(&self.data.tasks, "tasks", id)?;
        self.data.tasks.remove(idx);
        if self.active_task_id.as_deref() == Some(id) {
            self.active_task_id = None;
        }
        self.commit(Collection::Tasks)
    }

    fn edit_task(&mut self, id: &str, edit: impl FnOnce(&mut Task)) -> CoreResult<()> {
        let idx = position(&self.data.tasks, "tasks", id)?;
        let task = &mut self.data.tasks[idx];
        edit(task);
        task.touch(now());
        self.commit(Collection::Tasks)
    }

    // ------------------------------------------------------------------
    // Goals and ideas
    // ------------------------------------------------------------------

    /// Creates a goal. A target of zero means no cap. Requires the paid plan.
    pub fn add_goal(
        &mut self,
        title: &str,
        goal_type: GoalType,
        target: Option<u32>,
        project_id: Option<&str>,
    ) -> CoreResult<Goal> {
        if !self.plan.is_paid() {
            return Err(CoreError::plan_required("Goals"));
        }
        let title = required("goal title", title)?;
        let created = now();
        let goal = Goal {
            id: generate_id("g"),
            title,
            goal_type,
            target: target.filter(|t| *t > 0),
            project_id: project_id.map(str::to_string),
            completed: false,
            description: None,
            deadline: None,
            created_at: created,
            updated_at: Some(created),
        };
        self.data.goals.push(goal.clone());
        self.commit(Collection::Goals)?;
        Ok(goal)
    }

    /// Flips a goal's completed flag, returning the new value.
    pub fn toggle_goal_completed(&mut self, id: &str) -> CoreResult<bool> {
        let idx = position(&self.data.goals, "goals", id)?;
        let goal = &mut self.data.goals[idx];
        goal.completed = !goal.completed;
        goal.touch(now());
        let completed = goal.completed;
        self.commit(Collection::Goals)?;
        Ok(completed)
    }

    /// Deletes a goal.
    pub fn delete_goal(&mut self, id: &str) -> CoreResult<()> {
        let idx = position(&self.data.goals, "goals", id)?;
        self.data.goals.remove(idx);
        self.commit(Collection::Goals)
    }

    /// Captures an idea. Requires the paid plan.
    pub fn add_idea(
        &mut self,
        content: &str,
        priority: Priority,
        project_id: Option<&str>,
    ) -> CoreResult<Idea> {
        if !self.plan.is_paid() {
            return Err(CoreError::plan_required("Ideas"));
        }
        let content = required("idea", content)?;
        let created = now();
        let idea = Idea {
            id: generate_id("i"),
            content,
            priority,
            project_id: project_id.map(str::to_string),
            created_at: created,
            updated_at: Some(created),
        };
        self.data.ideas.push(idea.clone());
        self.commit(Collection::Ideas)?;
        Ok(idea)
    }

    /// Deletes an idea.
    pub fn delete_idea(&mut self, id: &str) -> CoreResult<()> {
        let idx = position(&self.data.ideas, "ideas", id)?;
        self.data.ideas.remove(idx);
        self.commit(Collection::Ideas)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Records a completed interval.
    ///
    /// Only work intervals are recorded; they are attributed to the active
    /// project and task. Returns the new session, or `None` for breaks.
    pub fn record_completion(
        &mut self,
        event: &CompletionEvent,
    ) -> CoreResult<Option<TimerSession>> {
        if !event.mode.is_work() {
            return Ok(None);
        }
        let session = TimerSession {
            id: generate_id("s"),
            mode: event.mode,
            duration_seconds: event.duration_seconds,
            completed_at: event.completed_at,
            created_at: event.completed_at,
            updated_at: Some(event.completed_at),
            project_id: Some(self.active_project_id.clone()),
            task_id: self.active_task_id.clone(),
        };
        tracing::info!(
            session = %session.id,
            project = %self.active_project_id,
            duration = session.duration_seconds,
            "work session recorded"
        );
        self.data.sessions.push(session.clone());
        self.commit(Collection::Sessions)?;
        Ok(Some(session))
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Replaces all collections, typically with the result of a merge.
    ///
    /// Every collection is persisted; change listeners are not notified.
    /// The active selection is repaired if it no longer points at a usable
    /// record.
    ///
    /// # Errors
    ///
    /// Returns the first persistence error. All collections are still
    /// attempted and the in-memory state is replaced regardless.
    pub fn replace_collections(&mut self, mut collections: Collections) -> CoreResult<()> {
        if collections.projects.is_empty() {
            collections.projects.push(Project::general(now()));
        }
        self.data = collections;
        self.repoint_active_project();
        if let Some(task_id) = &self.active_task_id {
            if !self.data.tasks.iter().any(|t| &t.id == task_id && !t.archived) {
                self.active_task_id = None;
            }
        }

        let mut first_error = None;
        for collection in Collection::ALL {
            if let Err(err) = self.persist(collection) {
                tracing::warn!(%collection, error = %err, "failed to persist collection");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn commit(&self, collection: Collection) -> CoreResult<()> {
        self.persist(collection)?;
        self.changes.emit(&collection);
        Ok(())
    }

    fn persist(&self, collection: Collection) -> CoreResult<()> {
        let store: &dyn LocalStore = self.store.as_ref();
        let key = collection.storage_key();
        match collection {
            Collection::Projects => save_json(store, key, &self.data.projects),
            Collection::Tasks => save_json(store, key, &self.data.tasks),
            Collection::Sessions => save_json(store, key, &self.data.sessions),
            Collection::Goals => save_json(store, key, &self.data.goals),
            Collection::Ideas => save_json(store, key, &self.data.ideas),
        }
    }

    fn repoint_active_project(&mut self) {
        let usable = self
            .data
            .projects
            .iter()
            .any(|p| p.id == self.active_project_id && !p.archived);
        if usable {
            return;
        }
        let fallback = self
            .data
            .active_projects()
            .next()
            .or_else(|| self.data.projects.first())
            .map(|p| p.id.clone());
        if let Some(id) = fallback {
            tracing::debug!(from = %self.active_project_id, to = %id, "active project moved");
            self.active_project_id = id;
            if let Err(err) = self.store.write(ACTIVE_PROJECT_KEY, &self.active_project_id) {
                tracing::warn!(error = %err, "failed to persist active project");
            }
        }
    }
}

impl<S: LocalStore> std::fmt::Debug for Workspace<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("projects", &self.data.projects.len())
            .field("tasks", &self.data.tasks.len())
            .field("sessions", &self.data.sessions.len())
            .field("goals", &self.data.goals.len())
            .field("ideas", &self.data.ideas.len())
            .field("active_project_id", &self.active_project_id)
            .finish()
    }
}

fn position<T: Record>(items: &[T], collection: &'static str, id: &str) -> CoreResult<usize> {
    items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| CoreError::not_found(collection, id))
}

fn required(what: &str, value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_input(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}
