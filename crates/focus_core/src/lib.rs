//! # Focus Core
//!
//! Data model and local state for Focus.
//!
//! This crate provides:
//! - Typed records for projects, tasks, sessions, goals and ideas
//! - Record ids and timestamp handling
//! - Load-time normalization of legacy persisted data
//! - The [`LocalStore`] persistence boundary with file and memory stores
//! - The freemium plan state and the [`PlanGate`] trait
//! - [`Workspace`]: collection CRUD and workspace invariants
//! - Derived statistics (daily progress, per-project counts, goal progress)
//!
//! ## Invariants
//!
//! - Ids are unique within a collection
//! - A workspace always has at least one non-archived project
//! - Every mutation refreshes `updated_at`
//! - Loading never fails; corrupt data falls back to defaults with a warning

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod analytics;
mod error;
mod id;
pub mod migrate;
mod model;
mod plan;
mod storage;
mod workspace;

pub use error::{CoreError, CoreResult};
pub use id::{epoch, format_timestamp, generate_id, now, parse_timestamp, Timestamp};
pub use model::{
    Collection, Collections, Goal, GoalType, Idea, Priority, Project, Record, Task, TimerSession,
};
pub use plan::{FreemiumState, Plan, PlanGate, PlanListener, PlanState, PLAN_STATE_KEY};
pub use storage::{load_json, load_value, save_json, FileStore, LocalStore, MemoryStore};
pub use workspace::{Workspace, ACTIVE_PROJECT_KEY};

// Re-exported so hosts can hold plan and workspace subscriptions without
// depending on the timer crate directly.
pub use focus_timer::Subscription;
