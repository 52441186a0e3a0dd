//! # Focus Sync
//!
//! Last-write-wins cloud sync for Focus collections.
//!
//! This crate provides:
//! - [`merge_collections`]: the pure merge of local and remote records
//! - Row translation between local records and the remote schema
//! - The [`RemoteClient`] abstraction, with a PostgREST client over an
//!   [`HttpClient`] and an in-memory store for tests
//! - [`SyncManager`]: push, pull, coalescing and plan-driven bootstrap
//! - [`WorkspaceState`]: merging pulled records into a workspace
//!
//! ## Architecture
//!
//! Sync is offline-first. Local state is the source of truth for the UI and
//! is written on every change; the remote store is a backup shared between
//! devices:
//! 1. After a local change the host calls [`SyncManager::queue_sync`], which
//!    upserts every collection unless a cycle is already in flight
//! 2. At startup, and when the plan is upgraded, [`SyncManager::sync_down`]
//!    pulls every collection and merges it into local state
//!
//! ## Key Invariants
//!
//! - Sync runs only with a remote client, a paid plan and a signed-in user
//! - No remote call is made on the free plan
//! - At most one cycle is in flight; extra requests are dropped
//! - A failing collection never blocks the others
//! - Deletions are not propagated

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod applier;
mod config;
mod error;
mod manager;
mod merge;
mod remote;
mod rest;
mod schema;
mod status;

pub use applier::{LocalState, MemoryLocalState, RemoteCollections, WorkspaceState};
pub use config::{SyncConfig, TableNames};
pub use error::{SyncError, SyncResult};
pub use manager::SyncManager;
pub use merge::{merge_collections, merge_collections_by};
pub use remote::{MemoryRemote, RemoteClient, RemoteUser};
pub use rest::{Header, HttpClient, HttpResponse, RestConfig, RestRemote};
pub use schema::{GoalRow, IdeaRow, ProjectRow, RemoteRecord, SessionRow, TaskRow};
pub use status::{
    CollectionOutcome, SkipReason, SyncDirection, SyncReport, SyncStats, SyncStatus,
};
