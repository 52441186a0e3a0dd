//! Sync status, reports and statistics.

use focus_core::Collection;
use std::fmt;
use std::time::{Duration, Instant};

/// User-facing sync status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing has happened yet.
    Idle,
    /// No remote client is configured.
    OfflineNoClient,
    /// The plan does not include sync.
    OfflineFreePlan,
    /// Nobody is signed in.
    OfflineNotSignedIn,
    /// A pull is running.
    Pulling,
    /// A pull finished.
    Pulled,
    /// A push is running.
    Pushing,
    /// A push finished.
    Synced,
    /// Some collections failed; the rest went through.
    PartiallySynced {
        /// Number of failed collections.
        failed: usize,
    },
    /// The cycle could not run.
    Failed(String),
}

impl SyncStatus {
    /// Returns true while a cycle is running.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncStatus::Pulling | SyncStatus::Pushing)
    }

    /// Returns true for the offline states.
    pub fn is_offline(&self) -> bool {
        matches!(
            self,
            SyncStatus::OfflineNoClient
                | SyncStatus::OfflineFreePlan
                | SyncStatus::OfflineNotSignedIn
        )
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => f.write_str("Not synced yet"),
            SyncStatus::OfflineNoClient => f.write_str("Offline (no remote client)"),
            SyncStatus::OfflineFreePlan => f.write_str("Offline (free plan)"),
            SyncStatus::OfflineNotSignedIn => f.write_str("Offline (not signed in)"),
            SyncStatus::Pulling => f.write_str("Syncing from cloud..."),
            SyncStatus::Pulled => f.write_str("Cloud data loaded"),
            SyncStatus::Pushing => f.write_str("Syncing changes..."),
            SyncStatus::Synced => f.write_str("Synced"),
            SyncStatus::PartiallySynced { failed } => {
                write!(f, "Synced with {failed} failed collection(s)")
            }
            SyncStatus::Failed(message) => write!(f, "Sync failed: {message}"),
        }
    }
}

/// Direction of a sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Local to remote.
    Up,
    /// Remote to local.
    Down,
}

/// Why a cycle did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another cycle was in flight.
    InFlight,
    /// No remote client is configured.
    NoRemote,
    /// The plan does not include sync.
    FreePlan,
    /// Nobody is signed in.
    NotSignedIn,
    /// The local state had nothing to offer.
    NoLocalState,
}

/// Result of one collection within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// Nothing to push.
    Empty,
    /// Rows uploaded.
    Pushed(usize),
    /// Rows downloaded.
    Pulled(usize),
    /// The remote call failed; the cycle moved on.
    Failed(String),
}

impl CollectionOutcome {
    /// Returns true for failures.
    pub fn is_failed(&self) -> bool {
        matches!(self, CollectionOutcome::Failed(_))
    }
}

/// Summary of one `sync_up` or `sync_down` call.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Direction.
    pub direction: SyncDirection,
    /// Set when the cycle did not run.
    pub skipped: Option<SkipReason>,
    /// Per-collection outcomes in processing order.
    pub collections: Vec<(Collection, CollectionOutcome)>,
    /// Wall-clock duration.
    pub duration: Duration,
}

impl SyncReport {
    pub(crate) fn skipped(direction: SyncDirection, reason: SkipReason) -> Self {
        Self {
            direction,
            skipped: Some(reason),
            collections: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the cycle ran.
    pub fn ran(&self) -> bool {
        self.skipped.is_none()
    }

    /// Returns the number of failed collections.
    pub fn failed_count(&self) -> usize {
        self.collections.iter().filter(|(_, o)| o.is_failed()).count()
    }

    /// Returns the outcome for `collection`, if it was processed.
    pub fn outcome(&self, collection: Collection) -> Option<&CollectionOutcome> {
        self.collections
            .iter()
            .find(|(c, _)| *c == collection)
            .map(|(_, o)| o)
    }

    /// Total rows moved in either direction.
    pub fn rows(&self) -> usize {
        self.collections
            .iter()
            .map(|(_, o)| match o {
                CollectionOutcome::Pushed(n) | CollectionOutcome::Pulled(n) => *n,
                _ => 0,
            })
            .sum()
    }
}

/// Counters kept across cycles.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed push cycles.
    pub pushes: u64,
    /// Completed pull cycles.
    pub pulls: u64,
    /// Rows uploaded.
    pub rows_pushed: u64,
    /// Rows downloaded.
    pub rows_pulled: u64,
    /// Collection failures.
    pub collection_failures: u64,
    /// `queue_sync` calls dropped because a cycle was in flight.
    pub dropped_requests: u64,
    /// End of the last cycle that ran.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}
