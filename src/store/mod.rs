//! External-collaborator seams.
//!
//! The relational institution database and the durable snapshot store live
//! outside this service; these traits are the boundary. The in-memory
//! implementations back the running service (seeded from a JSON dataset)
//! and every test.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ComparisonSnapshot, Institution, SupportProfile};

pub use memory::{InMemoryInstitutionStore, InMemorySnapshotStore};

/// Read-only access to institution records.
#[async_trait]
pub trait InstitutionStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Option<Institution>;

    /// Candidate set for ranking and filtering.
    async fn list_all(&self) -> Vec<Institution>;

    /// Accessibility/support flags, maintained separately from the
    /// institution record. `None` means no data, which never matches a
    /// special-needs search.
    async fn support_profile(&self, id: i64) -> Option<SupportProfile>;
}

/// Durable key-value storage for comparison snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Inserts a new snapshot. Fails when the share id is already taken so
    /// the caller can regenerate; the check and insert are atomic.
    async fn insert(&self, snapshot: ComparisonSnapshot) -> Result<(), ShareIdCollision>;

    async fn get(&self, share_id: &str) -> Option<ComparisonSnapshot>;

    /// Atomically bumps the view counter, returning the new value.
    /// Concurrent increments are never lost.
    async fn increment_views(&self, share_id: &str) -> Option<u64>;

    /// Best-effort garbage collection; returns how many records were
    /// dropped. Correctness of reads never depends on this running.
    async fn remove_expired(&self, now: DateTime<Utc>) -> usize;
}

/// The randomly generated share id clashed with an existing snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareIdCollision;
