use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use super::{InstitutionStore, ShareIdCollision, SnapshotStore};
use crate::models::{ComparisonSnapshot, Institution, SupportProfile};

/// Seed file layout: institutions plus optional support profiles keyed by
/// institution id.
#[derive(Debug, Deserialize)]
struct SeedFile {
    institutions: Vec<Institution>,

    #[serde(default)]
    support_profiles: HashMap<i64, SupportProfile>,
}

/// Institution records held in memory. The dataset is immutable once
/// loaded, so reads need no locking.
pub struct InMemoryInstitutionStore {
    by_id: HashMap<i64, Institution>,
    ordered_ids: Vec<i64>,
    support: HashMap<i64, SupportProfile>,
}

impl InMemoryInstitutionStore {
    #[must_use]
    pub fn new(
        institutions: Vec<Institution>,
        support: HashMap<i64, SupportProfile>,
    ) -> Self {
        let ordered_ids = institutions.iter().map(|i| i.id).collect();
        let by_id = institutions.into_iter().map(|i| (i.id, i)).collect();
        Self {
            by_id,
            ordered_ids,
            support,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), HashMap::new())
    }

    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
        let seed: SeedFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;

        info!(
            "Loaded {} institutions ({} with support profiles) from {}",
            seed.institutions.len(),
            seed.support_profiles.len(),
            path.display()
        );
        Ok(Self::new(seed.institutions, seed.support_profiles))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait]
impl InstitutionStore for InMemoryInstitutionStore {
    async fn get_by_id(&self, id: i64) -> Option<Institution> {
        self.by_id.get(&id).cloned()
    }

    async fn list_all(&self) -> Vec<Institution> {
        self.ordered_ids
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }

    async fn support_profile(&self, id: i64) -> Option<SupportProfile> {
        self.support.get(&id).copied()
    }
}

/// Snapshot storage backed by a map. View-count increments and the
/// collision check both run under the write lock, which gives the
/// atomicity the contract asks for.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<String, ComparisonSnapshot>>,
}

impl InMemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn insert(&self, snapshot: ComparisonSnapshot) -> Result<(), ShareIdCollision> {
        let mut snapshots = self.snapshots.write().await;
        if snapshots.contains_key(&snapshot.share_id) {
            return Err(ShareIdCollision);
        }
        snapshots.insert(snapshot.share_id.clone(), snapshot);
        Ok(())
    }

    async fn get(&self, share_id: &str) -> Option<ComparisonSnapshot> {
        self.snapshots.read().await.get(share_id).cloned()
    }

    async fn increment_views(&self, share_id: &str) -> Option<u64> {
        let mut snapshots = self.snapshots.write().await;
        let snapshot = snapshots.get_mut(share_id)?;
        snapshot.view_count += 1;
        Some(snapshot.view_count)
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        let mut snapshots = self.snapshots.write().await;
        let before = snapshots.len();
        snapshots.retain(|_, s| !s.is_expired_at(now));
        before - snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(share_id: &str, expires_in_days: i64) -> ComparisonSnapshot {
        let now = Utc::now();
        ComparisonSnapshot {
            share_id: share_id.to_string(),
            institution_ids: vec![1, 2],
            filters_applied: serde_json::json!({}),
            created_at: now,
            expires_at: now + Duration::days(expires_in_days),
            view_count: 0,
        }
    }

    #[tokio::test]
    async fn insert_detects_collision() {
        let store = InMemorySnapshotStore::new();
        store.insert(snapshot("abc", 30)).await.unwrap();
        assert_eq!(store.insert(snapshot("abc", 30)).await, Err(ShareIdCollision));
    }

    #[tokio::test]
    async fn increments_are_not_lost_under_contention() {
        let store = std::sync::Arc::new(InMemorySnapshotStore::new());
        store.insert(snapshot("abc", 30)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment_views("abc").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get("abc").await.unwrap().view_count, 50);
    }

    #[tokio::test]
    async fn remove_expired_keeps_active_records() {
        let store = InMemorySnapshotStore::new();
        store.insert(snapshot("old", -1)).await.unwrap();
        store.insert(snapshot("new", 30)).await.unwrap();

        assert_eq!(store.remove_expired(Utc::now()).await, 1);
        assert!(store.get("old").await.is_none());
        assert!(store.get("new").await.is_some());
    }
}
