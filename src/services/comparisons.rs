//! Time-limited, view-counted comparison snapshots.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::ComparisonSnapshot;
use crate::store::{InstitutionStore, SnapshotStore};

pub const MIN_SELECTION: usize = 2;
pub const MAX_SELECTION: usize = 5;

/// Share ids stay inside the unreserved URL character set so links never
/// need percent-encoding.
const SHARE_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// How often a freshly generated share id may clash before we give up.
/// At 22 characters of this alphabet a single clash is already absurd.
const MAX_SHARE_ID_RETRIES: usize = 5;

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("a comparison needs between {MIN_SELECTION} and {MAX_SELECTION} institutions, got {0}")]
    SelectionSize(usize),

    #[error("comparison selection contains duplicate institution ids")]
    DuplicateSelection,

    #[error("institution {0} not found")]
    UnknownInstitution(i64),

    #[error("comparison snapshot not found")]
    SnapshotNotFound,

    #[error("could not allocate a unique share id")]
    ShareIdExhausted,
}

pub struct ComparisonService {
    institutions: Arc<dyn InstitutionStore>,
    snapshots: Arc<dyn SnapshotStore>,
    ttl: Duration,
    share_id_length: usize,
}

impl ComparisonService {
    #[must_use]
    pub fn new(
        institutions: Arc<dyn InstitutionStore>,
        snapshots: Arc<dyn SnapshotStore>,
        ttl_days: i64,
        share_id_length: usize,
    ) -> Self {
        Self {
            institutions,
            snapshots,
            ttl: Duration::days(ttl_days),
            share_id_length,
        }
    }

    /// Creates an immutable snapshot of 2-5 distinct, existing
    /// institutions. Validation runs before anything is stored; share-id
    /// collisions are retried.
    pub async fn create(
        &self,
        institution_ids: Vec<i64>,
        filters_applied: serde_json::Value,
    ) -> Result<ComparisonSnapshot, ComparisonError> {
        if institution_ids.len() < MIN_SELECTION || institution_ids.len() > MAX_SELECTION {
            return Err(ComparisonError::SelectionSize(institution_ids.len()));
        }

        let distinct: HashSet<i64> = institution_ids.iter().copied().collect();
        if distinct.len() != institution_ids.len() {
            return Err(ComparisonError::DuplicateSelection);
        }

        for &id in &institution_ids {
            if self.institutions.get_by_id(id).await.is_none() {
                return Err(ComparisonError::UnknownInstitution(id));
            }
        }

        let now = Utc::now();
        for _ in 0..MAX_SHARE_ID_RETRIES {
            let snapshot = ComparisonSnapshot {
                share_id: generate_share_id(self.share_id_length),
                institution_ids: institution_ids.clone(),
                filters_applied: filters_applied.clone(),
                created_at: now,
                expires_at: now + self.ttl,
                view_count: 0,
            };

            match self.snapshots.insert(snapshot.clone()).await {
                Ok(()) => {
                    info!(
                        "Created comparison {} with {} institutions",
                        snapshot.share_id,
                        snapshot.institution_ids.len()
                    );
                    return Ok(snapshot);
                }
                Err(_) => {
                    debug!("Share id collision for {}, regenerating", snapshot.share_id);
                }
            }
        }

        Err(ComparisonError::ShareIdExhausted)
    }

    /// Fetches a snapshot and counts the view. Expired snapshots behave as
    /// absent no matter when garbage collection actually runs.
    pub async fn get(&self, share_id: &str) -> Result<ComparisonSnapshot, ComparisonError> {
        self.get_at(share_id, Utc::now()).await
    }

    /// Clock-injected variant of [`Self::get`] so expiry is testable.
    pub async fn get_at(
        &self,
        share_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ComparisonSnapshot, ComparisonError> {
        let snapshot = self
            .snapshots
            .get(share_id)
            .await
            .ok_or(ComparisonError::SnapshotNotFound)?;

        if snapshot.is_expired_at(now) {
            return Err(ComparisonError::SnapshotNotFound);
        }

        let view_count = self
            .snapshots
            .increment_views(share_id)
            .await
            .ok_or(ComparisonError::SnapshotNotFound)?;

        Ok(ComparisonSnapshot {
            view_count,
            ..snapshot
        })
    }

    /// Best-effort cleanup of expired records. Never required for `get`
    /// correctness.
    pub async fn purge_expired(&self) -> usize {
        let removed = self.snapshots.remove_expired(Utc::now()).await;
        if removed > 0 {
            info!("Purged {removed} expired comparison snapshots");
        }
        removed
    }
}

fn generate_share_id(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..SHARE_ID_ALPHABET.len());
            SHARE_ID_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Institution, InstitutionType};
    use crate::store::{InMemoryInstitutionStore, InMemorySnapshotStore};
    use std::collections::HashMap;

    fn institution(id: i64) -> Institution {
        Institution {
            id,
            institution_type: InstitutionType::Primary,
            name: format!("School {id}"),
            city: "Leiden".to_string(),
            address: None,
            postal_code: None,
            coordinates: None,
            rating: None,
            is_bilingual: false,
            is_international: false,
            offers_english: false,
            details: serde_json::Value::Null,
            description: None,
        }
    }

    fn service() -> ComparisonService {
        let institutions = Arc::new(InMemoryInstitutionStore::new(
            (1..=6).map(institution).collect(),
            HashMap::new(),
        ));
        ComparisonService::new(institutions, Arc::new(InMemorySnapshotStore::new()), 30, 22)
    }

    #[tokio::test]
    async fn rejects_selections_outside_bounds() {
        let service = service();

        let err = service.create(vec![1], serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ComparisonError::SelectionSize(1)));

        let err = service
            .create(vec![1, 2, 3, 4, 5, 6], serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ComparisonError::SelectionSize(6)));
    }

    #[tokio::test]
    async fn rejects_duplicate_and_unknown_ids() {
        let service = service();

        let err = service
            .create(vec![1, 1, 2], serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ComparisonError::DuplicateSelection));

        let err = service
            .create(vec![1, 2, 999], serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ComparisonError::UnknownInstitution(999)));
    }

    #[tokio::test]
    async fn views_count_up_across_gets() {
        let service = service();
        let created = service
            .create(vec![1, 2, 3], serde_json::json!({"city": "Leiden"}))
            .await
            .unwrap();
        assert_eq!(created.view_count, 0);

        let first = service.get(&created.share_id).await.unwrap();
        assert_eq!(first.view_count, 1);
        assert_eq!(first.institution_ids, vec![1, 2, 3]);
        assert_eq!(first.filters_applied, serde_json::json!({"city": "Leiden"}));

        let second = service.get(&created.share_id).await.unwrap();
        assert_eq!(second.view_count, 2);
    }

    #[tokio::test]
    async fn expired_snapshot_behaves_as_absent() {
        let service = service();
        let created = service.create(vec![1, 2], serde_json::json!({})).await.unwrap();

        let past_expiry = created.expires_at + Duration::seconds(1);
        let err = service.get_at(&created.share_id, past_expiry).await.unwrap_err();
        assert!(matches!(err, ComparisonError::SnapshotNotFound));

        // Still alive just before the deadline.
        let before = created.expires_at - Duration::seconds(1);
        service.get_at(&created.share_id, before).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_share_id_is_not_found() {
        let service = service();
        let err = service.get("nope").await.unwrap_err();
        assert!(matches!(err, ComparisonError::SnapshotNotFound));
    }

    #[test]
    fn share_ids_are_url_safe() {
        let id = generate_share_id(22);
        assert_eq!(id.len(), 22);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
