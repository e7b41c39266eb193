use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shareable, time-limited comparison of 2-5 institutions.
///
/// Immutable after creation apart from `view_count`, which only ever
/// increases. Lifecycle: Created -> Active -> Expired (terminal); an
/// expired snapshot behaves as absent whether or not the record has been
/// garbage collected yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSnapshot {
    /// Unique URL-safe token used in share links.
    pub share_id: String,

    /// Ordered selection, 2-5 distinct ids that existed at creation time.
    pub institution_ids: Vec<i64>,

    /// The filter parameters that produced the selection, stored verbatim
    /// for display and never interpreted.
    pub filters_applied: serde_json::Value,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    pub view_count: u64,
}

impl ComparisonSnapshot {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
