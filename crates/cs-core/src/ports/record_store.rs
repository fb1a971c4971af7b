use anyhow::Result;
use async_trait::async_trait;

use crate::clipboard::ClipboardRecord;
use crate::ids::RecordId;

/// One membership/score write of a reconciliation pass. A pass never emits
/// both a `Promote` and an `Evict` for the same record.
#[derive(Debug, Clone)]
pub enum RecommendationChange {
    /// Enter the recommended set: `recommended_at = at_ms`, eviction marker
    /// cleared, score stored.
    Promote {
        id: RecordId,
        score: f64,
        at_ms: i64,
    },

    /// Leave the recommended set: `evicted_at = at_ms`, `recommended_at`
    /// cleared, score stored.
    Evict {
        id: RecordId,
        score: f64,
        at_ms: i64,
    },

    /// Refresh the cached score without touching membership.
    Rescore { id: RecordId, score: f64 },
}

/// Durable store of clipboard records.
///
/// The store does not enforce `content_hash` uniqueness; the deduplicator
/// owns identity. All methods are cheap local-disk operations.
#[async_trait]
pub trait RecordStorePort: Send + Sync {
    async fn insert(&self, record: &ClipboardRecord) -> Result<()>;

    async fn get(&self, id: &RecordId) -> Result<Option<ClipboardRecord>>;

    /// Authoritative dedup lookup: any live record with this exact hash.
    async fn find_by_hash(&self, content_hash: i64) -> Result<Option<ClipboardRecord>>;

    /// History page, most recently captured/promoted first.
    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<ClipboardRecord>>;

    async fn list_all(&self) -> Result<Vec<ClipboardRecord>>;

    async fn count(&self) -> Result<i64>;

    /// Duplicate re-capture: promote to head of history and register the
    /// usage signal in one update (`created_at = now`, `usage_count += 1`,
    /// `last_used_at = now`, score refreshed to the new usage count).
    async fn promote_duplicate(&self, id: &RecordId, now_ms: i64) -> Result<()>;

    /// Copy-back usage signal: `usage_count += 1`, `last_used_at = now`,
    /// cached score replaced. With `mark_recommended`, also first-touch
    /// promote (`recommended_at = now`, eviction marker cleared).
    async fn record_usage(
        &self,
        id: &RecordId,
        now_ms: i64,
        score: f64,
        mark_recommended: bool,
    ) -> Result<()>;

    /// Text edit; the caller passes the re-computed hash.
    async fn update_content(
        &self,
        id: &RecordId,
        content: &str,
        content_hash: i64,
    ) -> Result<()>;

    async fn set_tags(&self, id: &RecordId, tags: &[String]) -> Result<()>;

    async fn set_note(&self, id: &RecordId, note: Option<&str>) -> Result<()>;

    async fn delete(&self, id: &RecordId) -> Result<()>;

    /// Remove every record, returning how many were deleted. Callers drop
    /// blobs first.
    async fn delete_all(&self) -> Result<usize>;

    /// Oldest-first untagged records, capped at `limit` — the retention
    /// eviction candidates. Tagged records never appear here.
    async fn oldest_untagged(&self, limit: i64) -> Result<Vec<ClipboardRecord>>;

    /// Apply a reconciliation pass atomically (single transaction): either
    /// the whole new membership state lands, or the previous recommended
    /// set stays intact.
    async fn apply_recommendation_changes(
        &self,
        changes: &[RecommendationChange],
    ) -> Result<()>;

    /// Current recommended-set members, score descending.
    async fn recommended(&self, limit: i64) -> Result<Vec<ClipboardRecord>>;

    /// Records that were ever recommended, most recent membership change
    /// first.
    async fn recommendation_history(&self, limit: i64) -> Result<Vec<ClipboardRecord>>;
}
