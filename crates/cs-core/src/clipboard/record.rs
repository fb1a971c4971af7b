use serde::{Deserialize, Serialize};

use crate::ids::{BlobKey, RecordId};

use super::content::ContentKind;

/// Stored `content` of image records; the pixels live in the blob cache.
pub const IMAGE_CONTENT_PLACEHOLDER: &str = "[image]";

/// One captured clipboard entry.
///
/// Timestamps are epoch milliseconds (UTC). `created_at_ms` is "time of most
/// recent capture or promotion", not insert time: a duplicate re-capture
/// moves the record to the logical head of history by bumping it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardRecord {
    pub id: RecordId,

    /// UTF-8 text, or [`IMAGE_CONTENT_PLACEHOLDER`] for image records.
    pub content: String,

    pub kind: ContentKind,

    /// Present iff `kind == Image`; the referenced blobs exist in the cache
    /// for the record's lifetime.
    pub blob_key: Option<BlobKey>,
    pub thumbnail_key: Option<BlobKey>,

    pub created_at_ms: i64,

    /// xxh3-64 of the normalized content, bit-cast to `i64`. Stable for the
    /// life of the record (except an explicit content edit, which re-hashes).
    pub content_hash: i64,

    /// Incremented on every copy-back and on every duplicate re-capture.
    pub usage_count: i64,

    /// `None` until first use.
    pub last_used_at_ms: Option<i64>,

    /// Cached decayed score; recomputed lazily by the recommendation engine.
    pub recommendation_score: f64,

    /// Recommended-set membership markers. Currently recommended means
    /// `recommended_at_ms.is_some() && evicted_at_ms.is_none()`.
    pub recommended_at_ms: Option<i64>,
    pub evicted_at_ms: Option<i64>,

    pub note: Option<String>,

    /// Tagged records are pinned: exempt from automatic retention eviction.
    pub tags: Vec<String>,
}

impl ClipboardRecord {
    pub fn new_text(content: String, content_hash: i64, now_ms: i64) -> Self {
        Self {
            id: RecordId::new(),
            content,
            kind: ContentKind::Text,
            blob_key: None,
            thumbnail_key: None,
            created_at_ms: now_ms,
            content_hash,
            usage_count: 0,
            last_used_at_ms: None,
            recommendation_score: 0.0,
            recommended_at_ms: None,
            evicted_at_ms: None,
            note: None,
            tags: Vec::new(),
        }
    }

    pub fn new_image(
        blob_key: BlobKey,
        thumbnail_key: BlobKey,
        content_hash: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            id: RecordId::new(),
            content: IMAGE_CONTENT_PLACEHOLDER.to_string(),
            kind: ContentKind::Image,
            blob_key: Some(blob_key),
            thumbnail_key: Some(thumbnail_key),
            created_at_ms: now_ms,
            content_hash,
            usage_count: 0,
            last_used_at_ms: None,
            recommendation_score: 0.0,
            recommended_at_ms: None,
            evicted_at_ms: None,
            note: None,
            tags: Vec::new(),
        }
    }

    pub fn is_recommended(&self) -> bool {
        self.recommended_at_ms.is_some() && self.evicted_at_ms.is_none()
    }

    /// Ever entered the recommended set, whether or not still a member.
    pub fn was_ever_recommended(&self) -> bool {
        self.recommended_at_ms.is_some() || self.evicted_at_ms.is_some()
    }

    pub fn is_pinned(&self) -> bool {
        !self.tags.is_empty()
    }
}
