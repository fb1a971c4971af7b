use anyhow::{Context, Result};
use diesel::prelude::*;

use cs_core::clipboard::{ClipboardRecord, ContentKind};
use cs_core::ids::{BlobKey, RecordId};

use crate::db::schema::t_clipboard_record;

/// Row form of a [`ClipboardRecord`]. Tags are stored as a JSON array
/// string so the pin-exemption filter stays a plain column comparison.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = t_clipboard_record)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClipboardRecordRow {
    pub id: String,
    pub content: String,
    pub content_kind: String,
    pub blob_key: Option<String>,
    pub thumbnail_key: Option<String>,
    pub content_hash: i64,
    pub created_at_ms: i64,
    pub usage_count: i64,
    pub last_used_at_ms: Option<i64>,
    pub recommendation_score: f64,
    pub recommended_at_ms: Option<i64>,
    pub evicted_at_ms: Option<i64>,
    pub note: Option<String>,
    pub tags: String,
}

/// JSON form of an empty tag list; rows with this value are eviction
/// candidates for retention.
pub const EMPTY_TAGS: &str = "[]";

impl ClipboardRecordRow {
    pub fn from_domain(record: &ClipboardRecord) -> Result<Self> {
        Ok(Self {
            id: record.id.to_string(),
            content: record.content.clone(),
            content_kind: record.kind.as_str().to_string(),
            blob_key: record.blob_key.as_ref().map(|k| k.to_string()),
            thumbnail_key: record.thumbnail_key.as_ref().map(|k| k.to_string()),
            content_hash: record.content_hash,
            created_at_ms: record.created_at_ms,
            usage_count: record.usage_count,
            last_used_at_ms: record.last_used_at_ms,
            recommendation_score: record.recommendation_score,
            recommended_at_ms: record.recommended_at_ms,
            evicted_at_ms: record.evicted_at_ms,
            note: record.note.clone(),
            tags: serde_json::to_string(&record.tags).context("serialize tags")?,
        })
    }

    pub fn into_domain(self) -> Result<ClipboardRecord> {
        let kind = ContentKind::parse(&self.content_kind)
            .with_context(|| format!("unknown content kind '{}'", self.content_kind))?;

        // A malformed tags column is a data anomaly, not a reason to lose
        // the record: treat it as untagged.
        let tags: Vec<String> = serde_json::from_str(&self.tags).unwrap_or_default();

        Ok(ClipboardRecord {
            id: RecordId::from_string(self.id),
            content: self.content,
            kind,
            blob_key: self.blob_key.map(BlobKey::from_string),
            thumbnail_key: self.thumbnail_key.map(BlobKey::from_string),
            content_hash: self.content_hash,
            created_at_ms: self.created_at_ms,
            usage_count: self.usage_count,
            last_used_at_ms: self.last_used_at_ms,
            recommendation_score: self.recommendation_score,
            recommended_at_ms: self.recommended_at_ms,
            evicted_at_ms: self.evicted_at_ms,
            note: self.note,
            tags,
        })
    }
}
