use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;

use cs_core::clipboard::hash::content_hash_text;
use cs_core::clipboard::ClipboardRecord;
use cs_core::dedup::SeenHashes;
use cs_core::ids::RecordId;
use cs_core::ports::{BlobCachePort, ClockPort, RecordStorePort, SystemClipboardPort};
use cs_core::recommend::score_at;
use cs_core::settings::RecommendSettings;
use cs_core::ContentKind;

use crate::event::{AppEvent, EventBus};

/// User-facing history operations: browsing, copy-back, editing, tagging
/// and deletion.
pub struct HistoryService {
    store: Arc<dyn RecordStorePort>,
    blob_cache: Arc<dyn BlobCachePort>,
    clipboard: Arc<dyn SystemClipboardPort>,
    clock: Arc<dyn ClockPort>,
    seen: Arc<SeenHashes>,
    recommend: RecommendSettings,
    events: EventBus,
}

impl HistoryService {
    pub fn new(
        store: Arc<dyn RecordStorePort>,
        blob_cache: Arc<dyn BlobCachePort>,
        clipboard: Arc<dyn SystemClipboardPort>,
        clock: Arc<dyn ClockPort>,
        seen: Arc<SeenHashes>,
        recommend: RecommendSettings,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            blob_cache,
            clipboard,
            clock,
            seen,
            recommend,
            events,
        }
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ClipboardRecord>> {
        self.store.list_recent(limit, offset).await
    }

    pub async fn get(&self, id: &RecordId) -> Result<Option<ClipboardRecord>> {
        self.store.get(id).await
    }

    pub async fn thumbnail(&self, id: &RecordId) -> Result<Option<Vec<u8>>> {
        let Some(record) = self.store.get(id).await? else {
            return Ok(None);
        };
        match &record.thumbnail_key {
            Some(key) => self.blob_cache.load(key).await,
            None => Ok(None),
        }
    }

    /// Copy a record back to the system clipboard and register the usage
    /// signal. A record not already in the recommended set is promoted
    /// immediately as a first-touch signal; the next reconciliation pass
    /// settles whether it stays.
    pub async fn copy_to_clipboard(&self, id: &RecordId) -> Result<ClipboardRecord> {
        let record = self
            .store
            .get(id)
            .await?
            .with_context(|| format!("record not found: {id}"))?;

        match record.kind {
            ContentKind::Text => self.clipboard.write_text(&record.content)?,
            ContentKind::Image => {
                let key = record
                    .blob_key
                    .as_ref()
                    .context("image record without blob key")?;
                let bytes = self
                    .blob_cache
                    .load(key)
                    .await?
                    .with_context(|| format!("image blob missing for record {id}"))?;
                self.clipboard.write_image(&bytes)?;
            }
        }

        let now_ms = self.clock.now_ms();
        let usage = record.usage_count + 1;
        // Just used: no decay has elapsed, the score is the usage count.
        let score = score_at(usage, Some(now_ms), now_ms, self.recommend.half_life_hours);
        let mark_recommended = !record.is_recommended();

        self.store
            .record_usage(id, now_ms, score, mark_recommended)
            .await?;
        self.events.publish(AppEvent::Updated { id: id.clone() });

        self.store
            .get(id)
            .await?
            .with_context(|| format!("record vanished after usage update: {id}"))
    }

    /// Edit the text of a record. The content hash is recomputed, so a
    /// future capture of the old text starts a fresh record while the new
    /// text deduplicates against this one.
    pub async fn update_content(&self, id: &RecordId, content: &str) -> Result<()> {
        let record = self
            .store
            .get(id)
            .await?
            .with_context(|| format!("record not found: {id}"))?;
        if record.kind != ContentKind::Text {
            bail!("only text records can be edited: {id}");
        }

        let new_hash = content_hash_text(content);
        self.store.update_content(id, content, new_hash).await?;
        self.seen.forget(record.content_hash);
        self.seen.remember(new_hash, id.clone());
        self.events.publish(AppEvent::Updated { id: id.clone() });
        Ok(())
    }

    /// Replace the tag set. A non-empty set pins the record against
    /// retention eviction.
    pub async fn set_tags(&self, id: &RecordId, tags: &[String]) -> Result<()> {
        self.store.set_tags(id, tags).await?;
        self.events.publish(AppEvent::Updated { id: id.clone() });
        Ok(())
    }

    pub async fn set_note(&self, id: &RecordId, note: Option<&str>) -> Result<()> {
        self.store.set_note(id, note).await?;
        self.events.publish(AppEvent::Updated { id: id.clone() });
        Ok(())
    }

    /// Delete one record, blobs first.
    pub async fn delete(&self, id: &RecordId) -> Result<()> {
        let record = self
            .store
            .get(id)
            .await?
            .with_context(|| format!("record not found: {id}"))?;

        if let Some(key) = &record.blob_key {
            self.blob_cache.delete(key).await?;
        }
        if let Some(key) = &record.thumbnail_key {
            self.blob_cache.delete(key).await?;
        }
        self.store.delete(id).await?;
        self.seen.forget(record.content_hash);

        info!("deleted record {}", id);
        self.events.publish(AppEvent::Deleted { id: id.clone() });
        Ok(())
    }

    /// Clear all history and cached blobs.
    pub async fn clear(&self) -> Result<usize> {
        self.blob_cache.clear().await?;
        let removed = self.store.delete_all().await?;
        self.seen.clear();

        info!("cleared history ({} record(s))", removed);
        self.events.publish(AppEvent::Cleared);
        Ok(removed)
    }
}
