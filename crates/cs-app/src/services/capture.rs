use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};

use cs_core::clipboard::hash::{content_hash_bytes, content_hash_text};
use cs_core::clipboard::{ClipboardRecord, ClipboardSnapshot};
use cs_core::dedup::SeenHashes;
use cs_core::ports::{
    BlobCachePort, CaptureImageEncoderPort, ClockPort, RecordStorePort,
};
use cs_core::settings::CaptureSettings;

use crate::event::{AppEvent, EventBus};
use crate::services::retention::RetentionService;

/// What a capture produced.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// A new record entered history.
    New(ClipboardRecord),
    /// The content was already known; the existing record was promoted.
    Duplicate(ClipboardRecord),
}

impl CaptureOutcome {
    pub fn record(&self) -> &ClipboardRecord {
        match self {
            CaptureOutcome::New(record) | CaptureOutcome::Duplicate(record) => record,
        }
    }
}

/// Turns clipboard snapshots into history records.
///
/// Identity is the content hash: a re-captured hash promotes the existing
/// record instead of inserting a second one. Image snapshots take
/// precedence over a text representation in the same snapshot, and are
/// hashed over the re-encoded payload bytes so the same pixels collapse to
/// the same record regardless of the source encoding.
pub struct CaptureService {
    store: Arc<dyn RecordStorePort>,
    blob_cache: Arc<dyn BlobCachePort>,
    encoder: Arc<dyn CaptureImageEncoderPort>,
    clock: Arc<dyn ClockPort>,
    seen: Arc<SeenHashes>,
    retention: Arc<RetentionService>,
    settings: CaptureSettings,
    events: EventBus,
}

impl CaptureService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn RecordStorePort>,
        blob_cache: Arc<dyn BlobCachePort>,
        encoder: Arc<dyn CaptureImageEncoderPort>,
        clock: Arc<dyn ClockPort>,
        seen: Arc<SeenHashes>,
        retention: Arc<RetentionService>,
        settings: CaptureSettings,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            blob_cache,
            encoder,
            clock,
            seen,
            retention,
            settings,
            events,
        }
    }

    /// Capture one snapshot. Returns `None` when the snapshot carries no
    /// capturable content (empty, whitespace-only text, or an image while
    /// image capture is disabled).
    pub async fn capture(&self, snapshot: ClipboardSnapshot) -> Result<Option<CaptureOutcome>> {
        if snapshot.has_image() {
            if !self.settings.save_images {
                debug!("image snapshot discarded: image capture disabled");
                if snapshot.has_text() {
                    return self.capture_text(&snapshot).await.map(Some);
                }
                return Ok(None);
            }
            return self.capture_image(&snapshot).await.map(Some);
        }
        if snapshot.has_text() {
            return self.capture_text(&snapshot).await.map(Some);
        }
        Ok(None)
    }

    async fn capture_text(&self, snapshot: &ClipboardSnapshot) -> Result<CaptureOutcome> {
        let text = snapshot
            .text
            .clone()
            .context("text snapshot without text representation")?;
        let hash = content_hash_text(&text);

        if let Some(existing) = self.find_existing(hash).await? {
            return self.promote(existing).await;
        }

        let record = ClipboardRecord::new_text(text, hash, self.clock.now_ms());
        self.store.insert(&record).await?;
        self.finish_new(record).await
    }

    async fn capture_image(&self, snapshot: &ClipboardSnapshot) -> Result<CaptureOutcome> {
        let raw = snapshot
            .image_bytes
            .clone()
            .context("image snapshot without image bytes")?;

        // Encoding is CPU-bound; keep it off the async workers so change
        // detection is not stalled by a large screenshot.
        let encoder = self.encoder.clone();
        let encoded = tokio::task::spawn_blocking(move || encoder.encode_capture(&raw))
            .await
            .context("image encode task panicked")??;

        let hash = content_hash_bytes(&encoded.blob_bytes);
        if let Some(existing) = self.find_existing(hash).await? {
            return self.promote(existing).await;
        }

        let record = ClipboardRecord::new_image(
            cs_core::ids::BlobKey::new(),
            cs_core::ids::BlobKey::new(),
            hash,
            self.clock.now_ms(),
        );
        // Blobs land before the row so the record never references missing
        // pixels.
        if let Some(key) = &record.blob_key {
            self.blob_cache.save(key, &encoded.blob_bytes).await?;
        }
        if let Some(key) = &record.thumbnail_key {
            self.blob_cache.save(key, &encoded.thumbnail_bytes).await?;
        }
        self.store.insert(&record).await?;
        self.finish_new(record).await
    }

    /// Fast-path lookup through the in-process seen set, falling back to
    /// the authoritative store scan. A stale fast-path entry (record since
    /// deleted) is dropped and the scan still runs.
    async fn find_existing(&self, hash: i64) -> Result<Option<ClipboardRecord>> {
        if let Some(id) = self.seen.lookup(hash) {
            match self.store.get(&id).await? {
                Some(record) if record.content_hash == hash => return Ok(Some(record)),
                _ => self.seen.forget(hash),
            }
        }
        self.store.find_by_hash(hash).await
    }

    async fn promote(&self, existing: ClipboardRecord) -> Result<CaptureOutcome> {
        let now_ms = self.clock.now_ms();
        self.store.promote_duplicate(&existing.id, now_ms).await?;
        self.seen.remember(existing.content_hash, existing.id.clone());

        let promoted = self
            .store
            .get(&existing.id)
            .await?
            .context("promoted record vanished")?;
        debug!("duplicate capture promoted record {}", promoted.id);
        self.events.publish(AppEvent::Captured {
            record: promoted.clone(),
            duplicate: true,
        });
        Ok(CaptureOutcome::Duplicate(promoted))
    }

    async fn finish_new(&self, record: ClipboardRecord) -> Result<CaptureOutcome> {
        self.seen.remember(record.content_hash, record.id.clone());
        self.retention.enforce().await?;

        info!("captured new {} record {}", record.kind.as_str(), record.id);
        self.events.publish(AppEvent::Captured {
            record: record.clone(),
            duplicate: false,
        });
        Ok(CaptureOutcome::New(record))
    }
}
