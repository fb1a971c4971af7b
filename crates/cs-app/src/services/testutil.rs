//! In-memory port fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use cs_core::clipboard::{ClipboardRecord, ClipboardSnapshot};
use cs_core::ids::{BlobKey, RecordId};
use cs_core::ports::{
    BlobCachePort, CaptureImageEncoderPort, ClockPort, EncodedCapture, RecommendationChange,
    RecordStorePort, SystemClipboardPort,
};

/// Settable test clock.
pub struct TestClock(AtomicI64);

impl TestClock {
    pub fn new(start_ms: i64) -> Self {
        Self(AtomicI64::new(start_ms))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.0.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Vec-backed record store with the same observable semantics as the
/// Diesel adapter.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ClipboardRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Vec<ClipboardRecord>) -> R) -> R {
        let mut records = self.records.lock().unwrap();
        f(&mut records)
    }

    fn with_record<R>(
        &self,
        id: &RecordId,
        f: impl FnOnce(&mut ClipboardRecord) -> R,
    ) -> Result<R> {
        self.with(|records| {
            records
                .iter_mut()
                .find(|r| &r.id == id)
                .map(f)
                .ok_or_else(|| anyhow!("record not found: {}", id))
        })
    }
}

#[async_trait]
impl RecordStorePort for MemoryStore {
    async fn insert(&self, record: &ClipboardRecord) -> Result<()> {
        self.with(|records| records.push(record.clone()));
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<ClipboardRecord>> {
        Ok(self.with(|records| records.iter().find(|r| &r.id == id).cloned()))
    }

    async fn find_by_hash(&self, content_hash: i64) -> Result<Option<ClipboardRecord>> {
        Ok(self.with(|records| {
            records
                .iter()
                .filter(|r| r.content_hash == content_hash)
                .max_by_key(|r| r.created_at_ms)
                .cloned()
        }))
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<ClipboardRecord>> {
        Ok(self.with(|records| {
            let mut sorted = records.clone();
            sorted.sort_by_key(|r| std::cmp::Reverse(r.created_at_ms));
            sorted
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect()
        }))
    }

    async fn list_all(&self) -> Result<Vec<ClipboardRecord>> {
        Ok(self.with(|records| records.clone()))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.with(|records| records.len() as i64))
    }

    async fn promote_duplicate(&self, id: &RecordId, now_ms: i64) -> Result<()> {
        self.with_record(id, |record| {
            record.created_at_ms = now_ms;
            record.usage_count += 1;
            record.last_used_at_ms = Some(now_ms);
            record.recommendation_score = record.usage_count as f64;
        })
    }

    async fn record_usage(
        &self,
        id: &RecordId,
        now_ms: i64,
        score: f64,
        mark_recommended: bool,
    ) -> Result<()> {
        self.with_record(id, |record| {
            record.usage_count += 1;
            record.last_used_at_ms = Some(now_ms);
            record.recommendation_score = score;
            if mark_recommended {
                record.recommended_at_ms = Some(now_ms);
                record.evicted_at_ms = None;
            }
        })
    }

    async fn update_content(
        &self,
        id: &RecordId,
        content: &str,
        content_hash: i64,
    ) -> Result<()> {
        self.with_record(id, |record| {
            record.content = content.to_string();
            record.content_hash = content_hash;
        })
    }

    async fn set_tags(&self, id: &RecordId, tags: &[String]) -> Result<()> {
        self.with_record(id, |record| record.tags = tags.to_vec())
    }

    async fn set_note(&self, id: &RecordId, note: Option<&str>) -> Result<()> {
        self.with_record(id, |record| record.note = note.map(str::to_string))
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.with(|records| records.retain(|r| &r.id != id));
        Ok(())
    }

    async fn delete_all(&self) -> Result<usize> {
        Ok(self.with(|records| {
            let removed = records.len();
            records.clear();
            removed
        }))
    }

    async fn oldest_untagged(&self, limit: i64) -> Result<Vec<ClipboardRecord>> {
        Ok(self.with(|records| {
            let mut untagged: Vec<_> = records
                .iter()
                .filter(|r| r.tags.is_empty())
                .cloned()
                .collect();
            untagged.sort_by_key(|r| r.created_at_ms);
            untagged.into_iter().take(limit as usize).collect()
        }))
    }

    async fn apply_recommendation_changes(
        &self,
        changes: &[RecommendationChange],
    ) -> Result<()> {
        for change in changes {
            match change {
                RecommendationChange::Promote { id, score, at_ms } => {
                    self.with_record(id, |record| {
                        record.recommended_at_ms = Some(*at_ms);
                        record.evicted_at_ms = None;
                        record.recommendation_score = *score;
                    })?;
                }
                RecommendationChange::Evict { id, score, at_ms } => {
                    self.with_record(id, |record| {
                        record.evicted_at_ms = Some(*at_ms);
                        record.recommended_at_ms = None;
                        record.recommendation_score = *score;
                    })?;
                }
                RecommendationChange::Rescore { id, score } => {
                    self.with_record(id, |record| {
                        record.recommendation_score = *score;
                    })?;
                }
            }
        }
        Ok(())
    }

    async fn recommended(&self, limit: i64) -> Result<Vec<ClipboardRecord>> {
        Ok(self.with(|records| {
            let mut members: Vec<_> = records
                .iter()
                .filter(|r| r.is_recommended())
                .cloned()
                .collect();
            members.sort_by(|a, b| {
                b.recommendation_score
                    .partial_cmp(&a.recommendation_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            members.into_iter().take(limit as usize).collect()
        }))
    }

    async fn recommendation_history(&self, limit: i64) -> Result<Vec<ClipboardRecord>> {
        Ok(self.with(|records| {
            let mut ever: Vec<_> = records
                .iter()
                .filter(|r| r.was_ever_recommended())
                .cloned()
                .collect();
            ever.sort_by_key(|r| {
                std::cmp::Reverse(
                    r.recommended_at_ms.unwrap_or(0).max(r.evicted_at_ms.unwrap_or(0)),
                )
            });
            ever.into_iter().take(limit as usize).collect()
        }))
    }
}

#[derive(Default)]
pub struct MemoryBlobCache {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobCachePort for MemoryBlobCache {
    async fn save(&self, key: &BlobKey, bytes: &[u8]) -> Result<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn load(&self, key: &BlobKey) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.lock().unwrap().get(key.inner()).cloned())
    }

    async fn delete(&self, key: &BlobKey) -> Result<()> {
        self.blobs.lock().unwrap().remove(key.inner());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.blobs.lock().unwrap().clear();
        Ok(())
    }

    async fn size_bytes(&self) -> Result<u64> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .values()
            .map(|b| b.len() as u64)
            .sum())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.blobs.lock().unwrap().len())
    }
}

/// Scripted system clipboard. `put_text`/`put_image` simulate an external
/// copy; `write_*` record copy-backs and bump the change counter like a
/// real platform clipboard does.
#[derive(Default)]
pub struct FakeClipboard {
    version: AtomicU64,
    state: Mutex<(Option<String>, Option<Vec<u8>>)>,
    pub written_texts: Mutex<Vec<String>>,
    pub written_images: Mutex<Vec<Vec<u8>>>,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_text(&self, text: &str) {
        *self.state.lock().unwrap() = (Some(text.to_string()), None);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    pub fn put_image(&self, bytes: &[u8]) {
        *self.state.lock().unwrap() = (None, Some(bytes.to_vec()));
        self.version.fetch_add(1, Ordering::SeqCst);
    }
}

impl SystemClipboardPort for FakeClipboard {
    fn change_count(&self) -> Result<u64> {
        Ok(self.version.load(Ordering::SeqCst))
    }

    fn read(&self) -> Result<ClipboardSnapshot> {
        let state = self.state.lock().unwrap();
        Ok(ClipboardSnapshot {
            version: self.version.load(Ordering::SeqCst),
            text: state.0.clone(),
            image_bytes: state.1.clone(),
        })
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.written_texts.lock().unwrap().push(text.to_string());
        *self.state.lock().unwrap() = (Some(text.to_string()), None);
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write_image(&self, bytes: &[u8]) -> Result<()> {
        self.written_images.lock().unwrap().push(bytes.to_vec());
        *self.state.lock().unwrap() = (None, Some(bytes.to_vec()));
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Identity "encoder": the payload is the input bytes, so tests control
/// the content hash directly.
pub struct PassthroughEncoder;

impl CaptureImageEncoderPort for PassthroughEncoder {
    fn encode_capture(&self, image_bytes: &[u8]) -> Result<EncodedCapture> {
        Ok(EncodedCapture {
            blob_bytes: image_bytes.to_vec(),
            thumbnail_bytes: b"thumb".to_vec(),
            width: 1,
            height: 1,
        })
    }
}
