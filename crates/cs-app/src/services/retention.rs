use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};

use cs_core::dedup::SeenHashes;
use cs_core::ports::{BlobCachePort, RecordStorePort};

use crate::event::{AppEvent, EventBus};

/// Keeps history within the configured size bound.
///
/// Eviction candidates are the oldest untagged records; tagged records are
/// pinned and never auto-evicted, so the effective count may stay above the
/// bound when enough records are pinned. Blobs are dropped before the row,
/// so a crash leaves an orphan blob rather than a dangling reference.
pub struct RetentionService {
    store: Arc<dyn RecordStorePort>,
    blob_cache: Arc<dyn BlobCachePort>,
    seen: Arc<SeenHashes>,
    max_items: usize,
    events: EventBus,
}

impl RetentionService {
    pub fn new(
        store: Arc<dyn RecordStorePort>,
        blob_cache: Arc<dyn BlobCachePort>,
        seen: Arc<SeenHashes>,
        max_items: usize,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            blob_cache,
            seen,
            max_items: max_items.max(1),
            events,
        }
    }

    /// Evict overflow, oldest untagged first. Returns how many records
    /// were removed.
    pub async fn enforce(&self) -> Result<usize> {
        let count = self.store.count().await?;
        let overflow = count - self.max_items as i64;
        if overflow <= 0 {
            return Ok(0);
        }

        let victims = self.store.oldest_untagged(overflow).await?;
        if victims.is_empty() {
            debug!("history over bound but every candidate is pinned");
            return Ok(0);
        }

        let mut evicted = 0usize;
        for victim in &victims {
            // One stuck candidate must not stall the whole pass.
            if let Err(err) = self.evict_one(victim).await {
                warn!("retention failed to evict record {}: {:?}", victim.id, err);
                continue;
            }
            evicted += 1;
        }

        info!("retention evicted {} record(s)", evicted);
        Ok(evicted)
    }

    async fn evict_one(&self, victim: &cs_core::clipboard::ClipboardRecord) -> Result<()> {
        if let Some(key) = &victim.blob_key {
            self.blob_cache.delete(key).await?;
        }
        if let Some(key) = &victim.thumbnail_key {
            self.blob_cache.delete(key).await?;
        }
        self.store.delete(&victim.id).await?;
        self.seen.forget(victim.content_hash);
        self.events.publish(AppEvent::Deleted {
            id: victim.id.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::{MemoryBlobCache, MemoryStore};
    use cs_core::clipboard::ClipboardRecord;
    use cs_core::ids::BlobKey;

    fn service(
        store: Arc<MemoryStore>,
        blobs: Arc<MemoryBlobCache>,
        max_items: usize,
    ) -> RetentionService {
        RetentionService::new(
            store,
            blobs,
            Arc::new(SeenHashes::default()),
            max_items,
            EventBus::new(),
        )
    }

    #[tokio::test]
    async fn test_under_bound_evicts_nothing() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..3 {
            store
                .insert(&ClipboardRecord::new_text(format!("t{i}"), i, i))
                .await
                .unwrap();
        }

        let svc = service(store.clone(), Arc::new(MemoryBlobCache::new()), 5);
        assert_eq!(svc.enforce().await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_overflow_evicts_oldest_first() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..7i64 {
            store
                .insert(&ClipboardRecord::new_text(format!("t{i}"), i, 1_000 + i))
                .await
                .unwrap();
        }

        let svc = service(store.clone(), Arc::new(MemoryBlobCache::new()), 5);
        assert_eq!(svc.enforce().await.unwrap(), 2);

        let remaining = store.list_all().await.unwrap();
        assert_eq!(remaining.len(), 5);
        assert!(remaining.iter().all(|r| r.created_at_ms >= 1_002));
    }

    #[tokio::test]
    async fn test_tagged_records_are_exempt() {
        let store = Arc::new(MemoryStore::new());
        let mut pinned = ClipboardRecord::new_text("keep".into(), 0, 1_000);
        pinned.tags = vec!["important".into()];
        store.insert(&pinned).await.unwrap();
        for i in 1..4i64 {
            store
                .insert(&ClipboardRecord::new_text(format!("t{i}"), i, 1_000 + i))
                .await
                .unwrap();
        }

        // bound 2, four records: the two oldest *untagged* go
        let svc = service(store.clone(), Arc::new(MemoryBlobCache::new()), 2);
        assert_eq!(svc.enforce().await.unwrap(), 2);

        let remaining = store.list_all().await.unwrap();
        assert!(remaining.iter().any(|r| r.content == "keep"));
        assert!(remaining.iter().any(|r| r.content == "t3"));
    }

    #[tokio::test]
    async fn test_eviction_drops_blobs() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobCache::new());

        let blob_key = BlobKey::new();
        let thumb_key = BlobKey::new();
        blobs.save(&blob_key, b"pixels").await.unwrap();
        blobs.save(&thumb_key, b"thumb").await.unwrap();
        store
            .insert(&ClipboardRecord::new_image(
                blob_key.clone(),
                thumb_key,
                9,
                1_000,
            ))
            .await
            .unwrap();
        store
            .insert(&ClipboardRecord::new_text("newer".into(), 1, 2_000))
            .await
            .unwrap();

        let svc = service(store.clone(), blobs.clone(), 1);
        assert_eq!(svc.enforce().await.unwrap(), 1);
        assert_eq!(blobs.count().await.unwrap(), 0);
        assert_eq!(blobs.load(&blob_key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_all_pinned_keeps_history_over_bound() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..3i64 {
            let mut record = ClipboardRecord::new_text(format!("t{i}"), i, 1_000 + i);
            record.tags = vec!["pin".into()];
            store.insert(&record).await.unwrap();
        }

        let svc = service(store.clone(), Arc::new(MemoryBlobCache::new()), 1);
        assert_eq!(svc.enforce().await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 3);
    }
}
