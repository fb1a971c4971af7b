use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use cs_core::ids::BlobKey;
use cs_core::ports::{BlobCachePort, ClockPort};
use cs_core::settings::ImageCacheSettings;

const BLOBS_DIR: &str = "blobs";
const INDEX_FILE_NAME: &str = "access_index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobStat {
    last_access_ms: i64,
    size_bytes: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccessIndex {
    entries: HashMap<String, BlobStat>,
}

impl AccessIndex {
    fn total_bytes(&self) -> u64 {
        self.entries.values().map(|s| s.size_bytes).sum()
    }

    /// Key of the least-recently-accessed entry.
    fn lru_key(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, stat)| stat.last_access_ms)
            .map(|(key, _)| key.clone())
    }
}

/// On-disk blob cache with LRU eviction.
///
/// Blobs live as `<root>/blobs/<key>.bin`; access times are kept in a JSON
/// index persisted next to them, so the eviction order survives process
/// restarts. Eviction runs after every save until both the byte and item
/// budgets are satisfied.
pub struct FsBlobCache {
    root: PathBuf,
    max_bytes: u64,
    max_items: usize,
    clock: Arc<dyn ClockPort>,
    index: Mutex<AccessIndex>,
}

impl FsBlobCache {
    /// Open (or create) a cache rooted at `root`. A missing or corrupt
    /// index is rebuilt empty; existing blob files then age out as
    /// unindexed strays on `clear`.
    pub async fn open(
        root: PathBuf,
        settings: &ImageCacheSettings,
        clock: Arc<dyn ClockPort>,
    ) -> Result<Self> {
        fs::create_dir_all(root.join(BLOBS_DIR))
            .await
            .context("create blob cache directory")?;

        let index = match fs::read(root.join(INDEX_FILE_NAME)).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("blob cache index unreadable, rebuilding: {}", e);
                AccessIndex::default()
            }),
            Err(_) => AccessIndex::default(),
        };

        Ok(Self {
            root,
            max_bytes: settings.max_bytes,
            max_items: settings.max_items,
            clock,
            index: Mutex::new(index),
        })
    }

    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        self.root.join(BLOBS_DIR).join(format!("{}.bin", key))
    }

    async fn persist_index(&self, index: &AccessIndex) -> Result<()> {
        let bytes = serde_json::to_vec(index).context("serialize blob index")?;
        fs::write(self.root.join(INDEX_FILE_NAME), bytes)
            .await
            .context("persist blob index")?;
        Ok(())
    }

    /// Evict least-recently-accessed entries until both budgets hold.
    /// Caller holds the index lock.
    async fn evict_over_budget(&self, index: &mut AccessIndex) {
        while index.entries.len() > self.max_items || index.total_bytes() > self.max_bytes {
            let Some(key) = index.lru_key() else {
                break;
            };
            index.entries.remove(&key);

            let path = self.root.join(BLOBS_DIR).join(format!("{}.bin", key));
            if let Err(e) = fs::remove_file(&path).await {
                // Entry is already dropped from the index; a leftover file
                // is an orphan, not a dangling reference.
                warn!("failed to remove evicted blob {:?}: {}", path, e);
            } else {
                debug!("evicted blob {} (lru)", key);
            }
        }
    }
}

#[async_trait]
impl BlobCachePort for FsBlobCache {
    async fn save(&self, key: &BlobKey, bytes: &[u8]) -> Result<()> {
        let mut index = self.index.lock().await;

        fs::write(self.blob_path(key), bytes)
            .await
            .with_context(|| format!("write blob {}", key))?;

        index.entries.insert(
            key.to_string(),
            BlobStat {
                last_access_ms: self.clock.now_ms(),
                size_bytes: bytes.len() as u64,
            },
        );

        self.evict_over_budget(&mut index).await;
        self.persist_index(&index).await
    }

    async fn load(&self, key: &BlobKey) -> Result<Option<Vec<u8>>> {
        let mut index = self.index.lock().await;

        match fs::read(self.blob_path(key)).await {
            Ok(bytes) => {
                if let Some(stat) = index.entries.get_mut(key.inner()) {
                    stat.last_access_ms = self.clock.now_ms();
                    self.persist_index(&index).await?;
                }
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read blob {}", key)),
        }
    }

    async fn delete(&self, key: &BlobKey) -> Result<()> {
        let mut index = self.index.lock().await;

        if let Err(e) = fs::remove_file(self.blob_path(key)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to delete blob {}: {}", key, e);
            }
        }
        if index.entries.remove(key.inner()).is_some() {
            self.persist_index(&index).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut index = self.index.lock().await;

        let blobs_dir = self.root.join(BLOBS_DIR);
        fs::remove_dir_all(&blobs_dir)
            .await
            .context("clear blob cache")?;
        fs::create_dir_all(&blobs_dir)
            .await
            .context("recreate blob cache directory")?;

        let removed = index.entries.len();
        index.entries.clear();
        self.persist_index(&index).await?;
        info!("cleared blob cache ({} entries)", removed);
        Ok(())
    }

    async fn size_bytes(&self) -> Result<u64> {
        Ok(self.index.lock().await.total_bytes())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.index.lock().await.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use tempfile::TempDir;

    /// Deterministic clock: every reading is one millisecond later.
    struct TickingClock(AtomicI64);

    impl ClockPort for TickingClock {
        fn now_ms(&self) -> i64 {
            self.0.fetch_add(1, Ordering::SeqCst)
        }
    }

    fn settings(max_bytes: u64, max_items: usize) -> ImageCacheSettings {
        ImageCacheSettings {
            max_bytes,
            max_items,
        }
    }

    async fn open_cache_at(
        dir: &TempDir,
        max_bytes: u64,
        max_items: usize,
        start_ms: i64,
    ) -> FsBlobCache {
        FsBlobCache::open(
            dir.path().to_path_buf(),
            &settings(max_bytes, max_items),
            Arc::new(TickingClock(AtomicI64::new(start_ms))),
        )
        .await
        .unwrap()
    }

    async fn open_cache(dir: &TempDir, max_bytes: u64, max_items: usize) -> FsBlobCache {
        open_cache_at(dir, max_bytes, max_items, 1_000).await
    }

    #[tokio::test]
    async fn test_save_load_delete_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir, 1 << 20, 100).await;

        let key = BlobKey::new();
        cache.save(&key, b"payload").await.unwrap();
        assert_eq!(cache.load(&key).await.unwrap(), Some(b"payload".to_vec()));
        assert_eq!(cache.count().await.unwrap(), 1);
        assert_eq!(cache.size_bytes().await.unwrap(), 7);

        cache.delete(&key).await.unwrap();
        assert_eq!(cache.load(&key).await.unwrap(), None);

        // deleting a missing key is not an error
        cache.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_item_cap_evicts_least_recently_accessed() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir, 1 << 20, 10).await;

        let keys: Vec<BlobKey> = (0..10).map(|_| BlobKey::new()).collect();
        for key in &keys {
            cache.save(key, b"0123456789").await.unwrap();
        }

        // Touch the oldest so the second-oldest becomes the LRU victim.
        cache.load(&keys[0]).await.unwrap();

        let eleventh = BlobKey::new();
        cache.save(&eleventh, b"0123456789").await.unwrap();

        assert_eq!(cache.count().await.unwrap(), 10);
        assert_eq!(cache.load(&keys[1]).await.unwrap(), None, "lru evicted");
        assert!(cache.load(&keys[0]).await.unwrap().is_some());
        assert!(cache.load(&eleventh).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_byte_budget_evicts_until_satisfied() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir, 25, 100).await;

        let a = BlobKey::new();
        let b = BlobKey::new();
        let c = BlobKey::new();
        cache.save(&a, &[0u8; 10]).await.unwrap();
        cache.save(&b, &[0u8; 10]).await.unwrap();
        cache.save(&c, &[0u8; 10]).await.unwrap();

        assert!(cache.size_bytes().await.unwrap() <= 25);
        assert_eq!(cache.load(&a).await.unwrap(), None, "oldest evicted");
        assert!(cache.load(&b).await.unwrap().is_some());
        assert!(cache.load(&c).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_access_times_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let old = BlobKey::new();
        let fresh = BlobKey::new();

        {
            let cache = open_cache(&dir, 1 << 20, 100).await;
            cache.save(&old, b"old").await.unwrap();
            cache.save(&fresh, b"fresh").await.unwrap();
        }

        // Reopen with a tighter item budget: the pre-restart access order
        // must decide the victim.
        let cache = open_cache_at(&dir, 1 << 20, 1, 5_000).await;
        assert_eq!(cache.count().await.unwrap(), 2);

        cache.save(&BlobKey::new(), b"new").await.unwrap();
        assert_eq!(cache.count().await.unwrap(), 1);
        assert_eq!(cache.load(&old).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir, 1 << 20, 100).await;

        for _ in 0..3 {
            cache.save(&BlobKey::new(), b"x").await.unwrap();
        }
        cache.clear().await.unwrap();
        assert_eq!(cache.count().await.unwrap(), 0);
        assert_eq!(cache.size_bytes().await.unwrap(), 0);
    }
}
