use anyhow::Result;
use async_trait::async_trait;

use crate::ids::BlobKey;

/// Content-addressed store for binary payloads (compressed images and
/// thumbnails), bounded independently of record lifecycle.
///
/// Implementations evict least-recently-accessed entries after `save` when
/// the configured size or count budget is exceeded, and persist access
/// times so the eviction order survives restarts.
#[async_trait]
pub trait BlobCachePort: Send + Sync {
    /// Idempotent write; touches the access time.
    async fn save(&self, key: &BlobKey, bytes: &[u8]) -> Result<()>;

    /// `None` for a missing blob — a record pointing at an evicted or lost
    /// blob is a tolerated anomaly, not an error.
    async fn load(&self, key: &BlobKey) -> Result<Option<Vec<u8>>>;

    /// Best-effort; deleting a missing key is not an error.
    async fn delete(&self, key: &BlobKey) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    async fn size_bytes(&self) -> Result<u64>;
    async fn count(&self) -> Result<usize>;
}
