use anyhow::Result;

use crate::clipboard::ClipboardSnapshot;

/// Boundary to the shared system clipboard resource.
///
/// The platform adapter is glue outside this workspace; tests use an
/// in-memory fake. `change_count` is an opaque monotonic counter: the
/// monitor only compares it against the last observed value, never
/// interprets it.
pub trait SystemClipboardPort: Send + Sync {
    fn change_count(&self) -> Result<u64>;

    /// Read the current snapshot (declared representations + version).
    fn read(&self) -> Result<ClipboardSnapshot>;

    /// Copy-back paths. Writing bumps the platform change counter, so a
    /// copy-back is observed again by the monitor as a duplicate capture.
    fn write_text(&self, text: &str) -> Result<()>;
    fn write_image(&self, bytes: &[u8]) -> Result<()>;
}
