/// One observation of the system clipboard at a given version of its
/// change counter.
///
/// The snapshot carries the representations that were declared present when
/// it was read. A snapshot with neither readable text nor an image payload
/// is discarded by the monitor without creating history.
#[derive(Debug, Clone, Default)]
pub struct ClipboardSnapshot {
    /// Opaque, monotonic change counter of the clipboard at read time.
    pub version: u64,

    /// Plain-text representation, if the clipboard declared one.
    pub text: Option<String>,

    /// Encoded image representation (PNG/JPEG bytes as handed over by the
    /// platform), if the clipboard declared one.
    pub image_bytes: Option<Vec<u8>>,
}

impl ClipboardSnapshot {
    pub fn has_image(&self) -> bool {
        self.image_bytes.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// Whitespace-only text does not count as capturable content.
    pub fn has_text(&self) -> bool {
        self.text.as_ref().is_some_and(|t| !t.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_image() && !self.has_text()
    }
}
