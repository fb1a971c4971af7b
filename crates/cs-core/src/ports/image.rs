use anyhow::Result;

/// Result of processing a raw image snapshot for capture.
#[derive(Debug, Clone)]
pub struct EncodedCapture {
    /// Main payload: resized and re-encoded lossy bytes. The content hash
    /// of an image record is computed over these bytes.
    pub blob_bytes: Vec<u8>,

    /// Small fixed-size preview at lower quality.
    pub thumbnail_bytes: Vec<u8>,

    /// Dimensions of the (possibly resized) main payload.
    pub width: u32,
    pub height: u32,
}

/// CPU-bound image pipeline; the capture service offloads calls to a
/// blocking task so encode work never stalls change detection.
pub trait CaptureImageEncoderPort: Send + Sync {
    fn encode_capture(&self, image_bytes: &[u8]) -> Result<EncodedCapture>;
}
