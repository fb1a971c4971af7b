//! Dependency grouping for engine construction. This is not a builder:
//! no defaults, no hidden logic, just parameter packing.

use std::sync::Arc;

use cs_core::ports::{
    BlobCachePort, CaptureImageEncoderPort, ClockPort, RecordStorePort, SystemClipboardPort,
};

pub struct AppDeps {
    pub clipboard: Arc<dyn SystemClipboardPort>,
    pub record_store: Arc<dyn RecordStorePort>,
    pub blob_cache: Arc<dyn BlobCachePort>,
    pub image_encoder: Arc<dyn CaptureImageEncoderPort>,
    pub clock: Arc<dyn ClockPort>,
}
