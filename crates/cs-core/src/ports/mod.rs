//! Ports (trait boundaries) the engine consumes. Adapters live in
//! `cs-infra`; tests substitute in-memory fakes.

pub mod blob_cache;
pub mod clipboard;
pub mod clock;
pub mod image;
pub mod record_store;

pub use blob_cache::BlobCachePort;
pub use clipboard::SystemClipboardPort;
pub use clock::ClockPort;
pub use image::{CaptureImageEncoderPort, EncodedCapture};
pub use record_store::{RecommendationChange, RecordStorePort};
