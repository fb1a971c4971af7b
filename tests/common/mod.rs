//! Shared fixtures for the engine integration tests: a scripted system
//! clipboard, a settable clock and an engine builder over real storage
//! adapters in a temp directory.

use std::path::Path;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use clipstash::{Engine, EngineSettings};
use cs_app::AppDeps;
use cs_core::clipboard::ClipboardSnapshot;
use cs_core::ports::{ClockPort, SystemClipboardPort};
use cs_infra::{init_db_pool, CaptureImageEncoder, DieselRecordStore, FsBlobCache};

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

#[derive(Default)]
pub struct FakeClipboard {
    version: AtomicU64,
    state: Mutex<(Option<String>, Option<Vec<u8>>)>,
    pub written_texts: Mutex<Vec<String>>,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an external copy.
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
        *self.state.lock().unwrap() = (None, Some(bytes.to_vec()));
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Build an engine over real SQLite/filesystem adapters rooted at `dir`.
/// Calling this twice on the same directory simulates a restart: the
/// in-process state is fresh, the storage is not.
pub async fn build_engine(
    dir: &Path,
    settings: EngineSettings,
    clock: Arc<TestClock>,
    clipboard: Arc<FakeClipboard>,
) -> Engine {
    let settings = settings.sanitized();
    let db_path = dir.join("clipstash.db");
    let pool = init_db_pool(db_path.to_str().unwrap()).unwrap();
    let blob_cache = FsBlobCache::open(dir.join("cache"), &settings.image_cache, clock.clone())
        .await
        .unwrap();

    let deps = AppDeps {
        clipboard,
        record_store: Arc::new(DieselRecordStore::new(pool)),
        blob_cache: Arc::new(blob_cache),
        image_encoder: Arc::new(CaptureImageEncoder::new()),
        clock,
    };
    Engine::from_deps(deps, settings)
}

/// Deterministic PNG bytes for image-capture tests.
pub fn png_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([shade, shade, shade]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
    bytes
}
