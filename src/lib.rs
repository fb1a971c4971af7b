//! # clipstash
//!
//! Clipboard history engine: capture with deduplication, bounded retention
//! and usage-decay recommendations.
//!
//! The workspace follows a ports-and-adapters split:
//! - `cs-core`: domain types, scoring, dedup fast path, port traits
//! - `cs-infra`: Diesel/SQLite store, filesystem blob cache, image pipeline
//! - `cs-app`: services (monitor, capture, retention, recommendation,
//!   history)
//!
//! [`Engine`] wires the adapters into the services. The platform clipboard
//! adapter is injected by the host, everything else is built from an
//! [`EngineConfig`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use cs_app::{
    AppDeps, AppEvent, CaptureService, ChangeMonitor, EventBus, HistoryService,
    RecommendationEngine, RetentionService,
};
use cs_core::dedup::SeenHashes;
use cs_core::ports::SystemClipboardPort;
use cs_core::Settings;
use cs_infra::{init_db_pool, CaptureImageEncoder, DieselRecordStore, FsBlobCache, SystemClock};

pub use cs_app::services::capture::CaptureOutcome;
pub use cs_core::clipboard::{ClipboardRecord, ClipboardSnapshot, IMAGE_CONTENT_PLACEHOLDER};
pub use cs_core::ids::{BlobKey, RecordId};
pub use cs_core::{ContentKind, Settings as EngineSettings};

const DB_FILE_NAME: &str = "clipstash.db";

/// Where the engine keeps its state and how it behaves.
pub struct EngineConfig {
    /// Directory for the database and the blob cache. Created if missing.
    pub data_dir: PathBuf,
    pub settings: Settings,
}

impl EngineConfig {
    /// Load settings from `<data_dir>/settings.toml` when present,
    /// otherwise use defaults.
    pub fn from_data_dir(data_dir: PathBuf) -> Self {
        let settings_path = data_dir.join("settings.toml");
        let settings = if settings_path.exists() {
            Settings::load(&settings_path).unwrap_or_else(|e| {
                log::warn!("settings unreadable, using defaults: {}", e);
                Settings::default().sanitized()
            })
        } else {
            Settings::default().sanitized()
        };
        Self { data_dir, settings }
    }
}

/// The assembled engine.
pub struct Engine {
    monitor: Arc<ChangeMonitor>,
    capture: Arc<CaptureService>,
    recommendation: Arc<RecommendationEngine>,
    history: Arc<HistoryService>,
    events: EventBus,
}

impl Engine {
    /// Build the engine with the default adapters rooted at
    /// `config.data_dir`. The system clipboard adapter is host-provided.
    pub async fn bootstrap(
        config: EngineConfig,
        clipboard: Arc<dyn SystemClipboardPort>,
    ) -> Result<Self> {
        let settings = config.settings.sanitized();

        std::fs::create_dir_all(&config.data_dir).context("create data directory")?;
        let db_path = config.data_dir.join(DB_FILE_NAME);
        let db_url = db_path
            .to_str()
            .context("data directory path is not valid UTF-8")?;
        let pool = init_db_pool(db_url)?;

        let clock = Arc::new(SystemClock);
        let blob_cache = FsBlobCache::open(
            config.data_dir.join("cache"),
            &settings.image_cache,
            clock.clone(),
        )
        .await?;

        let deps = AppDeps {
            clipboard,
            record_store: Arc::new(DieselRecordStore::new(pool)),
            blob_cache: Arc::new(blob_cache),
            image_encoder: Arc::new(CaptureImageEncoder::new()),
            clock,
        };
        Ok(Self::from_deps(deps, settings))
    }

    /// Wire the services from explicit adapters. Used by tests and hosts
    /// with custom storage.
    pub fn from_deps(deps: AppDeps, settings: Settings) -> Self {
        let events = EventBus::new();
        let seen = Arc::new(SeenHashes::default());

        let retention = Arc::new(RetentionService::new(
            deps.record_store.clone(),
            deps.blob_cache.clone(),
            seen.clone(),
            settings.history.max_items,
            events.clone(),
        ));
        let capture = Arc::new(CaptureService::new(
            deps.record_store.clone(),
            deps.blob_cache.clone(),
            deps.image_encoder.clone(),
            deps.clock.clone(),
            seen.clone(),
            retention,
            settings.capture.clone(),
            events.clone(),
        ));
        let monitor = Arc::new(ChangeMonitor::new(
            deps.clipboard.clone(),
            capture.clone(),
            &settings.monitor,
        ));
        let recommendation = Arc::new(RecommendationEngine::new(
            deps.record_store.clone(),
            deps.clock.clone(),
            settings.recommend.clone(),
            events.clone(),
        ));
        let history = Arc::new(HistoryService::new(
            deps.record_store,
            deps.blob_cache,
            deps.clipboard,
            deps.clock,
            seen,
            settings.recommend,
            events.clone(),
        ));

        Self {
            monitor,
            capture,
            recommendation,
            history,
            events,
        }
    }

    /// Start the background loops (clipboard monitoring, periodic
    /// recommendation passes) and capture whatever is already on the
    /// clipboard. Idempotent.
    pub async fn start(&self) -> Result<()> {
        self.monitor.start().await?;
        self.recommendation.start().await?;
        if let Err(err) = self.monitor.check_now().await {
            log::warn!("initial clipboard check failed: {:?}", err);
        }
        Ok(())
    }

    /// Stop the background loops. Idempotent; no capture is in flight
    /// after return.
    pub async fn stop(&self) -> Result<()> {
        self.monitor.stop().await?;
        self.recommendation.stop().await?;
        Ok(())
    }

    pub fn monitor(&self) -> &ChangeMonitor {
        &self.monitor
    }

    pub fn capture(&self) -> &CaptureService {
        &self.capture
    }

    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    pub fn recommendations(&self) -> &RecommendationEngine {
        &self.recommendation
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }
}
