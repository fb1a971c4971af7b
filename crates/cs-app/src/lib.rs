//! # cs-app
//!
//! Application services of ClipStash: change monitoring, capture with
//! deduplication, retention, recommendation reconciliation and the history
//! operations. Services depend only on `cs-core` ports; adapters are
//! injected through [`AppDeps`].

pub mod deps;
pub mod event;
pub mod services;

pub use deps::AppDeps;
pub use event::{AppEvent, EventBus};
pub use services::capture::{CaptureOutcome, CaptureService};
pub use services::history::HistoryService;
pub use services::monitor::ChangeMonitor;
pub use services::recommendation::RecommendationEngine;
pub use services::retention::RetentionService;
