mod defaults;
mod model;

pub use model::{
    CaptureSettings, HistorySettings, ImageCacheSettings, MonitorSettings,
    RecommendSettings, Settings, SettingsError, CURRENT_SCHEMA_VERSION,
};
