use std::path::Path;

use serde::{Deserialize, Serialize};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Maximum number of history records kept by retention (tagged records
    /// may push the effective count above this).
    pub max_items: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Fallback poll interval for the change monitor.
    pub polling_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// When disabled, image snapshots are discarded instead of captured.
    pub save_images: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCacheSettings {
    pub max_bytes: u64,
    pub max_items: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendSettings {
    /// Minimum usage count before a record can be recommended.
    pub min_usage_count: i64,

    /// Usage-decay half-life in hours.
    pub half_life_hours: f64,

    /// Size bound of the recommended set.
    pub max_recommendations: usize,

    /// Interval of the background reconciliation pass.
    pub recalculate_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub history: HistorySettings,

    #[serde(default)]
    pub monitor: MonitorSettings,

    #[serde(default)]
    pub capture: CaptureSettings,

    #[serde(default)]
    pub image_cache: ImageCacheSettings,

    #[serde(default)]
    pub recommend: RecommendSettings,
}

fn current_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Settings {
    /// Load settings from a TOML file. Missing sections fall back to
    /// defaults; out-of-range values are clamped, not rejected.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&raw)?;
        Ok(settings.sanitized())
    }

    /// Clamp every out-of-range value to a safe default. Configuration
    /// problems degrade behavior; they never fail an operation.
    pub fn sanitized(mut self) -> Self {
        if self.history.max_items == 0 {
            self.history.max_items = 1;
        }
        if self.monitor.polling_interval_secs == 0 {
            self.monitor.polling_interval_secs =
                MonitorSettings::default().polling_interval_secs;
        }
        if self.image_cache.max_bytes == 0 {
            self.image_cache.max_bytes = ImageCacheSettings::default().max_bytes;
        }
        if self.image_cache.max_items == 0 {
            self.image_cache.max_items = 1;
        }
        if self.recommend.max_recommendations == 0 {
            self.recommend.max_recommendations = 1;
        }
        if self.recommend.min_usage_count < 1 {
            self.recommend.min_usage_count = 1;
        }
        if !self.recommend.half_life_hours.is_finite()
            || self.recommend.half_life_hours <= 0.0
        {
            self.recommend.half_life_hours =
                RecommendSettings::default().half_life_hours;
        }
        if self.recommend.recalculate_interval_secs == 0 {
            self.recommend.recalculate_interval_secs =
                RecommendSettings::default().recalculate_interval_secs;
        }
        self
    }
}
