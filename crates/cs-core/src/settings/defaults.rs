use super::model::*;

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_items: 100 }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            polling_interval_secs: 1,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self { save_images: true }
    }
}

impl Default for ImageCacheSettings {
    fn default() -> Self {
        Self {
            max_bytes: 500 * 1024 * 1024,
            max_items: 500,
        }
    }
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            min_usage_count: 3,
            half_life_hours: 72.0,
            max_recommendations: 5,
            recalculate_interval_secs: 300,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            history: HistorySettings::default(),
            monitor: MonitorSettings::default(),
            capture: CaptureSettings::default(),
            image_cache: ImageCacheSettings::default(),
            recommend: RecommendSettings::default(),
        }
    }
}
