//! Decayed-usage relevance scoring.
//!
//! `score = usage_count * exp(-λ * days_since_last_use)` with
//! `λ = ln(2) / half_life_days`: doubling the elapsed time at the half-life
//! halves the contribution. A record that has never been used scores 0 and
//! is never eligible.

/// Floor below which a score never qualifies for recommendation.
pub const MIN_RECOMMENDATION_SCORE: f64 = 1.0;

/// Lower clamp for the configured half-life, in hours (~2.5 minutes).
pub const MIN_HALF_LIFE_HOURS: f64 = 0.041;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Configured half-life in hours → effective half-life in days.
pub fn half_life_days(half_life_hours: f64) -> f64 {
    half_life_hours.max(MIN_HALF_LIFE_HOURS) / 24.0
}

/// Elapsed days since last use; `None` when the record was never used.
pub fn days_since(last_used_at_ms: Option<i64>, now_ms: i64) -> Option<f64> {
    last_used_at_ms.map(|used| ((now_ms - used).max(0)) as f64 / MS_PER_DAY)
}

/// The pure scoring function. `days_since_last_use == None` means "never
/// used", which scores 0 regardless of usage count.
pub fn decay_score(
    usage_count: i64,
    days_since_last_use: Option<f64>,
    half_life_days: f64,
) -> f64 {
    if usage_count <= 0 {
        return 0.0;
    }
    let Some(days) = days_since_last_use else {
        return 0.0;
    };

    let lambda = std::f64::consts::LN_2 / half_life_days;
    usage_count as f64 * (-lambda * days).exp()
}

/// Score a record's usage state at `now_ms`.
pub fn score_at(
    usage_count: i64,
    last_used_at_ms: Option<i64>,
    now_ms: i64,
    half_life_hours: f64,
) -> f64 {
    decay_score(
        usage_count,
        days_since(last_used_at_ms, now_ms),
        half_life_days(half_life_hours),
    )
}

/// Whether a record qualifies for the recommended set.
pub fn is_eligible(usage_count: i64, score: f64, min_usage_count: i64) -> bool {
    usage_count >= min_usage_count.max(1) && score >= MIN_RECOMMENDATION_SCORE
}
