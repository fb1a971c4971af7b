pub mod score;

pub use score::{
    days_since, decay_score, half_life_days, is_eligible, score_at,
    MIN_HALF_LIFE_HOURS, MIN_RECOMMENDATION_SCORE,
};
