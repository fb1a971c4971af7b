use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;

use cs_core::clipboard::ClipboardRecord;
use cs_core::ids::RecordId;
use cs_core::ports::{ClockPort, RecommendationChange, RecordStorePort};
use cs_core::recommend::{is_eligible, score_at};
use cs_core::settings::RecommendSettings;

use crate::event::{AppEvent, EventBus};

const SCORE_EPSILON: f64 = 1e-9;

/// Cap on the ever-recommended listing.
pub const RECOMMENDATION_HISTORY_LIMIT: i64 = 50;

/// Maintains the bounded recommended set.
///
/// Membership is sticky: a member keeps its slot as long as it stays
/// eligible, and newcomers fill only the slots vacated in the same pass.
/// Out-of-band promotions (first-touch on copy-back, manual pins) are
/// kept while eligible and within the bound; the surplus beyond the
/// bound loses its membership lowest score first.
pub struct RecommendationEngine {
    store: Arc<dyn RecordStorePort>,
    clock: Arc<dyn ClockPort>,
    settings: RecommendSettings,
    events: EventBus,
    running: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RecommendationEngine {
    pub fn new(
        store: Arc<dyn RecordStorePort>,
        clock: Arc<dyn ClockPort>,
        settings: RecommendSettings,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            clock,
            settings,
            events,
            running: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    /// One reconciliation pass. Returns the number of membership changes
    /// (promotions plus evictions).
    pub async fn recalculate(&self) -> Result<usize> {
        let now_ms = self.clock.now_ms();
        let records = self.store.list_all().await?;

        let mut scored: Vec<(&ClipboardRecord, f64)> = records
            .iter()
            .map(|record| {
                let score = score_at(
                    record.usage_count,
                    record.last_used_at_ms,
                    now_ms,
                    self.settings.half_life_hours,
                );
                (record, score)
            })
            .collect();

        // Deterministic ranking: score, then recency of use, then recency
        // of capture.
        scored.sort_by(|(a, sa), (b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.last_used_at_ms.cmp(&a.last_used_at_ms))
                .then_with(|| b.created_at_ms.cmp(&a.created_at_ms))
        });

        let max = self.settings.max_recommendations;
        let mut changes = Vec::new();
        let mut flips = 0usize;

        // Current members first: the ineligible lose their slot, as does
        // any surplus beyond the bound (lowest-ranked first, since the
        // iteration follows the ranking).
        let mut kept = 0usize;
        let mut flipped: HashSet<RecordId> = HashSet::new();
        for (record, score) in scored.iter().filter(|(r, _)| r.is_recommended()) {
            let eligible =
                is_eligible(record.usage_count, *score, self.settings.min_usage_count);
            if eligible && kept < max {
                kept += 1;
                continue;
            }
            changes.push(RecommendationChange::Evict {
                id: record.id.clone(),
                score: *score,
                at_ms: now_ms,
            });
            flipped.insert(record.id.clone());
            flips += 1;
        }

        // Newcomers fill only the vacated slots; a full set of members
        // admits none, however high a newcomer scores.
        let mut slots = max - kept;
        for (record, score) in scored.iter().filter(|(r, _)| !r.is_recommended()) {
            if slots == 0 {
                break;
            }
            if !is_eligible(record.usage_count, *score, self.settings.min_usage_count) {
                continue;
            }
            changes.push(RecommendationChange::Promote {
                id: record.id.clone(),
                score: *score,
                at_ms: now_ms,
            });
            flipped.insert(record.id.clone());
            slots -= 1;
            flips += 1;
        }

        for (record, score) in &scored {
            if flipped.contains(&record.id) {
                continue;
            }
            if (record.recommendation_score - score).abs() > SCORE_EPSILON {
                changes.push(RecommendationChange::Rescore {
                    id: record.id.clone(),
                    score: *score,
                });
            }
        }

        if changes.is_empty() {
            return Ok(0);
        }

        self.store.apply_recommendation_changes(&changes).await?;
        debug!(
            "recommendation pass: {} membership change(s), {} write(s)",
            flips,
            changes.len()
        );
        self.events.publish(AppEvent::RecommendationsRefreshed);
        Ok(flips)
    }

    pub async fn recommended(&self) -> Result<Vec<ClipboardRecord>> {
        self.store
            .recommended(self.settings.max_recommendations as i64)
            .await
    }

    pub async fn history(&self, limit: i64) -> Result<Vec<ClipboardRecord>> {
        self.store
            .recommendation_history(limit.clamp(1, RECOMMENDATION_HISTORY_LIMIT))
            .await
    }

    /// Manual pin: put a record into the recommended set directly. The
    /// next reconciliation pass may reverse an ineligible pin.
    pub async fn mark_recommended(&self, id: &RecordId) -> Result<()> {
        let record = self
            .store
            .get(id)
            .await?
            .with_context(|| format!("record not found: {id}"))?;
        let now_ms = self.clock.now_ms();
        let score = score_at(
            record.usage_count,
            record.last_used_at_ms,
            now_ms,
            self.settings.half_life_hours,
        );
        self.store
            .apply_recommendation_changes(&[RecommendationChange::Promote {
                id: id.clone(),
                score,
                at_ms: now_ms,
            }])
            .await?;
        self.events.publish(AppEvent::RecommendationsRefreshed);
        Ok(())
    }

    /// Manual unpin: take a record out of the recommended set directly.
    pub async fn evict(&self, id: &RecordId) -> Result<()> {
        let record = self
            .store
            .get(id)
            .await?
            .with_context(|| format!("record not found: {id}"))?;
        let now_ms = self.clock.now_ms();
        let score = score_at(
            record.usage_count,
            record.last_used_at_ms,
            now_ms,
            self.settings.half_life_hours,
        );
        self.store
            .apply_recommendation_changes(&[RecommendationChange::Evict {
                id: id.clone(),
                score,
                at_ms: now_ms,
            }])
            .await?;
        self.events.publish(AppEvent::RecommendationsRefreshed);
        Ok(())
    }

    /// Start the periodic reconciliation loop. Idempotent.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let engine = self.clone();
        let period = Duration::from_secs(self.settings.recalculate_interval_secs.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                if let Err(err) = engine.recalculate().await {
                    warn!("recommendation pass failed: {:?}", err);
                }
            }
        });

        *self.handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the periodic loop. Idempotent.
    pub async fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        }
        Ok(())
    }
}
