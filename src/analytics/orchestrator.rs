/// Insight orchestration
///
/// Coordinates one insight request: checks there is enough data, consults the
/// cache, computes the pattern summary, asks the advisor (falling back to the
/// rule-based generator on any failure), then writes the result through the
/// cache. Every path ends in a response; advisor errors never escape.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::analytics::advisor::Advisor;
use crate::analytics::cache::{CacheKey, InsightCache};
use crate::analytics::fallback::FallbackGenerator;
use crate::analytics::{InsightPayload, InsightResponse, InsightSource};
use crate::domain::{EventScope, InsightMode, PatternSummary, SleepRecord, UserId};

/// Most records the insight path looks at
pub const INSIGHT_RECORD_LIMIT: u32 = 14;

/// Fewer nights than this and no insight is attempted
pub const MIN_NIGHTS_FOR_INSIGHTS: usize = 3;

/// Placeholder tip returned in quick mode when there is too little data
pub const INSUFFICIENT_DATA_TIP: &str = "Log 3+ nights for insights";

/// Explanation returned in detailed mode when there is too little data
pub const INSUFFICIENT_DATA_MESSAGE: &str =
    "You need at least 3 nights of sleep data to generate personalized insights.";

/// Coordinates cache, metrics, advisor and fallback for insight requests
///
/// Shareable across concurrent requests; the only mutable state lives in the
/// injected cache.
#[derive(Clone)]
pub struct InsightOrchestrator {
    advisor: Arc<dyn Advisor>,
    cache: Arc<dyn InsightCache>,
    fallback: FallbackGenerator,
}

impl InsightOrchestrator {
    pub fn new(advisor: Arc<dyn Advisor>, cache: Arc<dyn InsightCache>) -> Self {
        Self {
            advisor,
            cache,
            fallback: FallbackGenerator::new(),
        }
    }

    /// Produce insights for a user from their newest-first records
    pub async fn generate(
        &self,
        user_id: &UserId,
        mode: InsightMode,
        records: &[SleepRecord],
    ) -> InsightResponse {
        // CheckData
        if records.len() < MIN_NIGHTS_FOR_INSIGHTS {
            debug!(user = %user_id, nights = records.len(), "Not enough nights for insights");
            return InsightResponse::insufficient_data(mode);
        }

        // CheckCache
        let key = CacheKey::new(user_id.clone(), mode);
        if let Some(hit) = self.cache.get(&key) {
            if hit.is_fresh {
                debug!(user = %user_id, mode = mode.label(), "Serving insights from cache");
                return InsightResponse::cached(hit.payload);
            }
            debug!(user = %user_id, mode = mode.label(), "Cached insights are stale");
        }

        // Compute
        let window = records.len().min(INSIGHT_RECORD_LIMIT as usize);
        let Some(summary) = PatternSummary::calculate(&records[..window], EventScope::RecentAndOlder) else {
            warn!(user = %user_id, nights = window, "Metrics came back empty after the data check passed");
            return InsightResponse::insufficient_data(mode);
        };

        // Advise
        let (payload, source) = self.advise(user_id, &summary, mode).await;

        // StoreAndReturn
        self.cache.put(key, payload.clone());
        info!(user = %user_id, mode = mode.label(), source = source.label(), "Generated insights");

        InsightResponse::fresh(payload, source, mode, summary)
    }

    /// One advisor attempt at most, rule-based generation otherwise
    async fn advise(
        &self,
        user_id: &UserId,
        summary: &PatternSummary,
        mode: InsightMode,
    ) -> (InsightPayload, InsightSource) {
        if !self.advisor.is_configured() {
            return (self.fallback.generate(summary, mode), InsightSource::Fallback);
        }

        match self.advisor.advise(summary, mode).await {
            Ok(payload) => (payload, InsightSource::Advisor),
            Err(e) => {
                warn!(
                    user = %user_id,
                    advisor = self.advisor.name(),
                    "Advisor failed, falling back to rule-based insights: {}",
                    e
                );
                (self.fallback.generate(summary, mode), InsightSource::Fallback)
            }
        }
    }
}
