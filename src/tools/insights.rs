/// Tool for personalized sleep insights
///
/// This module implements the sleep_insights MCP tool. Records are fetched
/// here; everything after that belongs to the orchestrator, which never fails.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::analytics::orchestrator::INSIGHT_RECORD_LIMIT;
use crate::analytics::{InsightOrchestrator, InsightPayload, InsightResponse};
use crate::domain::InsightMode;
use crate::storage::{SleepStorage, StorageError};
use crate::tools::parse_user_id;

fn default_quick_mode() -> bool {
    true
}

/// Parameters for an insight request
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InsightsParams {
    /// Whose nights to coach on
    pub user_id: String,
    /// Three short tips when true (default), a narrative when false
    #[serde(default = "default_quick_mode")]
    pub quick_mode: bool,
}

/// Generate insights for a user
///
/// Only a storage failure can make this return an error.
pub async fn get_sleep_insights<S: SleepStorage>(
    storage: &S,
    orchestrator: &InsightOrchestrator,
    params: InsightsParams,
) -> Result<InsightResponse, StorageError> {
    let user_id = parse_user_id(&params.user_id)?;
    let mode = InsightMode::from_quick_flag(params.quick_mode);
    let records = storage.recent_records(&user_id, INSIGHT_RECORD_LIMIT)?;

    Ok(orchestrator.generate(&user_id, mode, &records).await)
}

/// Render an insight response for humans
pub fn format_insights(response: &InsightResponse) -> String {
    let body = match &response.insights {
        InsightPayload::QuickTips(tips) => tips
            .iter()
            .map(|tip| format!("- {}", tip.trim_start_matches(['-', '*', '•', ' '])))
            .collect::<Vec<_>>()
            .join("\n"),
        InsightPayload::DetailedNarrative(text) => text.clone(),
    };

    let mut text = format!("🧠 **Sleep Insights**\n\n{}", body);
    if response.requires_more_data {
        text.push_str("\n\n📝 Keep logging: insights unlock after 3 nights.");
    } else if response.from_cache {
        text.push_str("\n\n(cached)");
    }
    text
}
