/// Tool for the full sleep analysis report
///
/// This module implements the sleep_analysis MCP tool. It never calls the
/// advisor and never touches the insight cache.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::analytics::{AnalysisOutcome, AnalyticsEngine, ANALYSIS_RECORD_LIMIT};
use crate::storage::{SleepStorage, StorageError};
use crate::tools::parse_user_id;

/// Parameters for an analysis request
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnalysisParams {
    /// Whose nights to analyze
    pub user_id: String,
}

/// Analyze a user's 30 most recent nights
pub fn analyze_sleep<S: SleepStorage>(
    storage: &S,
    params: AnalysisParams,
) -> Result<AnalysisOutcome, StorageError> {
    let user_id = parse_user_id(&params.user_id)?;
    let records = storage.recent_records(&user_id, ANALYSIS_RECORD_LIMIT)?;

    tracing::debug!(user = %user_id, nights = records.len(), "Running sleep analysis");

    Ok(AnalyticsEngine::new().analyze(&records))
}

/// Render an analysis outcome for humans
pub fn format_analysis(outcome: &AnalysisOutcome) -> String {
    match outcome {
        AnalysisOutcome::NoData { message } => message.clone(),
        AnalysisOutcome::Report(report) => {
            let p = &report.patterns;
            let mut text = format!(
                "🛌 **Sleep Analysis** ({} nights)\n\n\
                 - Average sleep: {:.1}h\n\
                 - Average quality: {:.1}/5\n\
                 - Sleep debt: {:.1}h\n\
                 - Efficiency: {:.0}%\n\
                 - Consistency: {:.0}%\n\
                 - Chronotype: {}",
                p.nights_analyzed, p.avg_sleep, p.avg_quality, p.sleep_debt,
                report.efficiency, p.consistency, p.chronotype
            );

            if !report.recommendations.is_empty() {
                text.push_str("\n\n💡 **Recommendations**");
                for recommendation in &report.recommendations {
                    text.push_str(&format!("\n- {}", recommendation));
                }
            }

            text
        }
    }
}
