/// Tool for listing a user's recent nights
///
/// This module implements the sleep_list MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::SleepRecord;
use crate::storage::{SleepStorage, StorageError};
use crate::tools::parse_user_id;

/// Most records a single listing returns
pub const MAX_LIST_LIMIT: u32 = 30;

/// Parameters for listing records
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListSleepParams {
    /// Whose records to list
    pub user_id: String,
    /// How many nights to return (1-30, defaults to 30)
    pub limit: Option<u32>,
}

/// Summary statistics for a listing
#[derive(Debug, Serialize)]
pub struct ListSummary {
    pub nights: usize,
    pub avg_hours: f64,
    pub avg_quality: f64,
}

/// Response from listing records
#[derive(Debug, Serialize)]
pub struct ListSleepResponse {
    pub records: Vec<SleepRecord>,
    pub summary: ListSummary,
}

/// Fetch a user's most recent nights, newest first
pub fn list_sleep<S: SleepStorage>(
    storage: &S,
    params: ListSleepParams,
) -> Result<ListSleepResponse, StorageError> {
    let user_id = parse_user_id(&params.user_id)?;
    let limit = params.limit.unwrap_or(MAX_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

    let records = storage.recent_records(&user_id, limit)?;

    let nights = records.len();
    let (avg_hours, avg_quality) = if nights == 0 {
        (0.0, 0.0)
    } else {
        (
            records.iter().map(|r| r.hours).sum::<f64>() / nights as f64,
            records.iter().map(|r| f64::from(r.quality)).sum::<f64>() / nights as f64,
        )
    };

    Ok(ListSleepResponse {
        records,
        summary: ListSummary { nights, avg_hours, avg_quality },
    })
}
