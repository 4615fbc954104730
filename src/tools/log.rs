/// Tool for logging a night of sleep
///
/// This module implements the sleep_log MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{NewSleepRecord, SleepRecord};
use crate::storage::{SleepStorage, StorageError};
use crate::tools::{parse_date, parse_user_id};

/// Parameters for logging a night
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct LogSleepParams {
    /// Who slept
    pub user_id: String,
    /// Night being logged (YYYY-MM-DD, defaults to today)
    pub date: Option<String>,
    /// Hours slept (0-24)
    pub hours: f64,
    /// Sleep quality rating (1-5)
    pub quality: u8,
    /// Morning energy (1-5, defaults to 3)
    pub morning_energy: Option<u8>,
    /// Afternoon energy (1-5, defaults to 3)
    pub afternoon_energy: Option<u8>,
    /// Evening energy (1-5, defaults to 3)
    pub evening_energy: Option<u8>,
    /// Context tags such as "All-nighter" or "Exam week"
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form notes about the night
    pub notes: Option<String>,
}

/// Response from logging a night
#[derive(Debug, Serialize)]
pub struct LogSleepResponse {
    pub success: bool,
    pub message: String,
    pub record: SleepRecord,
}

/// Validate and store a new sleep record
pub fn log_sleep<S: SleepStorage>(
    storage: &S,
    params: LogSleepParams,
) -> Result<LogSleepResponse, StorageError> {
    let user_id = parse_user_id(&params.user_id)?;
    let date = params.date.as_deref().map(parse_date).transpose()?;

    let record = SleepRecord::new(user_id, NewSleepRecord {
        date,
        hours: params.hours,
        quality: params.quality,
        morning_energy: params.morning_energy,
        afternoon_energy: params.afternoon_energy,
        evening_energy: params.evening_energy,
        tags: params.tags,
        notes: params.notes,
    })?;

    storage.create_record(&record)?;

    tracing::info!(user = %record.user_id, date = %record.date, "Logged sleep record");

    Ok(LogSleepResponse {
        success: true,
        message: format!(
            "😴 Logged {:.1}h of sleep for {} (quality {}/5)",
            record.hours, record.date, record.quality
        ),
        record,
    })
}
