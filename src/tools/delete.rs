/// Tool for removing a logged night
///
/// This module implements the sleep_delete MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::storage::{SleepStorage, StorageError};
use crate::tools::parse_record_id;

/// Parameters for deleting a record
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteSleepParams {
    /// ID of the record to delete
    pub record_id: String,
}

/// Response from deleting a record
#[derive(Debug, Serialize)]
pub struct DeleteSleepResponse {
    pub success: bool,
    pub message: String,
}

/// Permanently delete a record
pub fn delete_sleep<S: SleepStorage>(
    storage: &S,
    params: DeleteSleepParams,
) -> Result<DeleteSleepResponse, StorageError> {
    let record_id = parse_record_id(&params.record_id)?;
    let record = storage.get_record(&record_id)?;

    storage.delete_record(&record_id)?;

    tracing::info!(user = %record.user_id, date = %record.date, "Deleted sleep record");

    Ok(DeleteSleepResponse {
        success: true,
        message: format!("🗑️ Deleted sleep record for {}", record.date),
    })
}
