/// Tool for correcting a logged night
///
/// This module implements the sleep_update MCP tool to modify fields of an
/// existing record. Omitted fields are left as they are.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, SleepRecord};
use crate::storage::{SleepStorage, StorageError};
use crate::tools::{parse_date, parse_record_id};

/// Parameters for updating an existing record
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct UpdateSleepParams {
    /// ID of the record to change
    pub record_id: String,
    /// New date (YYYY-MM-DD)
    pub date: Option<String>,
    pub hours: Option<f64>,
    pub quality: Option<u8>,
    pub morning_energy: Option<u8>,
    pub afternoon_energy: Option<u8>,
    pub evening_energy: Option<u8>,
    /// Replaces the whole tag list
    pub tags: Option<Vec<String>>,
    /// New notes; an empty string clears them
    pub notes: Option<String>,
}

impl UpdateSleepParams {
    fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.hours.is_none()
            && self.quality.is_none()
            && self.morning_energy.is_none()
            && self.afternoon_energy.is_none()
            && self.evening_energy.is_none()
            && self.tags.is_none()
            && self.notes.is_none()
    }
}

/// Response from updating a record
#[derive(Debug, Serialize)]
pub struct UpdateSleepResponse {
    pub success: bool,
    pub message: String,
    pub record: SleepRecord,
}

/// Apply a partial update to a stored record
pub fn update_sleep<S: SleepStorage>(
    storage: &S,
    params: UpdateSleepParams,
) -> Result<UpdateSleepResponse, StorageError> {
    let record_id = parse_record_id(&params.record_id)?;

    if params.is_empty() {
        return Err(DomainError::Validation {
            message: "No fields to update".to_string(),
        }
        .into());
    }

    let mut record = storage.get_record(&record_id)?;

    if let Some(date) = params.date.as_deref() {
        record.date = parse_date(date)?;
    }
    if let Some(hours) = params.hours {
        record.hours = hours;
    }
    if let Some(quality) = params.quality {
        record.quality = quality;
    }
    if let Some(energy) = params.morning_energy {
        record.morning_energy = energy;
    }
    if let Some(energy) = params.afternoon_energy {
        record.afternoon_energy = energy;
    }
    if let Some(energy) = params.evening_energy {
        record.evening_energy = energy;
    }
    if let Some(tags) = params.tags {
        record.replace_tags(tags);
    }
    if let Some(notes) = params.notes {
        record.notes = if notes.trim().is_empty() { None } else { Some(notes) };
    }

    record.revalidate()?;
    storage.update_record(&record)?;

    Ok(UpdateSleepResponse {
        success: true,
        message: format!("✅ Updated sleep record for {}", record.date),
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use crate::tools::{log_sleep, LogSleepParams};

    fn logged(storage: &SqliteStorage) -> SleepRecord {
        log_sleep(storage, LogSleepParams {
            user_id: "maya".into(),
            hours: 6.0,
            quality: 3,
            notes: Some("late lab".into()),
            ..Default::default()
        })
        .unwrap()
        .record
    }

    #[test]
    fn test_update_patches_only_given_fields() {
        let storage = SqliteStorage::in_memory().unwrap();
        let record = logged(&storage);

        let response = update_sleep(&storage, UpdateSleepParams {
            record_id: record.id.to_string(),
            hours: Some(7.5),
            tags: Some(vec![" Exam week ".into(), "Exam week".into()]),
            notes: Some(String::new()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(response.record.hours, 7.5);
        assert_eq!(response.record.quality, 3);
        assert_eq!(response.record.tags, vec!["Exam week".to_string()]);
        assert!(response.record.notes.is_none());

        let stored = storage.get_record(&record.id).unwrap();
        assert_eq!(stored.hours, 7.5);
    }

    #[test]
    fn test_update_validates_result() {
        let storage = SqliteStorage::in_memory().unwrap();
        let record = logged(&storage);

        let err = update_sleep(&storage, UpdateSleepParams {
            record_id: record.id.to_string(),
            quality: Some(9),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, StorageError::Domain(DomainError::InvalidValue { .. })));

        // Nothing was written
        assert_eq!(storage.get_record(&record.id).unwrap().quality, 3);
    }

    #[test]
    fn test_update_requires_a_field() {
        let storage = SqliteStorage::in_memory().unwrap();
        let record = logged(&storage);

        let err = update_sleep(&storage, UpdateSleepParams {
            record_id: record.id.to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, StorageError::Domain(DomainError::Validation { .. })));
    }

    #[test]
    fn test_update_unknown_record() {
        let storage = SqliteStorage::in_memory().unwrap();

        let err = update_sleep(&storage, UpdateSleepParams {
            record_id: uuid::Uuid::new_v4().to_string(),
            hours: Some(8.0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, StorageError::RecordNotFound { .. }));
    }
}
